//! Reader for PAF-like alignment files.
//!
//! Twelve mandatory tab-separated columns:
//!
//! | # | Column | Type |
//! |---|--------|------|
//! | 1 | query name | string |
//! | 2-4 | query length, start, end | integer |
//! | 5 | strand | `+` or `-` |
//! | 6 | target name | string |
//! | 7-9 | target length, start, end | integer |
//! | 10 | matching bases | integer |
//! | 11 | block length | integer, at least 1 |
//! | 12 | mapping quality | integer 0-255 |
//!
//! Further columns are carried verbatim. A single malformed line rejects the
//! whole file: partial alignment data would silently understate coverage.

use std::io::BufRead;
use std::path::Path;

use crate::core::alignment::AlignmentRecord;
use crate::core::error::{Error, Result};
use crate::core::types::Strand;
use crate::utils::fs::open_reader;

/// Number of mandatory columns
pub const PAF_COLUMNS: usize = 12;

/// Parse one alignment line. `line_num` is 1-based and used in errors.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` if the line has fewer than twelve fields,
/// a non-numeric numeric column, an invalid strand or mapping quality, a
/// zero block length, or a start past its end or an end past its length on
/// either side.
pub fn parse_record(line: &str, line_num: usize) -> Result<AlignmentRecord> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < PAF_COLUMNS {
        return Err(Error::malformed(
            line_num,
            format!("expected at least {PAF_COLUMNS} fields, found {}", fields.len()),
        ));
    }

    let number = |column: usize| -> Result<u64> {
        fields[column].parse().map_err(|_| {
            Error::malformed(
                line_num,
                format!("column {} is not a number: '{}'", column + 1, fields[column]),
            )
        })
    };

    let strand = Strand::parse(fields[4]).ok_or_else(|| {
        Error::malformed(line_num, format!("strand must be + or -, found '{}'", fields[4]))
    })?;

    let mapq = number(11)?;
    let mapping_quality = u8::try_from(mapq).map_err(|_| {
        Error::malformed(line_num, format!("mapping quality {mapq} outside 0-255"))
    })?;

    let block_length = number(10)?;
    if block_length == 0 {
        return Err(Error::malformed(line_num, "block length must be at least 1"));
    }

    if fields[0].is_empty() || fields[5].is_empty() {
        return Err(Error::malformed(line_num, "empty sequence name"));
    }

    let span = |side: &str, len: usize| -> Result<(u64, u64, u64)> {
        let (length, start, end) = (number(len)?, number(len + 1)?, number(len + 2)?);
        if start > end {
            return Err(Error::malformed(
                line_num,
                format!("{side} start {start} is past its end {end}"),
            ));
        }
        if end > length {
            return Err(Error::malformed(
                line_num,
                format!("{side} end {end} is past its length {length}"),
            ));
        }
        Ok((length, start, end))
    };
    let (query_len, query_start, query_end) = span("query", 1)?;
    let (target_len, target_start, target_end) = span("target", 6)?;

    Ok(AlignmentRecord {
        query_id: fields[0].to_string(),
        query_len,
        query_start,
        query_end,
        strand,
        target_id: fields[5].to_string(),
        target_len,
        target_start,
        target_end,
        match_length: number(9)?,
        block_length,
        mapping_quality,
        extra: fields[PAF_COLUMNS..].iter().map(|s| (*s).to_string()).collect(),
    })
}

/// Streaming reader yielding validated records with their line numbers.
///
/// Blank lines and `#` comment lines are skipped.
pub struct AlignmentReader {
    lines: std::io::Lines<Box<dyn BufRead>>,
    line_num: usize,
}

impl AlignmentReader {
    /// Open an alignment file (plain or gzip)
    ///
    /// # Errors
    ///
    /// Returns `Error::AlignmentUnavailable` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let reader = open_reader(path).map_err(|source| Error::AlignmentUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(reader))
    }

    pub fn new(reader: Box<dyn BufRead>) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    /// Line number of the most recently returned record
    pub fn line_num(&self) -> usize {
        self.line_num
    }
}

impl Iterator for AlignmentReader {
    type Item = Result<AlignmentRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            self.line_num += 1;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            return Some(parse_record(&line, self.line_num));
        }
    }
}

/// Read and validate every record of an alignment file
///
/// # Errors
///
/// Returns `Error::AlignmentUnavailable` if the file cannot be opened and
/// `Error::MalformedRecord` on the first invalid line.
pub fn read_alignment_file(path: &Path) -> Result<Vec<AlignmentRecord>> {
    AlignmentReader::open(path)?.collect()
}
