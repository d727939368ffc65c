//! Reader and writer for sequence index files.
//!
//! Format: the first line is the sample display name, every following line is
//! `name\tlength[\treversed]` where `reversed` is `0` or `1` (default `0`).
//! A blank line ends the record list.

use std::io::{BufRead, Write};
use std::path::Path;

use tracing::debug;

use crate::core::contig::Contig;
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::core::types::Side;
use crate::utils::fs::{open_reader, write_atomic};
use crate::utils::validation::check_contig_limit;

/// Read an index file for one side of the comparison
///
/// # Errors
///
/// Returns `Error::IndexUnavailable` if the file cannot be opened or read,
/// and `Error::MalformedIndex` if its content is invalid.
pub fn read_index_file(path: &Path, side: Side) -> Result<SequenceIndex> {
    let unavailable = |source| Error::IndexUnavailable {
        side,
        path: path.to_path_buf(),
        source,
    };
    let reader = open_reader(path).map_err(unavailable)?;
    let index = parse_index(reader, path).map_err(|e| match e {
        Error::Io(source) => unavailable(source),
        other => other,
    })?;
    debug!(
        "Loaded {} index {}: {} contigs, {} bp",
        side,
        path.display(),
        index.len(),
        index.total_length()
    );
    Ok(index)
}

/// Parse index content; `path` is only used in error messages
///
/// # Errors
///
/// Returns `Error::MalformedIndex` on a missing header, a bad length or flag,
/// or a duplicated contig name.
pub fn parse_index<R: BufRead>(reader: R, path: &Path) -> Result<SequenceIndex> {
    let malformed = |line: usize, reason: String| Error::MalformedIndex {
        path: path.to_path_buf(),
        line,
        reason,
    };

    let mut lines = reader.lines();
    let sample_name = match lines.next() {
        Some(line) => line?.trim_end().to_string(),
        None => return Err(malformed(1, "missing sample name".to_string())),
    };

    let mut contigs = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        // Line numbers in errors are 1-based and count the header
        let line_num = i + 2;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            break;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 2 {
            return Err(malformed(line_num, "expected name<TAB>length".to_string()));
        }

        let name = fields[0].trim();
        if name.is_empty() {
            return Err(malformed(line_num, "empty contig name".to_string()));
        }
        let length: u64 = fields[1]
            .trim()
            .parse()
            .map_err(|_| malformed(line_num, format!("invalid length '{}'", fields[1])))?;
        if length == 0 {
            return Err(malformed(line_num, format!("contig '{name}' has length 0")));
        }
        let reversed = match fields.get(2).map(|f| f.trim()) {
            None | Some("" | "0") => false,
            Some("1") => true,
            Some(other) => {
                return Err(malformed(
                    line_num,
                    format!("invalid reversed flag '{other}' (expected 0 or 1)"),
                ))
            }
        };

        if let Some(msg) = check_contig_limit(contigs.len()) {
            return Err(malformed(line_num, msg));
        }
        contigs.push(Contig::new(name, length).with_reversed(reversed));
    }

    SequenceIndex::try_new(sample_name, contigs)
        .map_err(|name| malformed(0, format!("duplicate contig name '{name}'")))
}

/// Serialize an index to its text form
///
/// # Errors
///
/// Returns any IO error raised by `writer`.
pub fn write_index<W: Write + ?Sized>(index: &SequenceIndex, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "{}", index.sample_name)?;
    for contig in index.contigs() {
        writeln!(
            writer,
            "{}\t{}\t{}",
            contig.name,
            contig.length,
            u8::from(contig.reversed)
        )?;
    }
    Ok(())
}

/// Atomically replace the index file at `path`
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be written.
pub fn write_index_file(index: &SequenceIndex, path: &Path) -> Result<()> {
    write_atomic(path, |w| Ok::<_, Error>(write_index(index, w)?))
}
