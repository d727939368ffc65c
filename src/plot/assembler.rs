//! Assembler: places alignment records on the global dotplot axes.
//!
//! The target genome runs along x and the query along y. Each record's
//! contig-local coordinates are shifted by the absolute start of its contig
//! in the respective index, and its identity is bucketed into a class.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::core::alignment::{AlignmentRecord, ClassifiedRecord};
use crate::core::config::PlotConfig;
use crate::core::error::{Error, Result};
use crate::core::index::{Offsets, SequenceIndex};
use crate::core::types::{IdentityClass, Side, Strand};
use crate::parsing::paf::AlignmentReader;

/// Everything known about one parsed alignment
#[derive(Debug, Clone)]
pub struct ParsedAlignment {
    pub query: SequenceIndex,
    pub target: SequenceIndex,
    pub query_offsets: Offsets,
    pub target_offsets: Offsets,
    /// Kept records grouped by identity class, in file order within a class
    pub lines: BTreeMap<IdentityClass, Vec<ClassifiedRecord>>,
    /// Over every valid record, including those past the cap
    pub min_identity: Option<f64>,
    pub max_identity: Option<f64>,
    /// True when records were left out because of the cap
    pub sampled: bool,
    /// Number of valid records in the file
    pub record_count: usize,
}

impl ParsedAlignment {
    /// Length of the target (x) axis
    pub fn x_len(&self) -> u64 {
        self.target_offsets.total_length()
    }

    /// Length of the query (y) axis
    pub fn y_len(&self) -> u64 {
        self.query_offsets.total_length()
    }

    /// All kept records, class by class
    pub fn records(&self) -> impl Iterator<Item = &ClassifiedRecord> {
        self.lines.values().flatten()
    }

    pub fn kept(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }

    /// Kept records of every query contig
    pub fn records_by_query(&self) -> HashMap<&str, Vec<&ClassifiedRecord>> {
        let mut grouped: HashMap<&str, Vec<&ClassifiedRecord>> = HashMap::new();
        for record in self.records() {
            grouped.entry(record.query.as_str()).or_default().push(record);
        }
        grouped
    }
}

/// Builds [`ParsedAlignment`]s under a fixed [`PlotConfig`]
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: PlotConfig,
}

impl Assembler {
    pub fn new(config: PlotConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Parse an alignment for rendering, keeping at most `max_records`.
    ///
    /// The whole file is still validated: one malformed line rejects it.
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexUnavailable`, `Error::AlignmentUnavailable` or
    /// `Error::MalformedRecord`. A record naming a contig absent from its
    /// index is malformed.
    pub fn parse(
        &self,
        alignment: &Path,
        query_index: &Path,
        target_index: &Path,
    ) -> Result<ParsedAlignment> {
        self.parse_with_limit(alignment, query_index, target_index, Some(self.config.max_records))
    }

    /// Parse every record, ignoring the rendering cap
    ///
    /// # Errors
    ///
    /// Same as [`Assembler::parse`].
    pub fn parse_all(
        &self,
        alignment: &Path,
        query_index: &Path,
        target_index: &Path,
    ) -> Result<ParsedAlignment> {
        self.parse_with_limit(alignment, query_index, target_index, None)
    }

    fn parse_with_limit(
        &self,
        alignment: &Path,
        query_index: &Path,
        target_index: &Path,
        limit: Option<usize>,
    ) -> Result<ParsedAlignment> {
        let query = SequenceIndex::load(query_index, Side::Query)?;
        let target = SequenceIndex::load(target_index, Side::Target)?;
        let query_offsets = query.offsets();
        let target_offsets = target.offsets();

        let mut lines: BTreeMap<IdentityClass, Vec<ClassifiedRecord>> = BTreeMap::new();
        let mut min_identity: Option<f64> = None;
        let mut max_identity: Option<f64> = None;
        let mut record_count = 0usize;
        let mut kept = 0usize;

        let mut reader = AlignmentReader::open(alignment)?;
        while let Some(record) = reader.next() {
            let record = record?;
            let placed = self.place(&record, reader.line_num(), &query_offsets, &target_offsets)?;
            record_count += 1;
            min_identity = Some(min_identity.map_or(placed.identity, |m| m.min(placed.identity)));
            max_identity = Some(max_identity.map_or(placed.identity, |m| m.max(placed.identity)));

            if limit.map_or(true, |max| kept < max) {
                lines.entry(placed.class).or_default().push(placed);
                kept += 1;
            }
        }

        let sampled = kept < record_count;
        if sampled {
            warn!(
                "Alignment has {} records, only the first {} are kept",
                record_count, kept
            );
        }
        info!(
            "Parsed {} records against {} query and {} target contigs",
            record_count,
            query.len(),
            target.len()
        );
        debug!("Identity range {:?}..{:?}", min_identity, max_identity);

        Ok(ParsedAlignment {
            query,
            target,
            query_offsets,
            target_offsets,
            lines,
            min_identity,
            max_identity,
            sampled,
            record_count,
        })
    }

    /// Map one record onto the global axes.
    ///
    /// Query coordinates are used as stored: a reversed query contig has
    /// already been mirrored when it was reoriented. The strand only decides
    /// which end of the target interval becomes `x1`.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedRecord` if either contig is not indexed or
    /// its length disagrees with the index.
    pub fn place(
        &self,
        record: &AlignmentRecord,
        line: usize,
        query: &Offsets,
        target: &Offsets,
    ) -> Result<ClassifiedRecord> {
        let q_abs = indexed_start(query, line, "query", &record.query_id, record.query_len)?;
        let t_abs = indexed_start(target, line, "target", &record.target_id, record.target_len)?;

        let (x1, x2) = match record.strand {
            Strand::Forward => (t_abs + record.target_start, t_abs + record.target_end),
            Strand::Reverse => (t_abs + record.target_end, t_abs + record.target_start),
        };
        let identity = record.identity();
        Ok(ClassifiedRecord {
            x1,
            x2,
            y1: q_abs + record.query_start,
            y2: q_abs + record.query_end,
            identity,
            class: IdentityClass::classify(identity, &self.config.identity_thresholds),
            query: record.query_id.clone(),
            target: record.target_id.clone(),
        })
    }
}

/// Absolute start of a contig whose record length matches the index
fn indexed_start(
    offsets: &Offsets,
    line: usize,
    side: &str,
    name: &str,
    length: u64,
) -> Result<u64> {
    let (start, indexed) = offsets.span(name).ok_or_else(|| {
        Error::malformed(line, format!("{side} contig '{name}' is not in the {side} index"))
    })?;
    if indexed != length {
        return Err(Error::malformed(
            line,
            format!("{side} contig '{name}' has length {length}, the index says {indexed}"),
        ));
    }
    Ok(start)
}
