//! Split Merger: rewrites alignments made against split pieces back into the
//! coordinate space of the original, unsplit contigs.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::core::alignment::AlignmentRecord;
use crate::core::contig::SplitContigId;
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::core::types::Side;
use crate::parsing::paf::AlignmentReader;
use crate::utils::fs::write_atomic;

/// Where a piece sits inside its original contig
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiecePlacement {
    pub original: String,
    pub offset: u64,
    pub original_len: u64,
}

/// Prefix offsets of every split piece: `off(p1) = 0`, `off(p[i+1]) = off(p[i]) + len(p[i])`
#[derive(Debug, Clone, Default)]
pub struct MergeOffsets {
    placements: HashMap<String, PiecePlacement>,
}

impl MergeOffsets {
    pub fn from_index(index: &SequenceIndex) -> Self {
        let mut by_original: HashMap<&str, Vec<(u32, &str, u64)>> = HashMap::new();
        for contig in index.contigs() {
            if let Some(id) = SplitContigId::parse(&contig.name) {
                by_original
                    .entry(SplitContigId::original_name(&contig.name))
                    .or_default()
                    .push((id.piece, contig.name.as_str(), contig.length));
            }
        }

        let mut placements = HashMap::new();
        for (original, mut pieces) in by_original {
            pieces.sort_by_key(|(piece, _, _)| *piece);
            let original_len: u64 = pieces.iter().map(|(_, _, len)| len).sum();
            let mut offset = 0;
            for (_, name, len) in pieces {
                placements.insert(
                    name.to_string(),
                    PiecePlacement {
                        original: original.to_string(),
                        offset,
                        original_len,
                    },
                );
                offset += len;
            }
        }
        Self { placements }
    }

    pub fn placement(&self, name: &str) -> Option<&PiecePlacement> {
        self.placements.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Rewrite the query side of a record; returns false if it was not a piece
    pub fn merge_record(&self, record: &mut AlignmentRecord) -> bool {
        let Some(placement) = self.placements.get(&record.query_id) else {
            return false;
        };
        record.query_id.clone_from(&placement.original);
        record.query_len = placement.original_len;
        record.query_start += placement.offset;
        record.query_end += placement.offset;
        true
    }
}

/// Counts reported by [`merge_splits`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub records: usize,
    pub rewritten: usize,
    pub contigs: usize,
}

/// Rewrite an alignment file and its split index into unsplit coordinates.
///
/// # Errors
///
/// Returns `Error::IndexUnavailable`/`Error::AlignmentUnavailable` if an
/// input is missing and `Error::MalformedRecord` on an invalid line; in that
/// case no output is written.
pub fn merge_splits(
    alignment_in: &Path,
    split_index: &Path,
    alignment_out: &Path,
    index_out: &Path,
) -> Result<MergeSummary> {
    let index = SequenceIndex::load(split_index, Side::Query)?;
    let offsets = MergeOffsets::from_index(&index);
    let mut summary = MergeSummary::default();

    let reader = AlignmentReader::open(alignment_in)?;
    write_atomic(alignment_out, |w: &mut dyn Write| {
        for record in reader {
            let mut record = record?;
            if offsets.merge_record(&mut record) {
                summary.rewritten += 1;
            }
            summary.records += 1;
            writeln!(w, "{}", record.to_line())?;
        }
        Ok::<_, Error>(())
    })?;

    let merged = index.merge_splits();
    summary.contigs = merged.len();
    merged.save(index_out)?;

    info!(
        "Merged {} of {} records back onto {} contigs",
        summary.rewritten, summary.records, summary.contigs
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;
    use crate::parsing::paf::{parse_record, read_alignment_file};

    fn split_index() -> SequenceIndex {
        SequenceIndex::new(
            "q",
            vec![
                Contig::new("B_###_1", 1500),
                Contig::new("A", 1000),
                Contig::new("B_###_2", 500),
            ],
        )
    }

    #[test]
    fn test_offsets() {
        let offsets = MergeOffsets::from_index(&split_index());
        assert_eq!(
            offsets.placement("B_###_2"),
            Some(&PiecePlacement {
                original: "B".to_string(),
                offset: 1500,
                original_len: 2000,
            })
        );
        assert_eq!(offsets.placement("B_###_1").unwrap().offset, 0);
        assert!(offsets.placement("A").is_none());
    }

    #[test]
    fn test_merge_record() {
        let offsets = MergeOffsets::from_index(&split_index());
        let mut record =
            parse_record("B_###_2\t500\t10\t490\t-\tT\t900\t0\t480\t400\t480\t60", 1).unwrap();
        assert!(offsets.merge_record(&mut record));
        assert_eq!(record.query_id, "B");
        assert_eq!(record.query_len, 2000);
        assert_eq!((record.query_start, record.query_end), (1510, 1990));
        // Target side untouched
        assert_eq!((record.target_start, record.target_end), (0, 480));

        let mut plain = parse_record("A\t1000\t0\t10\t+\tT\t900\t0\t10\t10\t10\t60", 1).unwrap();
        let before = plain.clone();
        assert!(!offsets.merge_record(&mut plain));
        assert_eq!(plain, before);
    }

    #[test]
    fn test_merge_splits_files() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("split.idx");
        split_index().save(&idx).unwrap();
        let paf = dir.path().join("split.paf");
        std::fs::write(
            &paf,
            "B_###_1\t1500\t0\t1500\t+\tT\t9000\t0\t1500\t1500\t1500\t60\n\
             B_###_2\t500\t0\t500\t+\tT\t9000\t1500\t2000\t500\t500\t60\tcg:Z:500M\n",
        )
        .unwrap();

        let out_paf = dir.path().join("map.paf");
        let out_idx = dir.path().join("query.idx");
        let summary = merge_splits(&paf, &idx, &out_paf, &out_idx).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.rewritten, 2);
        assert_eq!(summary.contigs, 2);

        let records = read_alignment_file(&out_paf).unwrap();
        assert_eq!(records[1].query_id, "B");
        assert_eq!((records[1].query_start, records[1].query_end), (1500, 2000));
        assert_eq!(records[1].extra, vec!["cg:Z:500M"]);

        let merged = SequenceIndex::load(&out_idx, Side::Query).unwrap();
        let names: Vec<&str> = merged.contigs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(merged.length("B"), Some(2000));
    }

    #[test]
    fn test_malformed_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("split.idx");
        split_index().save(&idx).unwrap();
        let paf = dir.path().join("split.paf");
        std::fs::write(&paf, "B_###_1\t1500\t0\n").unwrap();

        let out_paf = dir.path().join("map.paf");
        let err = merge_splits(&paf, &idx, &out_paf, &dir.path().join("q.idx")).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
        assert!(!out_paf.exists());
    }
}
