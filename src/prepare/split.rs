//! Contig Splitter: divides oversized contigs into bounded pieces.
//!
//! A contig of length `L` is kept whole when `L < S + t`. Otherwise it is cut
//! in `S`-sized strides, and the last piece absorbs any remainder that would
//! be shorter than `S + t`, so no piece is shorter than needed.

use std::io::Write;
use std::path::Path;

use noodles::fasta;
use tracing::info;

use crate::core::config::SplitConfig;
use crate::core::contig::{Contig, SplitContigId};
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::parsing::fasta::{for_each_record, make_record};
use crate::utils::fs::write_atomic;

/// One piece of a contig, in contig-local coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPiece {
    /// Split id, or the original name when the contig is kept whole
    pub name: String,
    pub start: u64,
    pub length: u64,
}

impl SplitPiece {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// Counts reported by [`split_fasta`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    pub contigs: usize,
    pub split_contigs: usize,
    pub pieces: usize,
}

/// Plan the pieces of one contig
pub fn plan_split(name: &str, length: u64, config: &SplitConfig) -> Vec<SplitPiece> {
    let size = config.split_size.max(1);
    let limit = size.saturating_add(config.tolerance_bases());

    if length < limit {
        return vec![SplitPiece {
            name: name.to_string(),
            start: 0,
            length,
        }];
    }

    let mut pieces = Vec::new();
    let mut start = 0u64;
    let mut number = 1u32;
    loop {
        let remaining = length - start;
        let piece_len = if remaining < limit { remaining } else { size };
        pieces.push(SplitPiece {
            name: SplitContigId::new(name, number).to_string(),
            start,
            length: piece_len,
        });
        start += piece_len;
        number += 1;
        if start >= length {
            break;
        }
    }
    pieces
}

/// Split every contig of an index, keeping creation order
pub fn split_index(index: &SequenceIndex, config: &SplitConfig) -> SequenceIndex {
    let contigs = index
        .contigs()
        .iter()
        .flat_map(|c| plan_split(&c.name, c.length, config))
        .map(|piece| Contig::new(piece.name, piece.length))
        .collect();
    SequenceIndex::new(index.sample_name.clone(), contigs)
}

/// Split a FASTA file, writing the pieces and the index of the split output.
///
/// # Errors
///
/// Returns `Error::EmptyContig` for a record without bases, plus any FASTA
/// read or write error.
pub fn split_fasta(
    input: &Path,
    output_fasta: &Path,
    output_index: &Path,
    sample_name: &str,
    config: &SplitConfig,
) -> Result<SplitSummary> {
    let mut summary = SplitSummary::default();
    let mut contigs = Vec::new();

    write_atomic(output_fasta, |w: &mut dyn Write| {
        let mut writer = fasta::io::Writer::new(w);
        for_each_record(input, |name, sequence| {
            if sequence.is_empty() {
                return Err(Error::EmptyContig(name.to_string()));
            }
            let pieces = plan_split(name, sequence.len() as u64, config);
            summary.contigs += 1;
            if pieces.len() > 1 {
                summary.split_contigs += 1;
            }
            for piece in pieces {
                #[allow(clippy::cast_possible_truncation)]
                let bases = &sequence[piece.start as usize..piece.end() as usize];
                writer.write_record(&make_record(&piece.name, bases))?;
                contigs.push(Contig::new(piece.name, piece.length));
                summary.pieces += 1;
            }
            Ok(())
        })?;
        Ok::<_, Error>(())
    })?;

    let index = SequenceIndex::try_new(sample_name, contigs)
        .map_err(|name| Error::Fasta(format!("Duplicate sequence name '{name}'")))?;
    index.save(output_index)?;

    info!(
        "Split {} contigs into {} pieces ({} contigs split)",
        summary.contigs, summary.pieces, summary.split_contigs
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: u64) -> SplitConfig {
        SplitConfig {
            split_size: size,
            tolerance: 0.1,
        }
    }

    fn lengths(pieces: &[SplitPiece]) -> Vec<u64> {
        pieces.iter().map(|p| p.length).collect()
    }

    #[test]
    fn test_small_contig_kept_whole() {
        let pieces = plan_split("A", 1000, &config(1500));
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].name, "A");
        assert_eq!(pieces[0].length, 1000);
    }

    #[test]
    fn test_just_below_threshold_kept_whole() {
        // S + t = 1650
        let pieces = plan_split("A", 1649, &config(1500));
        assert_eq!(lengths(&pieces), vec![1649]);
        assert_eq!(pieces[0].name, "A");
    }

    #[test]
    fn test_at_threshold_is_split() {
        let pieces = plan_split("A", 1650, &config(1500));
        assert_eq!(lengths(&pieces), vec![1500, 150]);
        assert_eq!(pieces[0].name, "A_###_1");
        assert_eq!(pieces[1].name, "A_###_2");
    }

    #[test]
    fn test_two_thousand_over_fifteen_hundred() {
        let pieces = plan_split("B", 2000, &config(1500));
        assert_eq!(lengths(&pieces), vec![1500, 500]);
        assert_eq!(pieces[1].start, 1500);
    }

    #[test]
    fn test_short_tail_is_absorbed() {
        // 3100: 1500, then 1600 remains which is < 1650 so it becomes the last piece
        let pieces = plan_split("C", 3100, &config(1500));
        assert_eq!(lengths(&pieces), vec![1500, 1600]);
    }

    #[test]
    fn test_pieces_are_contiguous() {
        let pieces = plan_split("D", 10_007, &config(1000));
        let mut expected_start = 0;
        for (i, piece) in pieces.iter().enumerate() {
            assert_eq!(piece.start, expected_start);
            assert_eq!(
                SplitContigId::parse(&piece.name).unwrap().piece as usize,
                i + 1
            );
            expected_start = piece.end();
        }
        assert_eq!(expected_start, 10_007);
    }

    #[test]
    fn test_split_index_scenario() {
        let index = SequenceIndex::new(
            "s",
            vec![Contig::new("A", 1000), Contig::new("B", 2000)],
        );
        let split = split_index(&index, &config(1500));
        let names: Vec<&str> = split.contigs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B_###_1", "B_###_2"]);
        assert_eq!(split.merge_splits(), index);
    }

    #[test]
    fn test_split_fasta_writes_pieces_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.fa");
        let seq_b: String = "ACGT".repeat(500);
        std::fs::write(&input, format!(">A\n{}\n>B\n{}\n", "C".repeat(1000), seq_b)).unwrap();

        let out_fa = dir.path().join("split.fa");
        let out_idx = dir.path().join("split.idx");
        let summary = split_fasta(&input, &out_fa, &out_idx, "sample", &config(1500)).unwrap();
        assert_eq!(
            summary,
            SplitSummary {
                contigs: 2,
                split_contigs: 1,
                pieces: 3
            }
        );

        let index = SequenceIndex::load(&out_idx, crate::core::types::Side::Query).unwrap();
        assert_eq!(index.length("B_###_1"), Some(1500));
        assert_eq!(index.length("B_###_2"), Some(500));

        // Concatenating the pieces restores the original sequence
        let mut rebuilt = Vec::new();
        for_each_record(&out_fa, |name, seq| {
            if name.starts_with("B_###_") {
                rebuilt.extend_from_slice(seq);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(rebuilt, seq_b.as_bytes());
    }
}
