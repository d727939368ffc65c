//! Contig Filter: drops too-small contigs using an N95-style threshold.
//!
//! Contigs are ranked by length. The "N95 contig" is the last one of the
//! shortest length-descending prefix covering 95% of the total length;
//! anything after it and shorter than 5% of its length starts the cut, and
//! every contig from there on is removed. Filtering is abandoned when it
//! would remove `min_filtered` contigs or fewer.
//!
//! An index whose removed list already exists has been filtered and is left
//! alone: the thresholds are only ever taken from the unfiltered assembly.

use std::collections::HashSet;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::core::config::FilterConfig;
use crate::core::contig::SplitContigId;
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::core::types::Side;
use crate::utils::fs::{open_reader, write_atomic};
use crate::utils::validation::to_f64;

/// Pure filtering decision for one index
#[derive(Debug, Clone, PartialEq)]
pub struct FilterPlan {
    /// Name and length of the N95 contig
    pub n_contig: Option<(String, u64)>,
    /// Contigs strictly shorter than this may be cut
    pub min_length: f64,
    /// Filter-out candidates, longest first
    pub candidates: Vec<String>,
    /// True when too few candidates were found for filtering to apply
    pub abstained: bool,
    /// The assembly is too fragmented to trust its native contig order
    pub fragmented: bool,
}

impl FilterPlan {
    /// Contigs that will actually be removed
    pub fn removed(&self) -> &[String] {
        if self.abstained {
            &[]
        } else {
            &self.candidates
        }
    }
}

/// Outcome of [`apply_filter`]
#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome {
    pub removed: Vec<String>,
    pub abstained: bool,
    /// Only ever set for the query side
    pub forced_reorder: bool,
    /// The removed list existed: `removed` is read back from it
    pub already_filtered: bool,
}

/// Compute the filter plan of an (unsplit) index
pub fn plan_filter(index: &SequenceIndex, config: &FilterConfig) -> FilterPlan {
    let mut ranked: Vec<(&str, u64)> = index
        .contigs()
        .iter()
        .map(|c| (c.name.as_str(), c.length))
        .collect();
    // Stable: equal lengths keep their index order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let total = to_f64(index.total_length());
    let fragmented = is_fragmented(&ranked, total, config);

    let coverage_target = config.coverage_fraction * total;
    let mut cumulative = 0u64;
    let n_pos = ranked.iter().position(|&(_, len)| {
        cumulative += len;
        to_f64(cumulative) >= coverage_target
    });

    let Some(n_pos) = n_pos else {
        return FilterPlan {
            n_contig: None,
            min_length: 0.0,
            candidates: Vec::new(),
            abstained: true,
            fragmented,
        };
    };

    let (n_name, n_len) = ranked[n_pos];
    let min_length = config.min_length_fraction * to_f64(n_len);
    let candidates: Vec<String> = ranked[n_pos + 1..]
        .iter()
        .position(|&(_, len)| to_f64(len) < min_length)
        .map(|cut| {
            ranked[n_pos + 1 + cut..]
                .iter()
                .map(|(name, _)| (*name).to_string())
                .collect()
        })
        .unwrap_or_default();

    let abstained = candidates.len() <= config.min_filtered;
    debug!(
        "N{:.0} contig {} ({} bp), min length {:.1}, {} candidates{}",
        config.coverage_fraction * 100.0,
        n_name,
        n_len,
        min_length,
        candidates.len(),
        if abstained { ", abstaining" } else { "" }
    );

    FilterPlan {
        n_contig: Some((n_name.to_string(), n_len)),
        min_length,
        candidates,
        abstained,
        fragmented,
    }
}

/// Too much of the assembly sits in contigs below 1% of its total length
fn is_fragmented(ranked: &[(&str, u64)], total: f64, config: &FilterConfig) -> bool {
    let small_limit = config.small_contig_fraction * total;
    let small: u64 = ranked
        .iter()
        .filter(|&&(_, len)| to_f64(len) < small_limit)
        .map(|&(_, len)| len)
        .sum();
    to_f64(small) > config.fragmented_fraction * config.coverage_fraction * total
}

/// Filter an index file in place.
///
/// In split mode the decision is taken on the merged contigs and every piece
/// of a removed original is dropped. When filtering applies, the removed
/// names are written to `removed_list` and the index is atomically rewritten;
/// when it abstains nothing is written. If `removed_list` already exists the
/// index is left untouched and the listed names are returned.
///
/// # Errors
///
/// Returns `Error::IndexUnavailable`/`Error::MalformedIndex` if the index
/// cannot be loaded, or `Error::Io` if an output cannot be written.
pub fn apply_filter(
    index_path: &Path,
    removed_list: &Path,
    config: &FilterConfig,
    side: Side,
    split_mode: bool,
) -> Result<FilterOutcome> {
    let mut index = SequenceIndex::load(index_path, side)?;
    if let Some(removed) = read_removed_list(removed_list)? {
        info!(
            "{} already filtered ({} contigs in {}), leaving it alone",
            index_path.display(),
            removed.len(),
            removed_list.display()
        );
        return Ok(FilterOutcome {
            removed,
            abstained: false,
            forced_reorder: false,
            already_filtered: true,
        });
    }

    let plan = if split_mode {
        plan_filter(&index.merge_splits(), config)
    } else {
        plan_filter(&index, config)
    };
    let forced_reorder = side == Side::Query && plan.fragmented;
    if forced_reorder {
        info!("{} assembly is fragmented, reordering will be forced", side);
    }

    if plan.abstained {
        info!(
            "Filter abstained on {}: {} candidates, at most {} allowed to skip",
            index_path.display(),
            plan.candidates.len(),
            config.min_filtered
        );
        return Ok(FilterOutcome {
            removed: Vec::new(),
            abstained: true,
            forced_reorder,
            already_filtered: false,
        });
    }

    let removed: HashSet<&str> = plan.removed().iter().map(String::as_str).collect();
    write_atomic(removed_list, |w: &mut dyn Write| {
        for name in plan.removed() {
            writeln!(w, "{name}")?;
        }
        Ok::<_, Error>(())
    })?;

    index.retain(|c| !removed.contains(SplitContigId::original_name(&c.name)));
    index.save(index_path)?;

    info!(
        "Filtered {} contigs out of {}",
        removed.len(),
        index_path.display()
    );
    Ok(FilterOutcome {
        removed: plan.removed().to_vec(),
        abstained: false,
        forced_reorder,
        already_filtered: false,
    })
}

/// Names of a previous filter pass, or `None` when there was none
fn read_removed_list(path: &Path) -> Result<Option<Vec<String>>> {
    let reader = match open_reader(path) {
        Ok(reader) => reader,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(Some(names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;

    fn index(lengths: &[(&str, u64)]) -> SequenceIndex {
        SequenceIndex::new(
            "s",
            lengths.iter().map(|(n, l)| Contig::new(*n, *l)).collect(),
        )
    }

    fn config(min_filtered: usize) -> FilterConfig {
        FilterConfig {
            min_filtered,
            ..FilterConfig::default()
        }
    }

    /// Ten big contigs plus tiny ones; the N95 contig is one of the 900s.
    fn assembly(tiny: usize) -> SequenceIndex {
        let mut contigs: Vec<(String, u64)> =
            (0..10).map(|i| (format!("big{i}"), 900)).collect();
        contigs.extend((0..tiny).map(|i| (format!("tiny{i}"), 40)));
        SequenceIndex::new(
            "s",
            contigs.into_iter().map(|(n, l)| Contig::new(n, l)).collect(),
        )
    }

    #[test]
    fn test_plan_finds_n95_and_min_length() {
        let plan = plan_filter(&assembly(3), &config(0));
        let (_, n_len) = plan.n_contig.clone().unwrap();
        assert_eq!(n_len, 900);
        assert!((plan.min_length - 45.0).abs() < 1e-9);
        assert_eq!(plan.candidates, vec!["tiny0", "tiny1", "tiny2"]);
        assert!(!plan.abstained);
    }

    #[test]
    fn test_abstains_when_few_candidates() {
        let plan = plan_filter(&assembly(3), &config(5));
        assert_eq!(plan.candidates.len(), 3);
        assert!(plan.abstained);
        assert!(plan.removed().is_empty());
    }

    #[test]
    fn test_cut_starts_at_first_short_contig() {
        // N95 contig is "b" (1000); min length 50. "c" (60) survives, "d" starts the cut.
        let plan = plan_filter(
            &index(&[("a", 9000), ("b", 1000), ("c", 60), ("d", 30), ("e", 20)]),
            &config(0),
        );
        assert_eq!(plan.n_contig, Some(("b".to_string(), 1000)));
        assert_eq!(plan.candidates, vec!["d", "e"]);
    }

    #[test]
    fn test_empty_index() {
        let plan = plan_filter(&index(&[]), &config(0));
        assert!(plan.abstained);
        assert!(plan.candidates.is_empty());
    }

    #[test]
    fn test_fragmented_assembly() {
        // 200 contigs of equal size: each is 0.5% of the total, all are "small"
        let contigs: Vec<(String, u64)> = (0..200).map(|i| (format!("c{i}"), 100)).collect();
        let idx = SequenceIndex::new(
            "s",
            contigs.into_iter().map(|(n, l)| Contig::new(n, l)).collect(),
        );
        assert!(plan_filter(&idx, &config(0)).fragmented);
        assert!(!plan_filter(&assembly(3), &config(0)).fragmented);
    }

    #[test]
    fn test_apply_filter_rewrites_index_and_side_file() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("query.idx");
        let removed = dir.path().join("filtered_contigs.txt");
        assembly(6).save(&idx).unwrap();

        let outcome = apply_filter(&idx, &removed, &config(5), Side::Query, false).unwrap();
        assert_eq!(outcome.removed.len(), 6);
        assert!(!outcome.abstained);
        assert!(!outcome.forced_reorder);

        let filtered = SequenceIndex::load(&idx, Side::Query).unwrap();
        assert_eq!(filtered.len(), 10);
        assert_eq!(std::fs::read_to_string(&removed).unwrap().lines().count(), 6);

        // A second pass only reports what the first one removed
        let again = apply_filter(&idx, &removed, &config(5), Side::Query, false).unwrap();
        assert!(again.already_filtered);
        assert_eq!(again.removed, outcome.removed);
        assert_eq!(SequenceIndex::load(&idx, Side::Query).unwrap(), filtered);
    }

    #[test]
    fn test_second_pass_is_noop_when_n95_contig_moves() {
        // Dropping the tiny contigs shrinks the total enough for the N95
        // contig to become "A", which would make "B" and "C" candidates.
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("query.idx");
        let removed = dir.path().join("filtered_contigs.txt");
        let mut contigs = vec![Contig::new("A", 9500), Contig::new("B", 400), Contig::new("C", 30)];
        contigs.extend((0..10).map(|i| Contig::new(format!("tiny{i}"), 10)));
        SequenceIndex::new("s", contigs).save(&idx).unwrap();

        let first = apply_filter(&idx, &removed, &FilterConfig::default(), Side::Query, false)
            .unwrap();
        let tiny: Vec<String> = (0..10).map(|i| format!("tiny{i}")).collect();
        assert_eq!(first.removed, tiny);
        let after_first = SequenceIndex::load(&idx, Side::Query).unwrap();
        assert_eq!(after_first.len(), 3);

        // Planning afresh on the filtered index would cut deeper
        let replanned = plan_filter(&after_first, &config(0));
        assert_eq!(replanned.candidates, vec!["B", "C"]);

        let second = apply_filter(&idx, &removed, &FilterConfig::default(), Side::Query, false)
            .unwrap();
        assert!(second.already_filtered);
        assert_eq!(second.removed, tiny);
        assert_eq!(SequenceIndex::load(&idx, Side::Query).unwrap(), after_first);
        assert_eq!(std::fs::read_to_string(&removed).unwrap().lines().count(), 10);
    }

    #[test]
    fn test_apply_filter_abstention_leaves_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("target.idx");
        let removed = dir.path().join("filtered_contigs.txt");
        let original = assembly(3);
        original.save(&idx).unwrap();

        let outcome = apply_filter(&idx, &removed, &config(5), Side::Target, false).unwrap();
        assert!(outcome.abstained);
        assert!(!removed.exists());
        assert_eq!(SequenceIndex::load(&idx, Side::Target).unwrap(), original);
    }

    #[test]
    fn test_apply_filter_split_mode_removes_all_pieces() {
        let dir = tempfile::tempdir().unwrap();
        let idx = dir.path().join("query.idx");
        let removed = dir.path().join("filtered_contigs.txt");
        index(&[
            ("big_###_1", 5000),
            ("big_###_2", 4000),
            ("mid", 1000),
            ("tiny_###_1", 20),
            ("tiny_###_2", 10),
            ("dust", 5),
        ])
        .save(&idx)
        .unwrap();

        let outcome = apply_filter(&idx, &removed, &config(1), Side::Query, true).unwrap();
        assert_eq!(outcome.removed, vec!["tiny", "dust"]);

        let filtered = SequenceIndex::load(&idx, Side::Query).unwrap();
        let names: Vec<&str> = filtered.contigs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["big_###_1", "big_###_2", "mid"]);
    }
}
