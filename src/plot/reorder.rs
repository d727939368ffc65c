//! Reordering and reorientation of query contigs ("sort").
//!
//! Each query contig is pulled towards the target contig it shares the most
//! match mass with (its anchor), at the mass-weighted mean position of those
//! matches. Sorting contigs by that gravity lines the dotplot up along the
//! diagonal. Contigs whose anchor matches mostly run backwards are
//! reoriented, which mirrors their query coordinates in the alignment file.
//!
//! Results are written as the sorted generation of the job; the raw files
//! are never modified.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::core::alignment::ClassifiedRecord;
use crate::core::config::{OrientationConfig, PlotConfig};
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::core::types::Side;
use crate::parsing::paf::AlignmentReader;
use crate::plot::assembler::{Assembler, ParsedAlignment};
use crate::plot::generation::{Artifacts, Generation, JobLayout};
use crate::utils::fs::{remove_if_exists, write_atomic};
use crate::utils::validation::{count_to_f64, to_f64};

/// Where one query contig is pulled to
#[derive(Debug, Clone, PartialEq)]
pub struct GravityAssignment {
    pub query: String,
    /// Target contig with the largest accumulated mass
    pub anchor: String,
    pub mass: f64,
    /// Mass-weighted mean of anchor match midpoints on the target axis
    pub gravity: f64,
}

/// Result of the orientation vote of one contig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    WellOriented,
    Misoriented,
    /// No match was long enough to vote
    Undetermined,
}

/// What [`sort_job`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortOutcome {
    /// New query contig order
    pub order: Vec<String>,
    /// Contigs whose orientation was flipped
    pub reoriented: Vec<String>,
    pub forced: bool,
    pub records: usize,
}

fn mass(record: &ClassifiedRecord) -> f64 {
    (1.0 + record.diagonal_length()).powi(2)
}

/// Gravity of every matched query contig, in query index order
pub fn compute_gravity(parsed: &ParsedAlignment) -> Vec<GravityAssignment> {
    let grouped = parsed.records_by_query();
    let mut assignments = Vec::with_capacity(grouped.len());

    for contig in parsed.query.contigs() {
        let Some(records) = grouped.get(contig.name.as_str()) else {
            continue;
        };

        let mut targets: Vec<(&str, f64)> = Vec::new();
        for record in records {
            match targets.iter_mut().find(|(name, _)| *name == record.target) {
                Some((_, total)) => *total += mass(record),
                None => targets.push((record.target.as_str(), mass(record))),
            }
        }
        // Equal masses go to the target placed first on the x axis
        let Some(&(anchor, anchor_mass)) = targets.iter().reduce(|best, next| {
            match next.1.total_cmp(&best.1) {
                Ordering::Greater => next,
                Ordering::Equal
                    if parsed.target.position(next.0) < parsed.target.position(best.0) =>
                {
                    next
                }
                _ => best,
            }
        }) else {
            continue;
        };

        let weighted: f64 = records
            .iter()
            .filter(|r| r.target == anchor)
            .map(|r| mass(r) * r.x_mid())
            .sum();
        assignments.push(GravityAssignment {
            query: contig.name.clone(),
            anchor: anchor.to_string(),
            mass: anchor_mass,
            gravity: weighted / anchor_mass,
        });
    }
    assignments
}

/// New query order: stable sort by gravity, unmatched contigs last
pub fn gravity_order(
    parsed: &ParsedAlignment,
    assignments: &[GravityAssignment],
    config: &OrientationConfig,
) -> Vec<String> {
    let unmatched = to_f64(parsed.x_len()) + config.unmatched_gravity_offset;
    let by_name: HashMap<&str, f64> = assignments
        .iter()
        .map(|a| (a.query.as_str(), a.gravity))
        .collect();

    let mut ranked: Vec<(&str, f64)> = parsed
        .query
        .contigs()
        .iter()
        .map(|c| {
            let name = c.name.as_str();
            (name, by_name.get(name).copied().unwrap_or(unmatched))
        })
        .collect();
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.into_iter().map(|(name, _)| name.to_string()).collect()
}

/// Vote on the orientation of a contig from its matches against its anchor
pub fn check_orientation(
    anchor_matches: &[&ClassifiedRecord],
    query_len: u64,
    anchor_len: u64,
    config: &OrientationConfig,
) -> Orientation {
    let mut by_length: Vec<(f64, &ClassifiedRecord)> = anchor_matches
        .iter()
        .map(|r| (r.diagonal_length(), *r))
        .collect();
    by_length.sort_by(|a, b| b.0.total_cmp(&a.0));

    let Some(&(longest, _)) = by_length.first() else {
        return Orientation::Undetermined;
    };
    let min_relative = config.longest_fraction * longest;
    let min_absolute = config.contig_fraction * to_f64(query_len.min(anchor_len));
    let mut voters: Vec<&ClassifiedRecord> = by_length
        .iter()
        .take_while(|(len, _)| *len > min_relative && *len > min_absolute)
        .map(|(_, r)| *r)
        .collect();

    match voters.len() {
        0 => Orientation::Undetermined,
        1 => {
            if voters[0].is_forward() {
                Orientation::WellOriented
            } else {
                Orientation::Misoriented
            }
        }
        n => {
            voters.sort_by(|a, b| a.x_mid().total_cmp(&b.x_mid()));
            let signs: f64 = voters
                .windows(2)
                .map(|pair| direction(pair[0], pair[1]))
                .sum();
            if signs / count_to_f64(n - 1) > config.vote_tolerance {
                Orientation::WellOriented
            } else {
                Orientation::Misoriented
            }
        }
    }
}

/// Sign of the query-axis move between two matches
fn direction(from: &ClassifiedRecord, to: &ClassifiedRecord) -> f64 {
    let start = to_f64(from.y1) + to_f64(from.y2);
    let end = to_f64(to.y1) + to_f64(to.y2);
    if end > start {
        1.0
    } else if end < start {
        -1.0
    } else {
        0.0
    }
}

/// Query contigs whose anchor matches vote for reorientation
pub fn misoriented_contigs(
    parsed: &ParsedAlignment,
    assignments: &[GravityAssignment],
    config: &OrientationConfig,
) -> Vec<String> {
    let grouped = parsed.records_by_query();
    assignments
        .iter()
        .filter(|a| {
            let matches: Vec<&ClassifiedRecord> = grouped
                .get(a.query.as_str())
                .map(|records| {
                    records
                        .iter()
                        .filter(|r| r.target == a.anchor)
                        .copied()
                        .collect()
                })
                .unwrap_or_default();
            let query_len = parsed.query.length(&a.query).unwrap_or(0);
            let anchor_len = parsed.target.length(&a.anchor).unwrap_or(0);
            check_orientation(&matches, query_len, anchor_len, config) == Orientation::Misoriented
        })
        .map(|a| a.query.clone())
        .collect()
}

/// Copy an alignment file, reorienting every record of the named query contigs
fn rewrite_alignment(source: &Path, dest: &Path, flip: &HashSet<&str>) -> Result<usize> {
    let reader = AlignmentReader::open(source)?;
    let mut count = 0;
    write_atomic(dest, |w: &mut dyn Write| {
        for record in reader {
            let mut record = record?;
            if flip.contains(record.query_id.as_str()) {
                record.reorient_query();
            }
            writeln!(w, "{}", record.to_line())?;
            count += 1;
        }
        Ok::<_, Error>(())
    })?;
    Ok(count)
}

fn write_generation(
    live: &Artifacts,
    sorted: &Artifacts,
    index: &SequenceIndex,
    flip: &HashSet<&str>,
) -> Result<usize> {
    let records = rewrite_alignment(&live.alignment, &sorted.alignment, flip)?;
    index.save(&sorted.query_index)?;
    Ok(records)
}

/// Reorder and reorient the query contigs of a job.
///
/// Works from the live generation over every record (no cap, no MIX
/// blocks) and writes the sorted generation. Clears a pending forced
/// reorder marker.
///
/// # Errors
///
/// Propagates parse errors of the live files and IO errors on write.
pub fn sort_job(layout: &JobLayout, config: &PlotConfig, forced: bool) -> Result<SortOutcome> {
    let generation = Generation::discover(layout);
    let live = generation.live().clone();
    let parsed = Assembler::new(config.clone()).parse_all(
        &live.alignment,
        &live.query_index,
        &layout.target_index(),
    )?;

    let assignments = compute_gravity(&parsed);
    let order = gravity_order(&parsed, &assignments, &config.orientation);
    let reoriented = misoriented_contigs(&parsed, &assignments, &config.orientation);
    debug!(
        "{} of {} query contigs anchored, {} to reorient",
        assignments.len(),
        parsed.query.len(),
        reoriented.len()
    );

    let mut index = parsed.query;
    for name in &reoriented {
        index.toggle_reversed(name);
    }
    index.reorder(&order);

    let flip: HashSet<&str> = reoriented.iter().map(String::as_str).collect();
    let records = write_generation(&live, &generation.sorted_paths(), &index, &flip)?;
    remove_if_exists(&layout.reorder_marker())?;

    info!(
        "Sorted {} query contigs, reoriented {}{}",
        order.len(),
        reoriented.len(),
        if forced { " (forced)" } else { "" }
    );
    Ok(SortOutcome {
        order,
        reoriented,
        forced,
        records,
    })
}

/// Sort the job if the filter asked for it and it is not sorted yet
///
/// # Errors
///
/// Same as [`sort_job`].
pub fn apply_forced_reorder(
    layout: &JobLayout,
    config: &PlotConfig,
) -> Result<Option<SortOutcome>> {
    if !layout.reorder_marker().exists() {
        return Ok(None);
    }
    if Generation::discover(layout).is_sorted() {
        remove_if_exists(&layout.reorder_marker())?;
        return Ok(None);
    }
    info!("Query assembly is fragmented, sorting before plotting");
    sort_job(layout, config, true).map(Some)
}

/// Drop the sorted generation; returns false if there was none
///
/// # Errors
///
/// Returns `Error::Io` if a file exists but cannot be removed.
pub fn unsort_job(layout: &JobLayout) -> Result<bool> {
    let sorted = layout.raw().sorted_sibling();
    let removed_alignment = remove_if_exists(&sorted.alignment)?;
    let removed_index = remove_if_exists(&sorted.query_index)?;
    if removed_alignment || removed_index {
        info!("Discarded sorted generation of {}", layout.dir().display());
    }
    Ok(removed_alignment || removed_index)
}

/// Reverse one query contig, returning its new `reversed` flag.
///
/// The change lands in the sorted generation, created from the raw files
/// first if the job was never sorted.
///
/// # Errors
///
/// Returns `Error::UnknownContig` if the contig is not in the query index,
/// plus any read or write error.
pub fn reverse_contig(layout: &JobLayout, name: &str) -> Result<bool> {
    let generation = Generation::discover(layout);
    let live = generation.live().clone();
    let mut index = SequenceIndex::load(&live.query_index, Side::Query)?;
    if !index.toggle_reversed(name) {
        return Err(Error::UnknownContig(name.to_string()));
    }

    let flip: HashSet<&str> = [name].into_iter().collect();
    let records = write_generation(&live, &generation.sorted_paths(), &index, &flip)?;
    let reversed = index.is_reversed(name);
    info!(
        "Reversed query contig {} ({} records rewritten), now {}",
        name,
        records,
        if reversed { "reversed" } else { "forward" }
    );
    Ok(reversed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;
    use crate::core::types::IdentityClass;
    use crate::parsing::paf::read_alignment_file;
    use crate::core::types::Strand;

    fn classified(x: (u64, u64), y: (u64, u64), query: &str, target: &str) -> ClassifiedRecord {
        ClassifiedRecord {
            x1: x.0,
            x2: x.1,
            y1: y.0,
            y2: y.1,
            identity: 1.0,
            class: IdentityClass(3),
            query: query.to_string(),
            target: target.to_string(),
        }
    }

    fn config() -> OrientationConfig {
        OrientationConfig::default()
    }

    #[test]
    fn test_single_voter() {
        let forward = classified((0, 100), (0, 100), "q", "t");
        let backward = classified((100, 0), (0, 100), "q", "t");
        assert_eq!(
            check_orientation(&[&forward], 1000, 1000, &config()),
            Orientation::WellOriented
        );
        assert_eq!(
            check_orientation(&[&backward], 1000, 1000, &config()),
            Orientation::Misoriented
        );
    }

    #[test]
    fn test_no_voter_is_undetermined() {
        assert_eq!(check_orientation(&[], 10, 10, &config()), Orientation::Undetermined);
        // Below 5% of min(query, anchor) length
        let tiny = classified((0, 10), (10, 0), "q", "t");
        assert_eq!(
            check_orientation(&[&tiny], 100_000, 100_000, &config()),
            Orientation::Undetermined
        );
    }

    #[test]
    fn test_multi_voter_descending_query_is_misoriented() {
        // Along the target, the matches walk down the query axis
        let a = classified((0, 100), (900, 1000), "q", "t");
        let b = classified((200, 300), (500, 600), "q", "t");
        let c = classified((400, 500), (100, 200), "q", "t");
        assert_eq!(
            check_orientation(&[&a, &b, &c], 1000, 1000, &config()),
            Orientation::Misoriented
        );
        let d = classified((600, 700), (950, 1000), "q", "t");
        // Two downs, one up: mean -1/3 is still below the tolerance
        assert_eq!(
            check_orientation(&[&c, &a, &b, &d], 1000, 1000, &config()),
            Orientation::Misoriented
        );
    }

    #[test]
    fn test_short_matches_do_not_vote() {
        let long = classified((0, 1000), (0, 1000), "q", "t");
        // Less than 10% of the longest match
        let noise = classified((2000, 1950), (1000, 1050), "q", "t");
        assert_eq!(
            check_orientation(&[&noise, &long], 2000, 5000, &config()),
            Orientation::WellOriented
        );
    }

    struct Job {
        _dir: tempfile::TempDir,
        layout: JobLayout,
    }

    /// Query contigs listed out of target order, "q2" aligned backwards
    fn job() -> Job {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        SequenceIndex::new(
            "Query",
            vec![
                Contig::new("q1", 1000),
                Contig::new("q2", 1000),
                Contig::new("q3", 500),
                Contig::new("lonely", 50),
            ],
        )
        .save(&layout.query_index())
        .unwrap();
        SequenceIndex::new("Target", vec![Contig::new("t1", 2000), Contig::new("t2", 2000)])
            .save(&layout.target_index())
            .unwrap();
        std::fs::write(
            layout.alignment(),
            "q1\t1000\t0\t1000\t+\tt2\t2000\t500\t1500\t1000\t1000\t60\n\
             q2\t1000\t0\t1000\t-\tt1\t2000\t0\t1000\t990\t1000\t60\n\
             q3\t500\t0\t500\t+\tt1\t2000\t1200\t1700\t400\t500\t60\n\
             q3\t500\t0\t20\t+\tt2\t2000\t0\t20\t20\t20\t60\n",
        )
        .unwrap();
        Job { _dir: dir, layout }
    }

    #[test]
    fn test_gravity_and_order() {
        let job = job();
        let assembler = Assembler::default();
        let parsed = assembler
            .parse_all(
                &job.layout.alignment(),
                &job.layout.query_index(),
                &job.layout.target_index(),
            )
            .unwrap();
        let assignments = compute_gravity(&parsed);
        assert_eq!(assignments.len(), 3);
        let q3 = assignments.iter().find(|a| a.query == "q3").unwrap();
        assert_eq!(q3.anchor, "t1");
        assert!((q3.gravity - 1450.0).abs() < 1e-9);

        let order = gravity_order(&parsed, &assignments, &config());
        assert_eq!(order, vec!["q2", "q3", "q1", "lonely"]);
        assert_eq!(misoriented_contigs(&parsed, &assignments, &config()), vec!["q2"]);
    }

    #[test]
    fn test_gravity_tie_goes_to_first_target_on_axis() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        SequenceIndex::new("Query", vec![Contig::new("q", 100)])
            .save(&layout.query_index())
            .unwrap();
        SequenceIndex::new("Target", vec![Contig::new("t1", 2000), Contig::new("t2", 2000)])
            .save(&layout.target_index())
            .unwrap();
        // Same span against both targets; the t2 match is in a lower identity
        // class so it is visited first
        std::fs::write(
            layout.alignment(),
            "q\t100\t0\t100\t+\tt1\t2000\t0\t100\t100\t100\t60\n\
             q\t100\t0\t100\t+\tt2\t2000\t0\t100\t10\t100\t60\n",
        )
        .unwrap();

        let parsed = Assembler::default()
            .parse_all(&layout.alignment(), &layout.query_index(), &layout.target_index())
            .unwrap();
        assert_eq!(parsed.records_by_query()["q"][0].target, "t2");

        let assignments = compute_gravity(&parsed);
        assert_eq!(assignments[0].anchor, "t1");
        assert!((assignments[0].gravity - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sort_writes_sorted_generation_only() {
        let job = job();
        let raw_paf = std::fs::read_to_string(job.layout.alignment()).unwrap();

        let outcome = sort_job(&job.layout, &PlotConfig::default(), false).unwrap();
        assert_eq!(outcome.reoriented, vec!["q2"]);
        assert_eq!(outcome.records, 4);

        assert_eq!(std::fs::read_to_string(job.layout.alignment()).unwrap(), raw_paf);
        let generation = Generation::discover(&job.layout);
        assert!(generation.is_sorted());

        let sorted_index = SequenceIndex::load(&generation.live().query_index, Side::Query).unwrap();
        let names: Vec<&str> = sorted_index.contigs().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["q2", "q3", "q1", "lonely"]);
        assert!(sorted_index.is_reversed("q2"));
        assert!(!sorted_index.is_reversed("q1"));

        let records = read_alignment_file(&generation.live().alignment).unwrap();
        assert_eq!(records[1].strand, Strand::Forward);
        assert_eq!((records[1].query_start, records[1].query_end), (0, 1000));

        // Re-sorting a sorted job finds nothing left to flip
        let again = sort_job(&job.layout, &PlotConfig::default(), false).unwrap();
        assert!(again.reoriented.is_empty());
        assert_eq!(again.order, outcome.order);
    }

    #[test]
    fn test_unsort_restores_raw() {
        let job = job();
        assert!(!unsort_job(&job.layout).unwrap());
        sort_job(&job.layout, &PlotConfig::default(), false).unwrap();
        assert!(unsort_job(&job.layout).unwrap());
        assert!(!Generation::discover(&job.layout).is_sorted());
    }

    #[test]
    fn test_reverse_contig_twice_is_identity() {
        let job = job();
        assert!(reverse_contig(&job.layout, "q3").unwrap());
        let generation = Generation::discover(&job.layout);
        assert!(generation.is_sorted());
        let once = read_alignment_file(&generation.live().alignment).unwrap();
        assert_eq!((once[2].query_start, once[2].query_end), (0, 500));
        assert_eq!(once[2].strand, Strand::Reverse);
        assert_eq!((once[3].query_start, once[3].query_end), (480, 500));

        assert!(!reverse_contig(&job.layout, "q3").unwrap());
        let twice = read_alignment_file(&generation.live().alignment).unwrap();
        assert_eq!(twice, read_alignment_file(&job.layout.alignment()).unwrap());
    }

    #[test]
    fn test_reverse_unknown_contig() {
        let job = job();
        let err = reverse_contig(&job.layout, "nope").unwrap_err();
        assert!(matches!(err, Error::UnknownContig(_)));
        assert!(!Generation::discover(&job.layout).is_sorted());
    }

    #[test]
    fn test_forced_reorder_marker() {
        let job = job();
        assert!(apply_forced_reorder(&job.layout, &PlotConfig::default())
            .unwrap()
            .is_none());

        std::fs::write(job.layout.reorder_marker(), "").unwrap();
        let outcome = apply_forced_reorder(&job.layout, &PlotConfig::default())
            .unwrap()
            .unwrap();
        assert!(outcome.forced);
        assert!(!job.layout.reorder_marker().exists());
    }
}
