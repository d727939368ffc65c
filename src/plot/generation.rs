//! Job file layout and the raw/sorted generations of derived artifacts.
//!
//! A job directory holds the alignment and both indices. Sorting (and
//! reversing single contigs) never rewrites them; it writes a superseding
//! "sorted" generation of the alignment and query index next to them.

use std::path::{Path, PathBuf};

use crate::core::types::Side;

pub const ALIGNMENT_FILE: &str = "map.paf";
pub const QUERY_INDEX_FILE: &str = "query.idx";
pub const TARGET_INDEX_FILE: &str = "target.idx";
pub const SORTED_SUFFIX: &str = ".sorted";
pub const SUMMARY_FILE: &str = "summary.json";
pub const PLOT_FILE: &str = "plot.json";
pub const FILTERED_QUERY_FILE: &str = "filtered_query_contigs.txt";
pub const FILTERED_TARGET_FILE: &str = "filtered_target_contigs.txt";
pub const REORDER_MARKER: &str = ".reorder_required";

/// Standard file names of one comparison job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobLayout {
    dir: PathBuf,
}

impl JobLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn alignment(&self) -> PathBuf {
        self.dir.join(ALIGNMENT_FILE)
    }

    pub fn query_index(&self) -> PathBuf {
        self.dir.join(QUERY_INDEX_FILE)
    }

    pub fn target_index(&self) -> PathBuf {
        self.dir.join(TARGET_INDEX_FILE)
    }

    pub fn summary(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    pub fn plot(&self) -> PathBuf {
        self.dir.join(PLOT_FILE)
    }

    pub fn filtered_contigs(&self, side: Side) -> PathBuf {
        match side {
            Side::Query => self.dir.join(FILTERED_QUERY_FILE),
            Side::Target => self.dir.join(FILTERED_TARGET_FILE),
        }
    }

    /// Marker left by the filter when the query assembly is too fragmented
    pub fn reorder_marker(&self) -> PathBuf {
        self.dir.join(REORDER_MARKER)
    }

    pub fn raw(&self) -> Artifacts {
        Artifacts {
            alignment: self.alignment(),
            query_index: self.query_index(),
        }
    }
}

/// The mutable pair of files describing the query axis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub alignment: PathBuf,
    pub query_index: PathBuf,
}

impl Artifacts {
    /// The `.sorted` siblings of these files
    pub fn sorted_sibling(&self) -> Self {
        Self {
            alignment: with_suffix(&self.alignment, SORTED_SUFFIX),
            query_index: with_suffix(&self.query_index, SORTED_SUFFIX),
        }
    }

    pub fn exists(&self) -> bool {
        self.alignment.is_file() && self.query_index.is_file()
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Raw artifacts plus the optional sorted generation superseding them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub raw: Artifacts,
    pub sorted: Option<Artifacts>,
}

impl Generation {
    pub fn unsorted(raw: Artifacts) -> Self {
        Self { raw, sorted: None }
    }

    /// Inspect the job directory once to find the live generation
    pub fn discover(layout: &JobLayout) -> Self {
        let raw = layout.raw();
        let sorted = raw.sorted_sibling();
        Self {
            sorted: sorted.exists().then_some(sorted),
            raw,
        }
    }

    /// The artifacts readers should use
    pub fn live(&self) -> &Artifacts {
        self.sorted.as_ref().unwrap_or(&self.raw)
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted.is_some()
    }

    /// Paths the sorted generation lives at, whether or not it exists yet
    pub fn sorted_paths(&self) -> Artifacts {
        self.raw.sorted_sibling()
    }

    /// Switch between raw and sorted without touching the file system
    #[must_use]
    pub fn toggled(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            sorted: if self.sorted.is_some() {
                None
            } else {
                Some(self.sorted_paths())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = JobLayout::new("/jobs/42");
        assert_eq!(layout.alignment(), PathBuf::from("/jobs/42/map.paf"));
        assert_eq!(
            layout.raw().sorted_sibling().query_index,
            PathBuf::from("/jobs/42/query.idx.sorted")
        );
    }

    #[test]
    fn test_toggle_is_pure_and_involutive() {
        let generation = Generation::unsorted(JobLayout::new("/jobs/1").raw());
        assert!(!generation.is_sorted());
        assert_eq!(generation.live(), &generation.raw);

        let sorted = generation.toggled();
        assert!(sorted.is_sorted());
        assert_eq!(
            sorted.live().alignment,
            PathBuf::from("/jobs/1/map.paf.sorted")
        );
        assert_eq!(sorted.toggled(), generation);
    }

    #[test]
    fn test_discover_requires_both_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = JobLayout::new(dir.path());
        assert!(!Generation::discover(&layout).is_sorted());

        let sorted = layout.raw().sorted_sibling();
        std::fs::write(&sorted.alignment, "").unwrap();
        assert!(!Generation::discover(&layout).is_sorted());

        std::fs::write(&sorted.query_index, "q\n").unwrap();
        let generation = Generation::discover(&layout);
        assert!(generation.is_sorted());
        assert_eq!(generation.live(), &sorted);
    }
}
