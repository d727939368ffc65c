use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::core::contig::{Contig, SplitContigId};
use crate::core::error::Result;
use crate::core::types::Side;
use crate::parsing;

/// Per-sample contig catalog: display order, lengths and orientation flags.
///
/// Names are unique; the position of a contig in `contigs` is its display
/// order, from which the absolute offsets of the global axis are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceIndex {
    pub sample_name: String,
    contigs: Vec<Contig>,
    positions: HashMap<String, usize>,
}

/// Cumulative start of every contig on a single linear axis
#[derive(Debug, Clone, Default)]
pub struct Offsets {
    /// Absolute start and length by contig name
    spans: HashMap<String, (u64, u64)>,
    total: u64,
}

impl Offsets {
    pub fn abs_start(&self, name: &str) -> Option<u64> {
        self.spans.get(name).map(|&(start, _)| start)
    }

    /// Absolute start and indexed length of a contig
    pub fn span(&self, name: &str) -> Option<(u64, u64)> {
        self.spans.get(name).copied()
    }

    pub fn total_length(&self) -> u64 {
        self.total
    }
}

impl SequenceIndex {
    /// Build an index from contigs in display order.
    ///
    /// Later duplicates of a name are dropped; use [`SequenceIndex::try_new`]
    /// to reject them instead.
    pub fn new(sample_name: impl Into<String>, contigs: Vec<Contig>) -> Self {
        let mut index = Self {
            sample_name: sample_name.into(),
            contigs: Vec::with_capacity(contigs.len()),
            positions: HashMap::with_capacity(contigs.len()),
        };
        for contig in contigs {
            index.push(contig);
        }
        index
    }

    /// Build an index, returning the first duplicated name on failure
    pub fn try_new(
        sample_name: impl Into<String>,
        contigs: Vec<Contig>,
    ) -> std::result::Result<Self, String> {
        let mut seen = HashSet::with_capacity(contigs.len());
        for contig in &contigs {
            if !seen.insert(contig.name.as_str()) {
                return Err(contig.name.clone());
            }
        }
        Ok(Self::new(sample_name, contigs))
    }

    /// Load an index file
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexUnavailable` if the file cannot be opened and
    /// `Error::MalformedIndex` if a line cannot be parsed.
    pub fn load(path: &Path, side: Side) -> Result<Self> {
        parsing::index::read_index_file(path, side)
    }

    /// Load an index file, collapsing split pieces back to their originals
    ///
    /// # Errors
    ///
    /// Same as [`SequenceIndex::load`].
    pub fn load_merged(path: &Path, side: Side) -> Result<Self> {
        Ok(Self::load(path, side)?.merge_splits())
    }

    /// Atomically replace the index file at `path`
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        parsing::index::write_index_file(self, path)
    }

    fn push(&mut self, contig: Contig) {
        if self.positions.contains_key(&contig.name) {
            return;
        }
        self.positions.insert(contig.name.clone(), self.contigs.len());
        self.contigs.push(contig);
    }

    fn rebuild_positions(&mut self) {
        self.positions = self
            .contigs
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn get(&self, name: &str) -> Option<&Contig> {
        self.positions.get(name).map(|&i| &self.contigs[i])
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn length(&self, name: &str) -> Option<u64> {
        self.get(name).map(|c| c.length)
    }

    pub fn is_reversed(&self, name: &str) -> bool {
        self.get(name).is_some_and(|c| c.reversed)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn total_length(&self) -> u64 {
        self.contigs.iter().map(|c| c.length).sum()
    }

    /// Absolute start of every contig along the display order
    pub fn offsets(&self) -> Offsets {
        let mut spans = HashMap::with_capacity(self.contigs.len());
        let mut total = 0u64;
        for contig in &self.contigs {
            spans.insert(contig.name.clone(), (total, contig.length));
            total += contig.length;
        }
        Offsets { spans, total }
    }

    /// Flip the orientation flag of a contig; returns false if it is unknown
    pub fn toggle_reversed(&mut self, name: &str) -> bool {
        match self.positions.get(name) {
            Some(&i) => {
                self.contigs[i].reversed = !self.contigs[i].reversed;
                true
            }
            None => false,
        }
    }

    /// Keep only contigs accepted by `keep`, preserving relative order
    pub fn retain(&mut self, mut keep: impl FnMut(&Contig) -> bool) {
        self.contigs.retain(|c| keep(c));
        self.rebuild_positions();
    }

    /// Rearrange contigs to follow `order`.
    ///
    /// Names in `order` that are unknown are ignored; contigs missing from
    /// `order` keep their relative order after the listed ones.
    pub fn reorder(&mut self, order: &[String]) {
        let mut taken = vec![false; self.contigs.len()];
        let mut reordered = Vec::with_capacity(self.contigs.len());
        for name in order {
            if let Some(&i) = self.positions.get(name) {
                if !taken[i] {
                    taken[i] = true;
                    reordered.push(self.contigs[i].clone());
                }
            }
        }
        for (i, contig) in self.contigs.iter().enumerate() {
            if !taken[i] {
                reordered.push(contig.clone());
            }
        }
        self.contigs = reordered;
        self.rebuild_positions();
    }

    /// Collapse split pieces into one entry per original contig.
    ///
    /// The merged length is the sum of the pieces and the merged entry takes
    /// the position of the first piece seen in the index.
    #[must_use]
    pub fn merge_splits(&self) -> Self {
        let mut merged: Vec<Contig> = Vec::with_capacity(self.contigs.len());
        let mut slot: HashMap<String, usize> = HashMap::new();
        for contig in &self.contigs {
            let name = SplitContigId::original_name(&contig.name);
            match slot.get(name) {
                Some(&i) => merged[i].length += contig.length,
                None => {
                    slot.insert(name.to_string(), merged.len());
                    merged.push(Contig::new(name, contig.length).with_reversed(contig.reversed));
                }
            }
        }
        Self::new(self.sample_name.clone(), merged)
    }
}
