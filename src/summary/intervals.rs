//! Interval algebra over the target axis.
//!
//! A [`Partition`] is a sorted list of disjoint, labelled intervals. Adding
//! an interval resolves every overlap by class: the higher class keeps the
//! overlapped positions, an equal class merges, and the parts of a losing
//! incoming interval that stick out are inserted again on their own.

use crate::core::types::IdentityClass;

/// Half-open `[start, end)` span labelled with an identity class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalLabel {
    pub start: u64,
    pub end: u64,
    pub class: IdentityClass,
}

impl IntervalLabel {
    pub fn new(start: u64, end: u64, class: IdentityClass) -> Self {
        Self { start, end, class }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn with_span(self, start: u64, end: u64) -> Option<Self> {
        (start < end).then_some(Self { start, end, ..self })
    }
}

/// How an incoming interval lies relative to an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlapCase {
    Disjoint,
    Exact,
    /// The incoming interval lies inside the existing one
    Contained,
    /// The incoming interval covers the existing one and more
    Containing,
    /// The incoming interval starts before the existing one and ends inside it
    PartialLeft,
    /// The incoming interval starts inside the existing one and ends after it
    PartialRight,
}

impl OverlapCase {
    pub fn classify(existing: &IntervalLabel, incoming: &IntervalLabel) -> Self {
        if incoming.end <= existing.start || incoming.start >= existing.end {
            Self::Disjoint
        } else if incoming.start == existing.start && incoming.end == existing.end {
            Self::Exact
        } else if incoming.start >= existing.start && incoming.end <= existing.end {
            Self::Contained
        } else if incoming.start <= existing.start && incoming.end >= existing.end {
            Self::Containing
        } else if incoming.start < existing.start {
            Self::PartialLeft
        } else {
            Self::PartialRight
        }
    }
}

/// Outcome of resolving one incoming interval against one existing interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Sorted, disjoint replacement for the existing interval. Includes the
    /// part of the incoming interval left of the existing one.
    pub placed: Vec<IntervalLabel>,
    /// Part of the incoming interval right of the existing one, still to be
    /// inserted
    pub leftover: Option<IntervalLabel>,
}

/// Resolve `incoming` against `existing`.
///
/// The caller guarantees the span left of `existing` is free, which holds
/// when `existing` is the first interval of the partition ending after
/// `incoming.start`.
pub fn resolve(existing: &IntervalLabel, incoming: &IntervalLabel) -> Resolution {
    let case = OverlapCase::classify(existing, incoming);
    if case == OverlapCase::Disjoint {
        let mut placed = vec![*existing, *incoming];
        placed.sort_by_key(|iv| iv.start);
        return Resolution {
            placed,
            leftover: None,
        };
    }

    let left = incoming.with_span(incoming.start, existing.start);
    let leftover = incoming.with_span(existing.end, incoming.end);
    let overlap_start = incoming.start.max(existing.start);
    let overlap_end = incoming.end.min(existing.end);

    let placed = if incoming.class > existing.class {
        [
            left,
            existing.with_span(existing.start, overlap_start),
            incoming.with_span(overlap_start, overlap_end),
            existing.with_span(overlap_end, existing.end),
        ]
        .into_iter()
        .flatten()
        .collect()
    } else if incoming.class == existing.class {
        vec![IntervalLabel::new(
            incoming.start.min(existing.start),
            existing.end,
            existing.class,
        )]
    } else {
        [left, Some(*existing)].into_iter().flatten().collect()
    };

    Resolution { placed, leftover }
}

/// Sorted set of disjoint labelled intervals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    intervals: Vec<IntervalLabel>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intervals(&self) -> &[IntervalLabel] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Add an interval, resolving overlaps by class
    pub fn insert(&mut self, interval: IntervalLabel) {
        let mut pending = Some(interval);
        while let Some(piece) = pending.take() {
            if piece.is_empty() {
                continue;
            }
            // First interval that ends after the piece starts
            let i = self.intervals.partition_point(|iv| iv.end <= piece.start);
            match self.intervals.get(i).copied() {
                Some(existing) if existing.start < piece.end => {
                    let resolution = resolve(&existing, &piece);
                    self.intervals.splice(i..=i, resolution.placed);
                    pending = resolution.leftover;
                }
                _ => self.intervals.insert(i, piece),
            }
        }
    }

    /// Positions covered by each class, indexed by class number
    pub fn coverage(&self) -> [u64; IdentityClass::COUNT] {
        let mut totals = [0u64; IdentityClass::COUNT];
        for iv in &self.intervals {
            if let Some(total) = totals.get_mut(usize::from(iv.class.0)) {
                *total += iv.len();
            }
        }
        totals
    }

    /// Total covered positions
    pub fn covered(&self) -> u64 {
        self.intervals.iter().map(IntervalLabel::len).sum()
    }
}
