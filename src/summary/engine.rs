//! Coverage of the target axis per identity class.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::alignment::ClassifiedRecord;
use crate::core::types::IdentityClass;
use crate::plot::assembler::ParsedAlignment;
use crate::summary::intervals::{IntervalLabel, Partition};
use crate::utils::validation::to_f64;

/// Key of the positions covered by no record
pub const UNCOVERED_KEY: &str = "-1";

/// Percentage of the target axis per class key (`"-1"` for uncovered)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(pub BTreeMap<String, f64>);

impl Summary {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn uncovered(&self) -> f64 {
        self.get(UNCOVERED_KEY).unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Build the class partition of the target axis from classified records
pub fn partition<'a>(
    records: impl IntoIterator<Item = &'a ClassifiedRecord>,
    axis_len: u64,
) -> Partition {
    let mut partition = Partition::new();
    for record in records {
        let (start, end) = record.x_span();
        partition.insert(IntervalLabel::new(
            start.min(axis_len),
            end.min(axis_len),
            record.class,
        ));
    }
    partition
}

/// Percentages from a partition of an axis of length `axis_len`
pub fn summarize(partition: &Partition, axis_len: u64) -> Summary {
    let mut percentages = BTreeMap::new();
    if axis_len == 0 {
        percentages.insert(UNCOVERED_KEY.to_string(), 100.0);
        for class in IdentityClass::all() {
            percentages.insert(class.key(), 0.0);
        }
        return Summary(percentages);
    }

    let axis = to_f64(axis_len);
    let coverage = partition.coverage();
    for class in IdentityClass::all() {
        let covered = coverage[usize::from(class.0)];
        percentages.insert(class.key(), to_f64(covered) / axis * 100.0);
    }
    let uncovered = axis_len.saturating_sub(partition.covered());
    percentages.insert(UNCOVERED_KEY.to_string(), to_f64(uncovered) / axis * 100.0);
    Summary(percentages)
}

/// Coverage summary of every record of a parsed alignment
pub fn compute_summary(parsed: &ParsedAlignment) -> Summary {
    let axis_len = parsed.x_len();
    let partition = partition(parsed.records(), axis_len);
    debug!(
        "Target axis of {} bp resolved into {} intervals",
        axis_len,
        partition.len()
    );
    summarize(&partition, axis_len)
}
