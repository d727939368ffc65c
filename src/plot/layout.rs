//! Rendering layout: the JSON document a dotplot viewer consumes.
//!
//! Runs of tiny contigs may be drawn as a single `###MIX###_<k>` block so
//! that thousands of slivers do not drown the axis labels. Blocks exist for
//! rendering only; every computation works on the real contigs.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::alignment::ClassifiedRecord;
use crate::core::config::PlotConfig;
use crate::core::contig::MIX_PREFIX;
use crate::core::error::{Error, Result};
use crate::core::index::SequenceIndex;
use crate::plot::assembler::ParsedAlignment;
use crate::plot::noise::remove_noise;
use crate::utils::fs::write_atomic;
use crate::utils::validation::to_f64;

/// One labelled span of an axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisBlock {
    pub name: String,
    pub start: u64,
    pub length: u64,
    /// Number of contigs drawn in this block (more than one for MIX blocks)
    pub members: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reversed: bool,
}

/// Lay out an axis, coalescing consecutive contigs smaller than
/// `mix_fraction` of the axis when a fraction is given
pub fn axis_blocks(index: &SequenceIndex, mix_fraction: Option<f64>) -> Vec<AxisBlock> {
    let limit = mix_fraction.map(|f| f * to_f64(index.total_length()));
    let is_tiny = |length: u64| limit.is_some_and(|l| to_f64(length) < l);

    let mut blocks: Vec<AxisBlock> = Vec::with_capacity(index.len());
    let mut run: Vec<AxisBlock> = Vec::new();
    let mut mix_count = 0usize;
    let mut start = 0u64;

    let mut flush = |run: &mut Vec<AxisBlock>, blocks: &mut Vec<AxisBlock>| {
        if run.len() > 1 {
            mix_count += 1;
            blocks.push(AxisBlock {
                name: format!("{MIX_PREFIX}_{mix_count}"),
                start: run[0].start,
                length: run.iter().map(|b| b.length).sum(),
                members: run.len(),
                reversed: false,
            });
            run.clear();
        } else {
            blocks.append(run);
        }
    };

    for contig in index.contigs() {
        let block = AxisBlock {
            name: contig.name.clone(),
            start,
            length: contig.length,
            members: 1,
            reversed: contig.reversed,
        };
        start += contig.length;
        if is_tiny(contig.length) {
            run.push(block);
        } else {
            flush(&mut run, &mut blocks);
            blocks.push(block);
        }
    }
    flush(&mut run, &mut blocks);
    blocks
}

/// Rendering switches chosen per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub denoise: bool,
    pub mix: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            denoise: false,
            mix: true,
        }
    }
}

/// Everything needed to draw one dotplot
#[derive(Debug, Clone, Serialize)]
pub struct PlotData {
    pub x_name: String,
    pub y_name: String,
    pub x_len: u64,
    pub y_len: u64,
    pub x_contigs: Vec<AxisBlock>,
    pub y_contigs: Vec<AxisBlock>,
    /// Records per identity class key
    pub lines: BTreeMap<String, Vec<ClassifiedRecord>>,
    pub min_identity: Option<f64>,
    pub max_identity: Option<f64>,
    pub identity_thresholds: [f64; 3],
    pub sampled: bool,
    pub sorted: bool,
    pub forced_reorder: bool,
    pub max_records: usize,
    /// RFC 3339 time the document was built
    pub generated_at: String,
}

impl PlotData {
    pub fn build(
        parsed: &ParsedAlignment,
        config: &PlotConfig,
        options: PlotOptions,
        sorted: bool,
        forced_reorder: bool,
    ) -> Self {
        let mix = options.mix.then_some(config.mix_fraction);
        let lines = if options.denoise {
            remove_noise(&parsed.lines, &config.noise)
        } else {
            parsed.lines.clone()
        };

        Self {
            x_name: parsed.target.sample_name.clone(),
            y_name: parsed.query.sample_name.clone(),
            x_len: parsed.x_len(),
            y_len: parsed.y_len(),
            x_contigs: axis_blocks(&parsed.target, mix),
            y_contigs: axis_blocks(&parsed.query, mix),
            lines: lines
                .into_iter()
                .map(|(class, records)| (class.key(), records))
                .collect(),
            min_identity: parsed.min_identity,
            max_identity: parsed.max_identity,
            identity_thresholds: config.identity_thresholds,
            sampled: parsed.sampled,
            sorted,
            forced_reorder,
            max_records: config.max_records,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.lines.values().map(Vec::len).sum()
    }

    /// Write the document as JSON
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` or `Error::Io` if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |w: &mut dyn Write| {
            serde_json::to_writer(&mut *w, self)?;
            Ok::<_, Error>(())
        })?;
        info!(
            "Wrote {} records ({} x {}) to {}",
            self.record_count(),
            self.x_contigs.len(),
            self.y_contigs.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::contig::Contig;

    fn names(blocks: &[AxisBlock]) -> Vec<&str> {
        blocks.iter().map(|b| b.name.as_str()).collect()
    }

    fn index() -> SequenceIndex {
        SequenceIndex::new(
            "s",
            vec![
                Contig::new("big1", 50_000),
                Contig::new("t1", 10),
                Contig::new("t2", 20),
                Contig::new("t3", 30),
                Contig::new("big2", 49_000),
                Contig::new("t4", 40),
                Contig::new("big3", 900).with_reversed(true),
            ],
        )
    }

    #[test]
    fn test_no_mix_keeps_every_contig() {
        let blocks = axis_blocks(&index(), None);
        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[4].start, 50_060);
        assert!(blocks[6].reversed);
    }

    #[test]
    fn test_mix_coalesces_runs_only() {
        // 0.2% of 100_000 = 200: t1..t4 are tiny, big3 is not
        let blocks = axis_blocks(&index(), Some(0.002));
        assert_eq!(
            names(&blocks),
            vec!["big1", "###MIX###_1", "big2", "t4", "big3"]
        );
        assert_eq!(blocks[1].start, 50_000);
        assert_eq!(blocks[1].length, 60);
        assert_eq!(blocks[1].members, 3);
        assert_eq!(blocks[3].members, 1);

        // Blocks still tile the axis
        let total: u64 = blocks.iter().map(|b| b.length).sum();
        assert_eq!(total, index().total_length());
    }

    #[test]
    fn test_trailing_run_is_flushed() {
        let idx = SequenceIndex::new(
            "s",
            vec![
                Contig::new("big", 100_000),
                Contig::new("a", 1),
                Contig::new("b", 1),
            ],
        );
        let blocks = axis_blocks(&idx, Some(0.002));
        assert_eq!(names(&blocks), vec!["big", "###MIX###_1"]);
    }
}
