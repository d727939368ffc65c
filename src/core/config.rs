//! Engine configuration.
//!
//! Every component receives its own config struct at construction time.
//! `EngineConfig` groups them so a whole run can be loaded from one JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::utils::validation::is_fraction;

/// Default size of split pieces (bytes)
pub const DEFAULT_SPLIT_SIZE: u64 = 10_000_000;

/// Default cap on records kept for rendering
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

/// Default identity class thresholds (quartiles)
pub const DEFAULT_IDENTITY_THRESHOLDS: [f64; 3] = [0.25, 0.5, 0.75];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Target piece size `S`
    pub split_size: u64,
    /// Tolerance as a fraction of `S`; tails shorter than this are absorbed
    pub tolerance: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            split_size: DEFAULT_SPLIT_SIZE,
            tolerance: 0.1,
        }
    }
}

impl SplitConfig {
    /// Absolute tolerance `t = tolerance * S`
    pub fn tolerance_bases(&self) -> u64 {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        {
            (self.tolerance * self.split_size as f64).round() as u64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Filtering is abandoned unless strictly more contigs than this would go
    pub min_filtered: usize,
    /// Fraction of the total length defining the N-contig (0.95 for N95)
    pub coverage_fraction: f64,
    /// Contigs shorter than this fraction of the N-contig are cut
    pub min_length_fraction: f64,
    /// Contigs shorter than this fraction of the total count as "small"
    pub small_contig_fraction: f64,
    /// Reordering is forced when small contigs exceed this fraction of the N-length
    pub fragmented_fraction: f64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_filtered: 0,
            coverage_fraction: 0.95,
            min_length_fraction: 0.05,
            small_contig_fraction: 0.01,
            fragmented_fraction: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationConfig {
    /// Matches shorter than this fraction of the longest anchor match do not vote
    pub longest_fraction: f64,
    /// Matches shorter than this fraction of min(query, anchor) length do not vote
    pub contig_fraction: f64,
    /// Mean direction sign must exceed this for a contig to count as well oriented
    pub vote_tolerance: f64,
    /// Gravity given to unmatched contigs, past the end of the target axis
    pub unmatched_gravity_offset: f64,
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            longest_fraction: 0.1,
            contig_fraction: 0.05,
            vote_tolerance: -0.1,
            unmatched_gravity_offset: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Number of histogram bins over record lengths
    pub bins: usize,
    /// A bin below this fraction of the modal count ends the noise peak
    pub mode_fraction: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            bins: 100,
            mode_fraction: 0.01,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// Records beyond this count are not rendered (`sampled = true`)
    pub max_records: usize,
    /// Ascending thresholds separating the four identity classes
    pub identity_thresholds: [f64; 3],
    /// Contigs below this fraction of the axis are coalesced into MIX blocks
    pub mix_fraction: f64,
    pub orientation: OrientationConfig,
    pub noise: NoiseConfig,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            identity_thresholds: DEFAULT_IDENTITY_THRESHOLDS,
            mix_fraction: 0.002,
            orientation: OrientationConfig::default(),
            noise: NoiseConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// How many times a second caller checks for a running computation
    pub poll_attempts: u32,
    /// First wait between polls
    pub poll_initial_ms: u64,
    /// Multiplier applied to the wait after each poll
    pub poll_backoff: f64,
    /// Upper bound of a single wait
    pub poll_max_ms: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            poll_attempts: 10,
            poll_initial_ms: 200,
            poll_backoff: 2.0,
            poll_max_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub split: SplitConfig,
    pub filter: FilterConfig,
    pub plot: PlotConfig,
    pub summary: SummaryConfig,
}

impl EngineConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, `Error::Json` if it is
    /// not valid JSON and `Error::InvalidConfig` if a value is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Same as [`EngineConfig::load`] minus IO.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is in range
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidConfig(msg.to_string()));

        if self.split.split_size == 0 {
            return invalid("split.split_size must be positive");
        }
        if !(0.0..1.0).contains(&self.split.tolerance) {
            return invalid("split.tolerance must be in [0, 1)");
        }
        for (name, value) in [
            ("filter.coverage_fraction", self.filter.coverage_fraction),
            ("filter.min_length_fraction", self.filter.min_length_fraction),
            ("filter.small_contig_fraction", self.filter.small_contig_fraction),
            ("filter.fragmented_fraction", self.filter.fragmented_fraction),
            ("plot.mix_fraction", self.plot.mix_fraction),
            ("plot.orientation.longest_fraction", self.plot.orientation.longest_fraction),
            ("plot.orientation.contig_fraction", self.plot.orientation.contig_fraction),
            ("plot.noise.mode_fraction", self.plot.noise.mode_fraction),
        ] {
            if !is_fraction(value) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1]")));
            }
        }
        let t = self.plot.identity_thresholds;
        if !t.iter().all(|&v| is_fraction(v)) || !(t[0] <= t[1] && t[1] <= t[2]) {
            return invalid("plot.identity_thresholds must be ascending values in [0, 1]");
        }
        if self.plot.max_records == 0 {
            return invalid("plot.max_records must be positive");
        }
        if self.plot.noise.bins == 0 {
            return invalid("plot.noise.bins must be positive");
        }
        if self.summary.poll_backoff < 1.0 {
            return invalid("summary.poll_backoff must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            EngineConfig::from_json(r#"{"split": {"split_size": 1500}, "filter": {"min_filtered": 5}}"#)
                .unwrap();
        assert_eq!(config.split.split_size, 1500);
        assert!((config.split.tolerance - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.split.tolerance_bases(), 150);
        assert_eq!(config.filter.min_filtered, 5);
        assert_eq!(config.plot.identity_thresholds, DEFAULT_IDENTITY_THRESHOLDS);
    }

    #[test]
    fn test_rejects_unsorted_thresholds() {
        let err = EngineConfig::from_json(r#"{"plot": {"identity_thresholds": [0.5, 0.25, 0.75]}}"#)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_zero_split_size() {
        let err = EngineConfig::from_json(r#"{"split": {"split_size": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("split_size"));
    }
}
