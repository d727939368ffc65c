//! Cosmetic removal of short noise matches from the rendered record set.
//!
//! Short spurious matches pile up at the low end of the length histogram.
//! The threshold is the lower edge of the first bin past the modal bin whose
//! count falls under a fraction of the modal count.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::alignment::ClassifiedRecord;
use crate::core::config::NoiseConfig;
use crate::core::types::IdentityClass;
use crate::utils::validation::count_to_f64;

/// Length below which records count as noise, if the histogram has a tail
pub fn noise_threshold(lengths: &[f64], config: &NoiseConfig) -> Option<f64> {
    let bins = config.bins.max(1);
    let min = lengths.iter().copied().reduce(f64::min)?;
    let max = lengths.iter().copied().reduce(f64::max)?;
    if max <= min {
        return None;
    }

    let width = (max - min) / count_to_f64(bins);
    let mut counts = vec![0usize; bins];
    for &len in lengths {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = (((len - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    let (mode, &modal) = counts
        .iter()
        .enumerate()
        .reduce(|best, next| if next.1 > best.1 { next } else { best })?;
    let cutoff = config.mode_fraction * count_to_f64(modal);
    let bin = (mode + 1..bins).find(|&i| count_to_f64(counts[i]) < cutoff)?;

    let threshold = min + count_to_f64(bin) * width;
    debug!(
        "Noise threshold {:.1} (mode bin {} of {}, {} records)",
        threshold, mode, bins, modal
    );
    Some(threshold)
}

/// Copy of `lines` without records shorter than the noise threshold
pub fn remove_noise(
    lines: &BTreeMap<IdentityClass, Vec<ClassifiedRecord>>,
    config: &NoiseConfig,
) -> BTreeMap<IdentityClass, Vec<ClassifiedRecord>> {
    let lengths: Vec<f64> = lines
        .values()
        .flatten()
        .map(ClassifiedRecord::diagonal_length)
        .collect();
    let Some(threshold) = noise_threshold(&lengths, config) else {
        return lines.clone();
    };

    lines
        .iter()
        .map(|(class, records)| {
            let kept = records
                .iter()
                .filter(|r| r.diagonal_length() >= threshold)
                .cloned()
                .collect();
            (*class, kept)
        })
        .collect()
}
