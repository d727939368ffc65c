//! Centralized numeric helpers and input limits.

/// Maximum number of contigs accepted in a single index (memory bound)
pub const MAX_CONTIGS: usize = 10_000_000;

/// Helper function to convert a count or genomic length to f64 with explicit
/// precision loss allowance
#[inline]
#[must_use]
pub fn to_f64(value: u64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        value as f64
    }
}

/// Same as [`to_f64`] for `usize` counts
#[inline]
#[must_use]
pub fn count_to_f64(count: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        count as f64
    }
}

/// Check if adding another contig would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new contig.
/// Returns an error message if adding would exceed the limit, None if safe to add.
#[must_use]
pub fn check_contig_limit(count: usize) -> Option<String> {
    if count >= MAX_CONTIGS {
        Some(format!(
            "Too many contigs: {count} reaches the maximum of {MAX_CONTIGS}"
        ))
    } else {
        None
    }
}

/// A fraction parameter must lie in `[0, 1]`
#[must_use]
pub fn is_fraction(value: f64) -> bool {
    (0.0..=1.0).contains(&value)
}
