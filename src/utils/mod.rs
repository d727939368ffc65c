//! Shared helpers: atomic file replacement, input readers and numeric limits.

pub mod fs;
pub mod validation;
