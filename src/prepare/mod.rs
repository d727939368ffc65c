//! Preparation stages run around the external aligner.
//!
//! - [`split`]: cut oversized contigs into bounded pieces before alignment
//! - [`merge`]: map alignments against pieces back onto the original contigs
//! - [`filter`]: drop too-small contigs before alignment

pub mod filter;
pub mod merge;
pub mod split;
