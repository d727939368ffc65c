//! Core data types for the coordinate and alignment-geometry engine.
//!
//! - [`SequenceIndex`](index::SequenceIndex): per-sample contig catalog with derived offsets
//! - [`Contig`](contig::Contig), [`SplitContigId`](contig::SplitContigId): contigs and split pieces
//! - [`AlignmentRecord`](alignment::AlignmentRecord): one aligned block in contig coordinates
//! - [`ClassifiedRecord`](alignment::ClassifiedRecord): the same block on the global axes
//! - [`Side`](types::Side), [`Strand`](types::Strand), [`IdentityClass`](types::IdentityClass)
//! - [`EngineConfig`](config::EngineConfig) and per-component configs
//! - [`Error`](error::Error): the structured error taxonomy
//!
//! ## Axes
//!
//! | Axis | Genome | Index file |
//! |------|--------|------------|
//! | x    | target | `target.idx` |
//! | y    | query  | `query.idx` |

pub mod alignment;
pub mod config;
pub mod contig;
pub mod error;
pub mod index;
pub mod types;
