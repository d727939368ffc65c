//! Readers and writers for the engine's file formats.
//!
//! - **Sequence index** (`.idx`): sample name followed by `name\tlength\treversed` lines
//! - **Alignment file** (`.paf`): PAF-like, at least twelve tab-separated columns
//! - **FASTA**: raw sequences, indexed, split or filtered
//!
//! ## Example
//!
//! ```rust,no_run
//! use contig_dotplot::core::types::Side;
//! use contig_dotplot::parsing::{index::read_index_file, paf::read_alignment_file};
//! use std::path::Path;
//!
//! let target = read_index_file(Path::new("job/target.idx"), Side::Target).unwrap();
//! let records = read_alignment_file(Path::new("job/map.paf")).unwrap();
//! println!("{} contigs, {} records", target.len(), records.len());
//! ```

pub mod fasta;
pub mod index;
pub mod paf;
