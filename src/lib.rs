//! # contig-dotplot
//!
//! A library for turning whole-genome alignments into dotplot geometry.
//!
//! Two assemblies are compared by aligning a *query* against a *target*
//! with an external aligner. This crate handles everything around that
//! alignment: it prepares the inputs, places every alignment record on two
//! global axes (target on x, query on y), and derives the views and
//! statistics a dotplot viewer needs.
//!
//! ## Features
//!
//! - **Contig splitting**: Cuts very large contigs into bounded pieces and
//!   maps alignments back onto the original coordinates afterwards
//! - **Contig filtering**: Drops contigs too small to matter (N95 rule)
//! - **Global coordinates**: Offsets every contig along its sample's axis
//! - **Identity classes**: Buckets matches by identity for coloring
//! - **Sorting**: Orders query contigs along the target and fixes their
//!   orientation, without touching the original files
//! - **Coverage summary**: Share of the target covered by each class
//!
//! ## Example
//!
//! ```rust,no_run
//! use contig_dotplot::{Assembler, JobLayout, PlotConfig};
//! use contig_dotplot::summary::compute_summary;
//!
//! let layout = JobLayout::new("job");
//! let parsed = Assembler::new(PlotConfig::default())
//!     .parse(&layout.alignment(), &layout.query_index(), &layout.target_index())
//!     .unwrap();
//!
//! for (class, percent) in compute_summary(&parsed).iter() {
//!     println!("{class}: {percent:.1}%");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Contigs, indices, alignment records, configuration, errors
//! - [`parsing`]: Index, PAF and FASTA files
//! - [`prepare`]: Splitting, merging and filtering around the aligner
//! - [`plot`]: Global coordinates, sorting and the plot document
//! - [`summary`]: Identity coverage of the target axis
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod parsing;
pub mod plot;
pub mod prepare;
pub mod summary;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::alignment::{AlignmentRecord, ClassifiedRecord};
pub use core::config::{EngineConfig, PlotConfig};
pub use core::contig::{Contig, SplitContigId};
pub use core::error::{Error, ErrorKind, ErrorReport, Result};
pub use core::index::SequenceIndex;
pub use core::types::*;
pub use plot::{Assembler, Generation, JobLayout, ParsedAlignment, PlotData};
pub use summary::Summary;
