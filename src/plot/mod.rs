//! Alignment geometry: from PAF records and two indices to a dotplot.
//!
//! - [`generation`]: job file layout and the raw/sorted generations
//! - [`assembler`]: global coordinates and identity classes
//! - [`reorder`]: gravity ordering and orientation correction ("sort")
//! - [`noise`]: optional declutter pass over rendered records
//! - [`layout`]: axis blocks and the JSON plot document
//! - [`report`]: query/target associations

pub mod assembler;
pub mod generation;
pub mod layout;
pub mod noise;
pub mod reorder;
pub mod report;

pub use assembler::{Assembler, ParsedAlignment};
pub use generation::{Artifacts, Generation, JobLayout};
pub use layout::{PlotData, PlotOptions};
