//! Command-line interface for contig-dotplot.
//!
//! Available commands:
//!
//! - **index**: Build a sequence index from a FASTA file
//! - **split**: Cut oversized contigs into bounded pieces before alignment
//! - **merge-splits**: Map alignments against pieces back onto the originals
//! - **filter**: Drop too-small contigs from an index (and FASTA)
//! - **plot**: Write the dotplot JSON document of a job
//! - **sort** / **unsort**: Reorder and reorient query contigs, or undo it
//! - **reverse**: Reverse a single query contig
//! - **summary**: Target coverage per identity class
//! - **associations**: Best target contig of every query contig
//!
//! ## Usage
//!
//! ```text
//! # Index both genomes
//! contig-dotplot index target.fa -o job/target.idx --name "Reference"
//! contig-dotplot index query.fa -o job/query.idx
//!
//! # After aligning query against target into job/map.paf
//! contig-dotplot sort --job job
//! contig-dotplot plot --job job --denoise
//! contig-dotplot summary --job job --format json
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::core::config::EngineConfig;
use crate::core::error::Error;

pub mod associations;
pub mod filter;
pub mod index;
pub mod merge;
pub mod plot;
pub mod sort;
pub mod split;
pub mod summary;

#[derive(Parser)]
#[command(name = "contig-dotplot")]
#[command(version)]
#[command(about = "Prepare and lay out genome-vs-genome alignment dotplots")]
#[command(
    long_about = "contig-dotplot turns the PAF output of a whole-genome aligner into dotplot geometry.\n\nIt prepares assemblies for alignment (splitting large contigs, dropping tiny ones), places alignments on global axes, reorders and reorients query contigs along the target, and summarizes how much of the target each identity class covers."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// JSON configuration file; missing fields take default values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Index the contigs of a FASTA file
    Index(index::IndexArgs),

    /// Split oversized contigs of a FASTA file
    Split(split::SplitArgs),

    /// Rewrite alignments against split pieces onto the original contigs
    MergeSplits(merge::MergeArgs),

    /// Remove too-small contigs from an index
    Filter(filter::FilterArgs),

    /// Write the dotplot of a job
    Plot(plot::PlotArgs),

    /// Reorder and reorient the query contigs of a job
    Sort(sort::SortArgs),

    /// Discard the sorted generation of a job
    Unsort(sort::JobArgs),

    /// Reverse one query contig
    Reverse(sort::ReverseArgs),

    /// Coverage of the target per identity class
    Summary(summary::SummaryArgs),

    /// Best target contig of every query contig
    Associations(associations::AssociationsArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Load the configuration given on the command line, or the defaults
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds invalid values.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig, Error> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => Ok(EngineConfig::default()),
    }
}

/// Print a serializable value as pretty JSON on stdout
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run one parsed command line
///
/// # Errors
///
/// Returns the error of the command.
pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let format = cli.format;
    match cli.command {
        Commands::Index(args) => index::run(args, format, &config),
        Commands::Split(args) => split::run(args, format, &config),
        Commands::MergeSplits(args) => merge::run(args, format, &config),
        Commands::Filter(args) => filter::run(args, format, &config),
        Commands::Plot(args) => plot::run(args, format, &config),
        Commands::Sort(args) => sort::run(args, format, &config),
        Commands::Unsort(args) => sort::run_unsort(args, format, &config),
        Commands::Reverse(args) => sort::run_reverse(args, format, &config),
        Commands::Summary(args) => summary::run(args, format, &config),
        Commands::Associations(args) => associations::run(args, format, &config),
    }
}
