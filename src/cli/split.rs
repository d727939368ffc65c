//! Split command - cut oversized contigs before alignment.

use std::path::PathBuf;

use clap::Args;

use crate::cli::index::sample_name;
use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::prepare::split::split_fasta;

#[derive(Args)]
pub struct SplitArgs {
    /// FASTA file to split, optionally gzipped
    #[arg(required = true)]
    pub fasta: PathBuf,

    /// Split FASTA to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Index of the split FASTA to write
    #[arg(long)]
    pub index: PathBuf,

    /// Target piece size in bases (overrides the configuration)
    #[arg(long)]
    pub size: Option<u64>,

    /// Sample name shown on the plot axis (defaults to the file stem)
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Execute the split command
///
/// # Errors
///
/// Returns an error if the FASTA cannot be read or an output cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SplitArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let mut split_config = config.split.clone();
    if let Some(size) = args.size {
        anyhow::ensure!(size > 0, "--size must be positive");
        split_config.split_size = size;
    }
    let name = args.name.clone().unwrap_or_else(|| sample_name(&args.fasta));

    let summary = split_fasta(&args.fasta, &args.output, &args.index, &name, &split_config)?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "contigs": summary.contigs,
            "split_contigs": summary.split_contigs,
            "pieces": summary.pieces,
            "split_size": split_config.split_size,
        }))?,
        OutputFormat::Tsv => {
            println!("contigs\tsplit_contigs\tpieces");
            println!(
                "{}\t{}\t{}",
                summary.contigs, summary.split_contigs, summary.pieces
            );
        }
        OutputFormat::Text => println!(
            "Split {} of {} contigs into {} pieces of at most ~{} bp",
            summary.split_contigs, summary.contigs, summary.pieces, split_config.split_size
        ),
    }
    Ok(())
}
