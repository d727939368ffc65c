//! Merge-splits command - map alignments against split pieces back onto the
//! original contigs.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::prepare::merge::merge_splits;

#[derive(Args)]
pub struct MergeArgs {
    /// Alignment file produced against the split query
    #[arg(required = true)]
    pub alignment: PathBuf,

    /// Index of the split query
    #[arg(long)]
    pub index: PathBuf,

    /// Merged alignment file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Merged query index to write
    #[arg(long)]
    pub index_out: PathBuf,
}

/// Execute the merge-splits command
///
/// # Errors
///
/// Returns an error if an input is missing or malformed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: MergeArgs, format: OutputFormat, _config: &EngineConfig) -> anyhow::Result<()> {
    let summary = merge_splits(&args.alignment, &args.index, &args.output, &args.index_out)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "records": summary.records,
            "rewritten": summary.rewritten,
            "contigs": summary.contigs,
        }))?,
        OutputFormat::Tsv => {
            println!("records\trewritten\tcontigs");
            println!("{}\t{}\t{}", summary.records, summary.rewritten, summary.contigs);
        }
        OutputFormat::Text => println!(
            "Merged {} of {} records onto {} query contigs",
            summary.rewritten, summary.records, summary.contigs
        ),
    }
    Ok(())
}
