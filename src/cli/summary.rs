//! Summary command - how much of the target each identity class covers.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::plot::generation::JobLayout;
use crate::summary::engine::UNCOVERED_KEY;
use crate::summary::{job_store, summarize_job};

#[derive(Args)]
pub struct SummaryArgs {
    /// Job directory holding map.paf, query.idx and target.idx
    #[arg(long, required = true)]
    pub job: PathBuf,

    /// Only report whether the summary exists, is running or failed
    #[arg(long)]
    pub status: bool,

    /// Remove stale pending or failure markers before computing
    #[arg(long)]
    pub reset: bool,
}

/// Execute the summary command
///
/// # Errors
///
/// Returns an error if the summary cannot be computed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SummaryArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let layout = JobLayout::new(&args.job);
    let store = job_store(&layout, config);

    if args.status {
        let status = store.status();
        match format {
            OutputFormat::Json => print_json(&serde_json::json!({ "status": status }))?,
            OutputFormat::Text | OutputFormat::Tsv => println!("{status}"),
        }
        return Ok(());
    }

    if args.reset {
        store.clear_markers()?;
    }
    let summary = summarize_job(&layout, config)?;

    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Tsv => {
            for (class, percent) in summary.iter() {
                println!("{class}\t{percent:.4}");
            }
        }
        OutputFormat::Text => {
            println!("Target coverage by identity class");
            for (class, percent) in summary.iter() {
                let label = if class == UNCOVERED_KEY {
                    "uncovered".to_string()
                } else {
                    format!("class {class}")
                };
                println!("  {label:<10} {percent:>7.2}%");
            }
        }
    }
    Ok(())
}
