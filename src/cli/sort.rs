//! Sort, unsort and reverse commands - manage the sorted generation of a job.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::plot::generation::JobLayout;
use crate::plot::reorder::{reverse_contig, sort_job, unsort_job};

#[derive(Args)]
pub struct JobArgs {
    /// Job directory holding map.paf, query.idx and target.idx
    #[arg(long, required = true)]
    pub job: PathBuf,
}

#[derive(Args)]
pub struct SortArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Record the sort as forced (fragmented query assembly)
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ReverseArgs {
    #[command(flatten)]
    pub job: JobArgs,

    /// Query contig to reverse
    #[arg(required = true)]
    pub contig: String,
}

/// Execute the sort command
///
/// # Errors
///
/// Returns an error if the job files are missing or malformed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: SortArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let layout = JobLayout::new(&args.job.job);
    let outcome = sort_job(&layout, &config.plot, args.force)?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "order": outcome.order,
            "reoriented": outcome.reoriented,
            "forced": outcome.forced,
            "records": outcome.records,
        }))?,
        OutputFormat::Tsv => {
            let reoriented: std::collections::HashSet<&str> =
                outcome.reoriented.iter().map(String::as_str).collect();
            for name in &outcome.order {
                let flag = u8::from(reoriented.contains(name.as_str()));
                println!("{name}\t{flag}");
            }
        }
        OutputFormat::Text => {
            println!(
                "Sorted {} query contigs, reoriented {}",
                outcome.order.len(),
                outcome.reoriented.len()
            );
            for name in &outcome.reoriented {
                println!("  reversed: {name}");
            }
        }
    }
    Ok(())
}

/// Execute the unsort command
///
/// # Errors
///
/// Returns an error if the sorted files cannot be removed.
#[allow(clippy::needless_pass_by_value)]
pub fn run_unsort(args: JobArgs, format: OutputFormat, _config: &EngineConfig) -> anyhow::Result<()> {
    let removed = unsort_job(&JobLayout::new(&args.job))?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "removed": removed }))?,
        OutputFormat::Tsv => println!("{removed}"),
        OutputFormat::Text => {
            if removed {
                println!("Restored the original contig order");
            } else {
                println!("Job was not sorted");
            }
        }
    }
    Ok(())
}

/// Execute the reverse command
///
/// # Errors
///
/// Returns an error if the contig is unknown or the job files are unusable.
#[allow(clippy::needless_pass_by_value)]
pub fn run_reverse(args: ReverseArgs, format: OutputFormat, _config: &EngineConfig) -> anyhow::Result<()> {
    let reversed = reverse_contig(&JobLayout::new(&args.job.job), &args.contig)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "contig": args.contig,
            "reversed": reversed,
        }))?,
        OutputFormat::Tsv => println!("{}\t{}", args.contig, u8::from(reversed)),
        OutputFormat::Text => println!(
            "{} is now {}",
            args.contig,
            if reversed { "reversed" } else { "forward" }
        ),
    }
    Ok(())
}
