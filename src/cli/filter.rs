//! Filter command - drop too-small contigs from an index.

use std::collections::HashSet;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::core::types::Side;
use crate::parsing::fasta::filter_fasta;
use crate::plot::generation::JobLayout;
use crate::prepare::filter::apply_filter;

#[derive(Args)]
pub struct FilterArgs {
    /// Index to filter in place (defaults to the job's index of --side)
    #[arg(required_unless_present = "job")]
    pub index: Option<PathBuf>,

    /// Job directory: picks the index and side file, and records a forced reorder
    #[arg(long)]
    pub job: Option<PathBuf>,

    /// Which genome the index describes
    #[arg(long, default_value = "query")]
    pub side: Side,

    /// The index holds split pieces; decide on the original contigs
    #[arg(long)]
    pub split: bool,

    /// Do not filter unless more than this many contigs would be removed
    #[arg(long)]
    pub min_filtered: Option<usize>,

    /// Where to list removed contigs (defaults next to the index)
    #[arg(long)]
    pub removed: Option<PathBuf>,

    /// FASTA file to rewrite without the removed contigs
    #[arg(long, requires = "fasta_out")]
    pub fasta: Option<PathBuf>,

    /// Filtered FASTA to write
    #[arg(long, requires = "fasta")]
    pub fasta_out: Option<PathBuf>,
}

#[derive(Serialize)]
struct FilterReport<'a> {
    side: Side,
    removed: &'a [String],
    abstained: bool,
    forced_reorder: bool,
    already_filtered: bool,
}

/// Execute the filter command
///
/// # Errors
///
/// Returns an error if the index cannot be loaded or outputs cannot be written.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: FilterArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let layout = args.job.as_ref().map(JobLayout::new);
    let index = match (&args.index, &layout) {
        (Some(index), _) => index.clone(),
        (None, Some(layout)) => match args.side {
            Side::Query => layout.query_index(),
            Side::Target => layout.target_index(),
        },
        (None, None) => anyhow::bail!("an index or --job is required"),
    };
    let removed_list = match (&args.removed, &layout) {
        (Some(path), _) => path.clone(),
        (None, Some(layout)) => layout.filtered_contigs(args.side),
        (None, None) => index.with_extension("filtered.txt"),
    };

    let mut filter_config = config.filter.clone();
    if let Some(min) = args.min_filtered {
        filter_config.min_filtered = min;
    }

    let outcome = apply_filter(&index, &removed_list, &filter_config, args.side, args.split)?;

    if outcome.forced_reorder {
        if let Some(layout) = &layout {
            std::fs::write(layout.reorder_marker(), "")?;
        }
    }

    if let (Some(input), Some(output)) = (&args.fasta, &args.fasta_out) {
        let removed: HashSet<String> = outcome.removed.iter().cloned().collect();
        let kept = filter_fasta(input, output, &removed)?;
        tracing::info!("Wrote {} records to {}", kept, output.display());
    }

    let report = FilterReport {
        side: args.side,
        removed: &outcome.removed,
        abstained: outcome.abstained,
        forced_reorder: outcome.forced_reorder,
        already_filtered: outcome.already_filtered,
    };
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => {
            for name in &outcome.removed {
                println!("{}\t{}", args.side, name);
            }
        }
        OutputFormat::Text => {
            if outcome.already_filtered {
                println!(
                    "{} was already filtered ({} contigs listed in {})",
                    index.display(),
                    outcome.removed.len(),
                    removed_list.display()
                );
            } else if outcome.abstained {
                println!("No contigs filtered from {} (too few candidates)", index.display());
            } else {
                println!(
                    "Filtered {} contigs from {} (listed in {})",
                    outcome.removed.len(),
                    index.display(),
                    removed_list.display()
                );
            }
            if outcome.forced_reorder {
                println!("Query assembly is fragmented: contigs will be reordered before plotting");
            }
        }
    }
    Ok(())
}
