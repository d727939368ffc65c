//! Plot command - write the dotplot document of a job.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::plot::assembler::Assembler;
use crate::plot::generation::{Generation, JobLayout};
use crate::plot::layout::{PlotData, PlotOptions};
use crate::plot::reorder::apply_forced_reorder;

#[derive(Args)]
pub struct PlotArgs {
    /// Job directory holding map.paf, query.idx and target.idx
    #[arg(long, required = true)]
    pub job: PathBuf,

    /// Hide short noise matches
    #[arg(long)]
    pub denoise: bool,

    /// Draw every contig, even tiny ones
    #[arg(long)]
    pub no_mix: bool,

    /// Maximum number of records to draw (overrides the configuration)
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Output file (defaults to plot.json in the job directory)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PlotReport<'a> {
    output: &'a PathBuf,
    records: usize,
    record_count: usize,
    sampled: bool,
    sorted: bool,
    forced_reorder: bool,
}

/// Execute the plot command
///
/// # Errors
///
/// Returns an error if the job files are missing or malformed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: PlotArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let layout = JobLayout::new(&args.job);
    let mut plot_config = config.plot.clone();
    if let Some(max) = args.max_records {
        anyhow::ensure!(max > 0, "--max-records must be positive");
        plot_config.max_records = max;
    }

    let forced_reorder = apply_forced_reorder(&layout, &plot_config)?.is_some();
    let generation = Generation::discover(&layout);
    let live = generation.live();
    let parsed = Assembler::new(plot_config.clone()).parse(
        &live.alignment,
        &live.query_index,
        &layout.target_index(),
    )?;

    let options = PlotOptions {
        denoise: args.denoise,
        mix: !args.no_mix,
    };
    let data = PlotData::build(
        &parsed,
        &plot_config,
        options,
        generation.is_sorted(),
        forced_reorder,
    );
    let output = args.output.clone().unwrap_or_else(|| layout.plot());
    data.save(&output)?;

    let report = PlotReport {
        output: &output,
        records: data.record_count(),
        record_count: parsed.record_count,
        sampled: data.sampled,
        sorted: data.sorted,
        forced_reorder,
    };
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Tsv => {
            println!("output\trecords\trecord_count\tsampled\tsorted\tforced_reorder");
            println!(
                "{}\t{}\t{}\t{}\t{}\t{}",
                output.display(),
                report.records,
                report.record_count,
                report.sampled,
                report.sorted,
                report.forced_reorder
            );
        }
        OutputFormat::Text => {
            println!(
                "Wrote {} of {} records to {}",
                report.records,
                report.record_count,
                output.display()
            );
            if report.sampled {
                println!(
                    "Only the first {} records were kept",
                    plot_config.max_records
                );
            }
            if forced_reorder {
                println!("Query contigs were reordered first (fragmented assembly)");
            }
        }
    }
    Ok(())
}
