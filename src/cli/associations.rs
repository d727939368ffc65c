//! Associations command - which target contig each query contig maps to.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::core::types::Side;
use crate::plot::assembler::Assembler;
use crate::plot::generation::{Generation, JobLayout};
use crate::plot::report::{associations, unmatched};

#[derive(Args)]
pub struct AssociationsArgs {
    /// Job directory holding map.paf, query.idx and target.idx
    #[arg(long, required = true)]
    pub job: PathBuf,

    /// List contigs without any match on each side instead
    #[arg(long)]
    pub unmatched: bool,
}

/// Execute the associations command
///
/// # Errors
///
/// Returns an error if the job files are missing or malformed.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: AssociationsArgs, format: OutputFormat, config: &EngineConfig) -> anyhow::Result<()> {
    let layout = JobLayout::new(&args.job);
    let generation = Generation::discover(&layout);
    let live = generation.live();
    let parsed = Assembler::new(config.plot.clone()).parse_all(
        &live.alignment,
        &live.query_index,
        &layout.target_index(),
    )?;

    if args.unmatched {
        let query = unmatched(&parsed, Side::Query);
        let target = unmatched(&parsed, Side::Target);
        match format {
            OutputFormat::Json => print_json(&serde_json::json!({
                "query": query,
                "target": target,
            }))?,
            OutputFormat::Text | OutputFormat::Tsv => {
                for name in &query {
                    println!("{}\t{}", Side::Query, name);
                }
                for name in &target {
                    println!("{}\t{}", Side::Target, name);
                }
            }
        }
        return Ok(());
    }

    let report = associations(&parsed);
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text | OutputFormat::Tsv => {
            println!("#query\ttarget\tstrand\tmatched_bases");
            for a in &report {
                println!(
                    "{}\t{}\t{}\t{}",
                    a.query,
                    a.target.as_deref().unwrap_or("-"),
                    a.strand.map_or_else(|| "-".to_string(), |s| s.to_string()),
                    a.matched_bases
                );
            }
        }
    }
    Ok(())
}
