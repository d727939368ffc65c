//! Index command - list the contigs of a FASTA file.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::{print_json, OutputFormat};
use crate::core::config::EngineConfig;
use crate::parsing::fasta::{index_fasta, is_fasta_file};

#[derive(Args)]
pub struct IndexArgs {
    /// FASTA file, optionally gzipped
    #[arg(required = true)]
    pub fasta: PathBuf,

    /// Index file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Sample name shown on the plot axis (defaults to the file stem)
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(Serialize)]
struct IndexReport<'a> {
    sample_name: &'a str,
    contigs: usize,
    total_length: u64,
    output: &'a PathBuf,
}

/// Execute the index command
///
/// # Errors
///
/// Returns an error if the FASTA cannot be read or holds an empty contig.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: IndexArgs, format: OutputFormat, _config: &EngineConfig) -> anyhow::Result<()> {
    if !is_fasta_file(&args.fasta) {
        tracing::warn!(
            "{} does not have a FASTA extension, reading it as FASTA anyway",
            args.fasta.display()
        );
    }
    let name = args.name.clone().unwrap_or_else(|| sample_name(&args.fasta));
    let index = index_fasta(&args.fasta, &name)?;
    index.save(&args.output)?;

    let report = IndexReport {
        sample_name: &index.sample_name,
        contigs: index.len(),
        total_length: index.total_length(),
        output: &args.output,
    };
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text | OutputFormat::Tsv => println!(
            "Indexed {} contigs ({} bp) of {} into {}",
            report.contigs,
            report.total_length,
            report.sample_name,
            args.output.display()
        ),
    }
    Ok(())
}

/// File name without FASTA and compression extensions
pub fn sample_name(path: &std::path::Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = file.as_str();
    for ext in [".gz", ".fasta", ".fna", ".fa"] {
        if let Some(stripped) = name.strip_suffix(ext) {
            name = stripped;
        }
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_name() {
        assert_eq!(sample_name(std::path::Path::new("/data/Ecoli_K12.fa.gz")), "Ecoli_K12");
        assert_eq!(sample_name(std::path::Path::new("genome.fasta")), "genome");
        assert_eq!(sample_name(std::path::Path::new("reads.txt")), "reads.txt");
    }
}
