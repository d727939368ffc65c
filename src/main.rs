use clap::Parser;
use tracing_subscriber::EnvFilter;

use contig_dotplot::cli::{self, OutputFormat};
use contig_dotplot::Error;

fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("contig_dotplot=debug,info")
    } else {
        EnvFilter::new("contig_dotplot=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let format = cli.format;
    if let Err(err) = cli::dispatch(cli) {
        report(&err, format);
        std::process::exit(1);
    }
}

/// Print a failure as a (kind, message) pair on stderr
fn report(err: &anyhow::Error, format: OutputFormat) {
    let structured = err.downcast_ref::<Error>().map(Error::report);
    match (format, structured) {
        (OutputFormat::Json, Some(report)) => match serde_json::to_string(&report) {
            Ok(json) => eprintln!("{json}"),
            Err(_) => eprintln!("Error: {err:#}"),
        },
        (_, Some(report)) => eprintln!("Error ({:?}): {}", report.kind, report.message),
        (_, None) => eprintln!("Error: {err:#}"),
    }
}
