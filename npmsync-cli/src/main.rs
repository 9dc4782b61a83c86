//! npmsync CLI - mirror npm packages and their dependency trees.
//!
//! This binary wires the library's download engine to the terminal:
//! clap argument parsing, tracing output controlled by `RUST_LOG`, and
//! colored per-event lines driven by the library's event stream.

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Download npm packages and their full dependency trees.
#[derive(Debug, Parser)]
#[command(name = "npmsync", version, about)]
struct Cli {
    /// Package specs to mirror, e.g. `express` or `react@^18.0.0`
    #[arg(required = true)]
    packages: Vec<String>,

    /// Registry base URL
    #[arg(short, long, default_value = npmsync::DEFAULT_REGISTRY)]
    registry: String,

    /// Maximum concurrent registry requests and downloads
    #[arg(short, long, default_value_t = npmsync::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Attempts per package before giving up
    #[arg(long, default_value_t = npmsync::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: usize,

    /// Directory tarballs are written under
    #[arg(short, long, default_value = npmsync::DEFAULT_OUTPUT_ROOT)]
    output: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::download::run(commands::download::DownloadArgs {
        packages: cli.packages,
        registry: cli.registry,
        concurrency: cli.concurrency,
        max_attempts: cli.max_attempts,
        output: cli.output,
    })
    .await
    {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
