//! Download command - mirror one or more package trees.

use std::path::PathBuf;

use npmsync::{parse_package_string, DownloadReport, Downloader, DownloaderConfig, EventBus};
use tracing::info;

use crate::error::CliError;
use crate::output;

/// Arguments for the download command.
pub struct DownloadArgs {
    pub packages: Vec<String>,
    pub registry: String,
    pub concurrency: usize,
    pub max_attempts: usize,
    pub output: String,
}

/// Runs the download command, returning the merged report across all
/// requested roots.
///
/// Roots run sequentially; one root's failures never stop the next, and
/// the shared output directory deduplicates overlapping trees through
/// the skip check.
pub async fn run(args: DownloadArgs) -> Result<DownloadReport, CliError> {
    info!(
        roots = args.packages.len(),
        registry = %args.registry,
        concurrency = args.concurrency,
        output = %args.output,
        "Starting download command"
    );

    let (events, rx) = EventBus::channel();
    let printer = tokio::spawn(output::print_events(rx));

    let downloader = Downloader::new(
        DownloaderConfig {
            registry: args.registry,
            output_root: PathBuf::from(args.output),
            concurrency: args.concurrency,
            max_attempts: args.max_attempts,
        },
        events,
    )?;

    let mut report = DownloadReport::default();
    for raw in &args.packages {
        let spec = parse_package_string(raw);
        report.merge(downloader.run(&spec).await);
    }

    // Dropping the engine closes the event channel and ends the printer.
    drop(downloader);
    let _ = printer.await;

    output::print_summary(&report);
    Ok(report)
}
