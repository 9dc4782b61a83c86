//! Colored console rendering of library events.
//!
//! One line per lifecycle event: magenta for metadata, yellow for skips,
//! dim for transfer starts, green for finishes, red for every failure.
//! Byte-level progress events are intentionally not printed.

use console::style;
use npmsync::{DownloadReport, Event};
use tokio::sync::mpsc;

/// Drains the event stream, printing one line per event.
///
/// Runs until the sending side is dropped, so it is typically spawned
/// and joined after the engine finishes.
pub async fn print_events(mut rx: mpsc::UnboundedReceiver<Event>) {
    while let Some(event) = rx.recv().await {
        render(&event);
    }
}

fn render(event: &Event) {
    match event {
        Event::FetchingMetadata { spec } => {
            println!("{}", style(format!("Fetching metadata for {}", spec)).magenta());
        }
        Event::MetadataResolved { spec, packages } => {
            println!(
                "{}",
                style(format!("{} resolved to {} package(s)", spec, packages)).magenta()
            );
        }
        Event::ResolutionFailed { spec, error } => {
            println!(
                "{}",
                style(format!("Failed to resolve {}: {}", spec, error)).red()
            );
        }
        Event::Skipped { package } => {
            println!(
                "{}",
                style(format!("Skipping {} (already downloaded)", package)).yellow()
            );
        }
        Event::TransferStarted { package, .. } => {
            println!("{}", style(format!("Downloading {}", package)).dim());
        }
        Event::TransferProgress { .. } => {}
        // The retry layer reports the same failure with attempt context.
        Event::TransferFailed { .. } => {}
        Event::TransferFinished {
            package,
            destination,
        } => {
            println!(
                "{}",
                style(format!("Downloaded {} to {}", package, destination.display())).green()
            );
        }
        Event::AttemptFailed {
            package,
            attempt,
            max_attempts,
            error,
        } => {
            println!(
                "{}",
                style(format!(
                    "Attempt {}/{} failed for {}: {}",
                    attempt, max_attempts, package, error
                ))
                .red()
            );
        }
        Event::PackageFailed { package, error } => {
            println!("{}", style(format!("Giving up on {}: {}", package, error)).red());
        }
        Event::Finished { spec } => {
            println!("{}", style(format!("Finished {}", spec)).magenta());
        }
    }
}

/// Prints the aggregate summary for a whole invocation.
pub fn print_summary(report: &DownloadReport) {
    println!();
    println!(
        "{} downloaded, {} skipped, {} failed",
        style(report.downloaded.len()).green(),
        style(report.skipped.len()).yellow(),
        if report.failed.is_empty() {
            style(0).green()
        } else {
            style(report.failed.len()).red()
        }
    );
    for failure in &report.failed {
        println!("  {} {}", style("failed:").red(), failure.id);
    }
}
