//! Command-line front end for the iiif-dl library.
//!
//! Fetches a IIIF manifest, resolves its images and downloads them
//! sequentially into the output directory, with a per-image progress bar.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use iiif_dl::{Config, FailurePolicy, IiifDownloader, ProgressCallback, ProgressFactory};

#[derive(Debug, Parser)]
#[command(name = "iiif-dl", version)]
#[command(about = "Download images from a IIIF manifest (v2 or v3)")]
struct Cli {
    /// URL of the IIIF manifest
    #[arg(short, long)]
    manifest: String,

    /// Output directory for the images
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Abort the whole run on the first image that fails permanently
    /// (default: record the failure and continue)
    #[arg(long, default_value_t = false)]
    abort_on_failure: bool,

    /// Enable debug log output
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug { "iiif_dl=debug,info" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let mut config = Config::default();
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.abort_on_failure {
        config.failure_policy = FailurePolicy::Abort;
    }

    let downloader = IiifDownloader::new(config)
        .context("failed to initialize downloader")?
        .with_progress(progress_bars());

    let report = downloader
        .run(&cli.manifest)
        .await
        .context("download run aborted")?;

    println!(
        "Done: {} downloaded, {} skipped, {} failed",
        report.downloaded,
        report.skipped,
        report.failed.len()
    );
    for failure in &report.failed {
        eprintln!(
            "failed after {} attempts: {} ({}): {}",
            failure.attempts, failure.filename, failure.url, failure.error
        );
    }

    if !report.is_complete() {
        std::process::exit(1);
    }
    Ok(())
}

/// One byte-scaled progress bar per image, labeled with the filename
fn progress_bars() -> ProgressFactory {
    let style = ProgressStyle::with_template(
        "{msg:20!} {bytes}/{total_bytes} [{bar:40.cyan/blue}] {bytes_per_sec}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());

    Arc::new(move |reference| {
        let bar = ProgressBar::new(0)
            .with_style(style.clone())
            .with_message(reference.filename.clone());
        let callback: ProgressCallback = Arc::new(move |done, total| {
            if let Some(total) = total {
                bar.set_length(total);
            }
            bar.set_position(done);
            if total == Some(done) {
                bar.finish();
            }
        });
        callback
    })
}
