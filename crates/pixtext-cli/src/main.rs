#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod batch;
mod config;
mod report;
mod shutdown;
mod telemetry;

use std::process;

use anyhow::Context;
use pixtext_azure::AzureClient;
use pixtext_worker::AnalyzeWorker;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;
use crate::report::Report;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "pixtext_cli::startup";
pub const TRACING_TARGET_SHUTDOWN: &str = "pixtext_cli::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "pixtext_cli::config";
pub const TRACING_TARGET_INPUT: &str = "pixtext_cli::input";

#[tokio::main]
async fn main() {
    let error = match run().await {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(error) => error,
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
///
/// Returns whether every image produced text.
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::init();

    telemetry::init_tracing()?;
    log_startup_info();
    cli.log_config();

    let client =
        AzureClient::new(cli.azure.clone()).context("failed to create image analysis client")?;

    let cancel_token = CancellationToken::new();
    let worker = AnalyzeWorker::new(
        client.clone().into_shared(),
        client.request_builder().clone(),
        &cli.worker,
        cancel_token.clone(),
    );

    let signal_task = tokio::spawn(shutdown::cancel_on_signal(cancel_token.clone()));

    let batch = batch::analyze_files(&worker, &cli.images).await;

    let report = Report {
        trim: cli.trim,
        show_names: cli.images.len() > 1,
    };
    for (path, outcome) in batch.results() {
        report.render(path, outcome).emit();
    }

    // Stops the signal listener once every job has reported.
    cancel_token.cancel();
    if let Err(error) = signal_task.await {
        tracing::debug!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "Signal listener ended abnormally"
        );
    }

    let all_text = batch.all_text();
    tracing::info!(
        target: TRACING_TARGET_SHUTDOWN,
        images = cli.images.len(),
        all_text,
        "analysis finished"
    );

    Ok(all_text)
}

/// Logs startup information.
fn log_startup_info() {
    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting pixtext"
    );

    tracing::debug!(
        target: TRACING_TARGET_STARTUP,
        pid = process::id(),
        arch = std::env::consts::ARCH,
        os = std::env::consts::OS,
        features = ?enabled_features(),
        "build information"
    );
}

/// Returns a list of enabled compile-time features.
fn enabled_features() -> Vec<&'static str> {
    [cfg!(feature = "dotenv").then_some("dotenv")]
        .into_iter()
        .flatten()
        .collect()
}
