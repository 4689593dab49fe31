//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── azure: AzureConfig    # Endpoint, subscription key, query options, HTTP
//! ├── worker: WorkerConfig  # Concurrency limit
//! ├── trim                  # Output formatting
//! └── images                # Files to analyze
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//!
//! # Example
//!
//! ```bash
//! pixtext --endpoint "https://<resource>.cognitiveservices.azure.com/computervision/imageanalysis:analyze" \
//!     --subscription-key "$KEY" receipt.jpg
//!
//! # Or via environment variables
//! PIXTEXT_ENDPOINT="https://..." PIXTEXT_SUBSCRIPTION_KEY="..." pixtext receipt.jpg
//! ```

use std::path::PathBuf;

use clap::Parser;
use pixtext_azure::AzureConfig;
use pixtext_worker::WorkerConfig;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "pixtext")]
#[command(about = "Extract printed text from images with Azure AI Vision")]
#[command(version)]
pub struct Cli {
    /// Image analysis endpoint and HTTP client configuration.
    #[clap(flatten)]
    pub azure: AzureConfig,

    /// Background worker configuration.
    #[clap(flatten)]
    pub worker: WorkerConfig,

    /// Print text without the trailing separator after the last line.
    #[arg(long)]
    #[serde(default)]
    pub trim: bool,

    /// Image files to analyze.
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that values
    /// from it act as environment defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs the effective configuration. The subscription key is never logged.
    pub fn log_config(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            endpoint = %self.azure.endpoint,
            api_version = %self.azure.api_version,
            model_version = %self.azure.model_version,
            language = %self.azure.language,
            http_timeout_secs = self.azure.http_timeout,
            max_concurrent_jobs = self.worker.max_concurrent_jobs,
            images = self.images.len(),
            "analysis configuration"
        );
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    const ENDPOINT: &str =
        "https://ocr.cognitiveservices.azure.com/computervision/imageanalysis:analyze";

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_arguments() {
        let cli = Cli::try_parse_from([
            "pixtext",
            "--endpoint",
            ENDPOINT,
            "--subscription-key",
            "secret",
            "--language",
            "de",
            "--max-concurrent-jobs",
            "2",
            "--trim",
            "a.jpg",
            "b.jpg",
        ])
        .unwrap();

        assert_eq!(cli.azure.endpoint.as_str(), ENDPOINT);
        assert_eq!(cli.azure.subscription_key.expose(), "secret");
        assert_eq!(cli.azure.language, "de");
        assert_eq!(cli.azure.api_version, "2024-02-01");
        assert_eq!(cli.worker.max_concurrent_jobs, 2);
        assert!(cli.trim);
        assert_eq!(cli.images, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
    }

    #[test]
    fn test_requires_an_image() {
        let result = Cli::try_parse_from([
            "pixtext",
            "--endpoint",
            ENDPOINT,
            "--subscription-key",
            "secret",
        ]);
        assert!(result.is_err());
    }
}
