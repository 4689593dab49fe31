//! Log output for the command-line tool.
//!
//! Logs are written to stderr; stdout is reserved for recognized text so the
//! output can be piped. Colors are used only when stderr is a terminal.
//!
//! ```bash
//! RUST_LOG=debug pixtext receipt.jpg
//! RUST_LOG=pixtext_core=trace,pixtext_azure=debug pixtext receipt.jpg
//! ```

use std::io::IsTerminal;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter applied when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "info";

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if `RUST_LOG` cannot be parsed or a subscriber is
/// already installed.
pub(crate) fn init_tracing() -> anyhow::Result<()> {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing")
}

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVES`].
fn env_filter(directives: Option<&str>) -> anyhow::Result<EnvFilter> {
    let directives = directives
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DIRECTIVES);

    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid log filter '{directives}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        let filter = env_filter(None).unwrap();
        assert_eq!(filter.to_string(), "info");

        let filter = env_filter(Some("  ")).unwrap();
        assert_eq!(filter.to_string(), "info");
    }

    #[test]
    fn test_custom_filter() {
        let filter = env_filter(Some("pixtext_core=trace")).unwrap();
        assert_eq!(filter.to_string(), "pixtext_core=trace");
    }

    #[test]
    fn test_invalid_filter_is_reported() {
        assert!(env_filter(Some("pixtext_core=notalevel")).is_err());
    }
}
