//! Azure image analysis client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use pixtext_core::request::{DEFAULT_API_VERSION, DEFAULT_LANGUAGE, DEFAULT_MODEL_VERSION};
use pixtext_core::{AnalyzeOptions, Error, Result, SubscriptionKey};
use serde::{Deserialize, Serialize};
use url::Url;

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Azure image analysis client.
///
/// The endpoint and subscription key come from the environment or a secrets
/// store; nothing here is hardcoded.
///
/// # Environment Variables
///
/// - `PIXTEXT_ENDPOINT` - analyze endpoint, e.g.
///   `https://<resource>.cognitiveservices.azure.com/computervision/imageanalysis:analyze`
/// - `PIXTEXT_SUBSCRIPTION_KEY` - subscription key
/// - `PIXTEXT_API_VERSION` - API version (default: 2024-02-01)
/// - `PIXTEXT_MODEL_VERSION` - model version (default: latest)
/// - `PIXTEXT_LANGUAGE` - language hint (default: en)
/// - `PIXTEXT_HTTP_TIMEOUT` - request timeout in seconds (default: 30)
/// - `PIXTEXT_HTTP_USER_AGENT` - User-Agent header
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct AzureConfig {
    /// Image analysis endpoint URL
    #[cfg_attr(feature = "config", arg(long = "endpoint", env = "PIXTEXT_ENDPOINT"))]
    pub endpoint: Url,

    /// Subscription key sent in the Ocp-Apim-Subscription-Key header
    #[cfg_attr(
        feature = "config",
        arg(
            long = "subscription-key",
            env = "PIXTEXT_SUBSCRIPTION_KEY",
            hide_env_values = true
        )
    )]
    pub subscription_key: SubscriptionKey,

    /// API version of the analyze endpoint
    #[cfg_attr(
        feature = "config",
        arg(long = "api-version", env = "PIXTEXT_API_VERSION", default_value = DEFAULT_API_VERSION)
    )]
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Model version to run
    #[cfg_attr(
        feature = "config",
        arg(long = "model-version", env = "PIXTEXT_MODEL_VERSION", default_value = DEFAULT_MODEL_VERSION)
    )]
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Language hint for recognition
    #[cfg_attr(
        feature = "config",
        arg(long = "language", env = "PIXTEXT_LANGUAGE", default_value = DEFAULT_LANGUAGE)
    )]
    #[serde(default = "default_language")]
    pub language: String,

    /// HTTP request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "PIXTEXT_HTTP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent header to send with requests
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "PIXTEXT_HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_model_version() -> String {
    DEFAULT_MODEL_VERSION.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl AzureConfig {
    /// Creates a configuration with default analysis options.
    pub fn new(endpoint: Url, subscription_key: SubscriptionKey) -> Self {
        Self {
            endpoint,
            subscription_key,
            api_version: default_api_version(),
            model_version: default_model_version(),
            language: default_language(),
            http_timeout: default_timeout_secs(),
            user_agent: None,
        }
    }

    /// Parses `endpoint` and creates a configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `endpoint` is not a valid URL.
    pub fn from_parts(endpoint: impl AsRef<str>, subscription_key: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.as_ref()).map_err(|e| {
            Error::configuration()
                .with_message(format!("invalid endpoint '{}': {}", endpoint.as_ref(), e))
        })?;

        Ok(Self::new(endpoint, SubscriptionKey::new(subscription_key)))
    }

    /// Returns the query parameters sent with every call.
    pub fn options(&self) -> AnalyzeOptions {
        AnalyzeOptions::default()
            .with_api_version(&self.api_version)
            .with_model_version(&self.model_version)
            .with_language(&self.language)
    }

    /// Returns the effective timeout, using default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.http_timeout == 0 {
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        } else {
            Duration::from_secs(self.http_timeout)
        }
    }

    /// Returns the effective user agent, using default if not set.
    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(Self::default_user_agent)
    }

    /// Returns the default user agent string.
    fn default_user_agent() -> String {
        format!("pixtext/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Set the API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the language hint.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the timeout in seconds.
    #[must_use]
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.http_timeout = timeout_secs;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Checks values that would otherwise fail on the first request.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is empty or the endpoint is
    /// not an http(s) URL.
    pub fn validate(&self) -> Result<()> {
        if self.subscription_key.is_empty() {
            return Err(Error::configuration().with_message("subscription key is empty"));
        }

        if !matches!(self.endpoint.scheme(), "http" | "https") {
            return Err(Error::configuration().with_message(format!(
                "endpoint scheme '{}' is not http or https",
                self.endpoint.scheme()
            )));
        }

        Ok(())
    }
}
