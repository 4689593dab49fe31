//! Reqwest-based client for the image analysis endpoint.

use std::sync::Arc;

use bytes::Bytes;
use pixtext_core::{
    Error as CoreError, Extraction, OcrRequest, OcrTransport, RequestBuilder, Result,
    SharedTransport,
};
use reqwest::Client;
use reqwest::header::HeaderValue;

use crate::error::status_error;
use crate::{AzureConfig, Error, TRACING_TARGET};

/// Inner client that holds the HTTP client, request builder and configuration.
struct AzureClientInner {
    http: Client,
    builder: RequestBuilder,
    config: AzureConfig,
}

/// HTTP client for the Azure image analysis `read` feature.
///
/// Cloning is cheap; all clones share one connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use pixtext_azure::{AzureClient, AzureConfig};
///
/// let config = AzureConfig::from_parts(endpoint, key)?;
/// let client = AzureClient::new(config)?;
///
/// let extraction = client.analyze(std::fs::read("receipt.jpg")?).await?;
/// println!("{}", extraction.text());
/// ```
#[derive(Clone)]
pub struct AzureClient {
    inner: Arc<AzureClientInner>,
}

impl std::fmt::Debug for AzureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl AzureClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration does not validate,
    /// the key cannot be sent as a header, or the HTTP client cannot be built.
    pub fn new(config: AzureConfig) -> Result<Self> {
        config.validate()?;

        HeaderValue::from_str(config.subscription_key.expose()).map_err(|e| {
            CoreError::configuration()
                .with_message("subscription key is not a valid header value")
                .with_source(e)
        })?;

        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            endpoint = %config.endpoint,
            timeout_ms = timeout.as_millis(),
            "Creating image analysis client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|e| {
                CoreError::configuration()
                    .with_message("failed to create HTTP client")
                    .with_source(e)
            })?;

        let builder = RequestBuilder::new(config.endpoint.clone(), config.subscription_key.clone())
            .with_options(config.options());

        let inner = AzureClientInner {
            http,
            builder,
            config,
        };

        tracing::info!(
            target: TRACING_TARGET,
            "Image analysis client created successfully"
        );

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the underlying HTTP client.
    pub(crate) fn http(&self) -> &Client {
        &self.inner.http
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &AzureConfig {
        &self.inner.config
    }

    /// Gets the builder used for every request.
    pub fn request_builder(&self) -> &RequestBuilder {
        &self.inner.builder
    }

    /// Sends `image_bytes` for text recognition.
    ///
    /// # Errors
    ///
    /// Returns invalid payload errors before any network attempt and
    /// transport errors for failed exchanges. Bodies that do not follow the
    /// read-result schema yield [`Extraction::Partial`] instead.
    pub async fn analyze(&self, image_bytes: impl Into<Bytes>) -> Result<Extraction> {
        pixtext_core::analyze(&self.inner.builder, self, image_bytes).await
    }

    /// Converts this client into a shared transport for the worker.
    pub fn into_shared(self) -> SharedTransport {
        Arc::new(self)
    }
}

#[async_trait::async_trait]
impl OcrTransport for AzureClient {
    async fn send(&self, request: &OcrRequest) -> Result<String> {
        let mut http_request = self
            .http()
            .post(request.url().as_str())
            .body(request.body_bytes());

        for (name, value) in request.headers() {
            http_request = http_request.header(name, value);
        }

        let response = http_request.send().await.map_err(Error::from)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id(),
            status = status.as_u16(),
            body_size = body.len(),
            "Received analysis response"
        );

        if status.is_success() {
            Ok(body)
        } else {
            Err(status_error(status.as_u16(), &body))
        }
    }
}
