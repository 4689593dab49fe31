//! Request construction for the image analysis endpoint.
//!
//! [`RequestBuilder`] is created once from injected configuration and turns
//! raw image bytes into an immutable [`OcrRequest`]. Construction never
//! touches the network.
//!
//! # Example
//!
//! ```rust
//! use pixtext_core::{AnalyzeOptions, RequestBuilder, SubscriptionKey};
//! use url::Url;
//!
//! let endpoint = Url::parse(
//!     "https://example.cognitiveservices.azure.com/computervision/imageanalysis:analyze",
//! )?;
//! let builder = RequestBuilder::new(endpoint, SubscriptionKey::new("secret"))
//!     .with_options(AnalyzeOptions::default());
//!
//! let request = builder.build_request(vec![0xFF, 0xD8, 0xFF])?;
//! assert_eq!(request.method(), "POST");
//! assert_eq!(request.body().as_bytes(), &[0xFF, 0xD8, 0xFF]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::{ImagePayload, Result};

/// Tracing target for request construction.
pub const TRACING_TARGET: &str = "pixtext_core::request";

/// Header carrying the subscription credential.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Content type of the binary image body.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Feature selected on every call.
pub const READ_FEATURE: &str = "read";

/// Default API version of the image analysis endpoint.
pub const DEFAULT_API_VERSION: &str = "2024-02-01";

/// Default model version.
pub const DEFAULT_MODEL_VERSION: &str = "latest";

/// Default language hint.
pub const DEFAULT_LANGUAGE: &str = "en";

const QUERY_KEYS: [&str; 4] = ["api-version", "features", "model-version", "language"];

/// Static credential authorizing calls to the provider.
///
/// The value is never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionKey(String);

impl SubscriptionKey {
    /// Wraps a subscription key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if no key was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromStr for SubscriptionKey {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Debug for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubscriptionKey(<redacted>)")
    }
}

/// Query parameters sent with every analysis call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOptions {
    /// API version of the endpoint.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Model version to run.
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Language hint for recognition.
    #[serde(default = "default_language")]
    pub language: String,
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

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            model_version: default_model_version(),
            language: default_language(),
        }
    }
}

impl AnalyzeOptions {
    /// Sets the API version.
    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Sets the model version.
    #[must_use]
    pub fn with_model_version(mut self, model_version: impl Into<String>) -> Self {
        self.model_version = model_version.into();
        self
    }

    /// Sets the language hint.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Writes the analysis parameters onto `endpoint`.
    ///
    /// Unrelated query parameters already on the endpoint are kept; the four
    /// analysis parameters are replaced.
    pub fn apply_to(&self, endpoint: &Url) -> Url {
        let mut url = endpoint.clone();
        let retained: Vec<(String, String)> = endpoint
            .query_pairs()
            .filter(|(key, _)| !QUERY_KEYS.contains(&key.as_ref()))
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.set_query(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("api-version", &self.api_version)
                .append_pair("features", READ_FEATURE)
                .append_pair("model-version", &self.model_version)
                .append_pair("language", &self.language);
            for (key, value) in &retained {
                pairs.append_pair(key, value);
            }
        }

        url
    }
}

/// Immutable description of one outbound analysis call.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    request_id: Uuid,
    url: Url,
    subscription_key: SubscriptionKey,
    body: ImagePayload,
}

impl OcrRequest {
    /// HTTP method of every analysis call.
    pub const METHOD: &'static str = "POST";

    /// Returns the identifier used to correlate logs for this call.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the full endpoint URL including query parameters.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &'static str {
        Self::METHOD
    }

    /// Returns the request headers as name/value pairs.
    pub fn headers(&self) -> [(&'static str, &str); 2] {
        [
            (SUBSCRIPTION_KEY_HEADER, self.subscription_key.expose()),
            ("Content-Type", OCTET_STREAM),
        ]
    }

    /// Returns the image payload sent as the body.
    pub fn body(&self) -> &ImagePayload {
        &self.body
    }

    /// Returns the body as a cheaply cloned buffer.
    pub fn body_bytes(&self) -> Bytes {
        self.body.to_bytes()
    }
}

/// Builds [`OcrRequest`]s against a configured endpoint.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: Url,
    subscription_key: SubscriptionKey,
    options: AnalyzeOptions,
}

impl RequestBuilder {
    /// Creates a builder for `endpoint` using the default analysis options.
    pub fn new(endpoint: Url, subscription_key: SubscriptionKey) -> Self {
        let options = AnalyzeOptions::default();
        Self {
            url: options.apply_to(&endpoint),
            subscription_key,
            options,
        }
    }

    /// Replaces the analysis options.
    #[must_use]
    pub fn with_options(mut self, options: AnalyzeOptions) -> Self {
        self.url = options.apply_to(&self.url);
        self.options = options;
        self
    }

    /// Returns the analysis options.
    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    /// Returns the endpoint URL every request is sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Validates `image_bytes` and describes the call that would send them.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidPayload`](crate::ErrorKind::InvalidPayload) error
    /// when the image is empty or above [`MAX_IMAGE_BYTES`](crate::MAX_IMAGE_BYTES).
    pub fn build_request(&self, image_bytes: impl Into<Bytes>) -> Result<OcrRequest> {
        let body = ImagePayload::new(image_bytes).inspect_err(|error| {
            tracing::warn!(
                target: TRACING_TARGET,
                error = %error,
                "Rejected image payload"
            );
        })?;

        Ok(self.build_from_payload(body))
    }

    /// Describes the call for an already validated payload.
    pub fn build_from_payload(&self, body: ImagePayload) -> OcrRequest {
        let request = OcrRequest {
            request_id: Uuid::new_v4(),
            url: self.url.clone(),
            subscription_key: self.subscription_key.clone(),
            body,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            request_id = %request.request_id,
            image_size = request.body.len(),
            "Built analysis request"
        );

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, MAX_IMAGE_BYTES};

    fn builder() -> RequestBuilder {
        let endpoint = Url::parse(
            "https://ocr.example.com/computervision/imageanalysis:analyze",
        )
        .unwrap();
        RequestBuilder::new(endpoint, SubscriptionKey::new("test-key"))
    }

    #[test]
    fn test_rejects_empty_and_oversized_images() {
        let builder = builder();

        let err = builder.build_request(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);

        let err = builder
            .build_request(vec![0u8; MAX_IMAGE_BYTES + 1])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[test]
    fn test_body_is_unmodified() {
        let image: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let request = builder().build_request(image.clone()).unwrap();
        assert_eq!(request.body().as_bytes(), image.as_slice());
        assert_eq!(request.body_bytes().as_ref(), image.as_slice());
    }

    #[test]
    fn test_headers_and_method() {
        let request = builder().build_request(vec![1, 2, 3]).unwrap();
        assert_eq!(request.method(), "POST");
        assert_eq!(
            request.headers(),
            [
                ("Ocp-Apim-Subscription-Key", "test-key"),
                ("Content-Type", "application/octet-stream"),
            ]
        );
    }

    #[test]
    fn test_query_parameters() {
        let request = builder().build_request(vec![1]).unwrap();
        assert_eq!(
            request.url().query(),
            Some("api-version=2024-02-01&features=read&model-version=latest&language=en")
        );
        assert_eq!(
            request.url().path(),
            "/computervision/imageanalysis:analyze"
        );
    }

    #[test]
    fn test_options_replace_existing_parameters() {
        let endpoint = Url::parse(
            "https://ocr.example.com/analyze?api-version=2023-10-01&gender-neutral-caption=true",
        )
        .unwrap();
        let builder = RequestBuilder::new(endpoint, SubscriptionKey::new("k"))
            .with_options(AnalyzeOptions::default().with_language("de"));

        let pairs: Vec<(String, String)> = builder
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("api-version".into(), "2024-02-01".into()),
                ("features".into(), "read".into()),
                ("model-version".into(), "latest".into()),
                ("language".into(), "de".into()),
                ("gender-neutral-caption".into(), "true".into()),
            ]
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let request = builder().build_request(vec![1]).unwrap();
        let debug = format!("{request:?}");
        assert!(!debug.contains("test-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_each_request_gets_its_own_id() {
        let builder = builder();
        let a = builder.build_request(vec![1]).unwrap();
        let b = builder.build_request(vec![1]).unwrap();
        assert_ne!(a.request_id(), b.request_id());
    }
}
