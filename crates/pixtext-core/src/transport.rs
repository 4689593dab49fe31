//! Transport seam between request construction and response extraction.

use std::sync::Arc;

use bytes::Bytes;

use crate::{Extraction, OcrRequest, RequestBuilder, Result, extract_text};

/// Tracing target for analysis calls.
pub const TRACING_TARGET: &str = "pixtext_core::transport";

/// Type alias for a shared transport.
pub type SharedTransport = Arc<dyn OcrTransport>;

/// Sends an [`OcrRequest`] and returns the body of a successful response.
///
/// Implementations must map network failures and non-2xx statuses to
/// [`Transport`](crate::ErrorKind::Transport) errors; the body of a failed
/// exchange is never handed to the extractor.
#[async_trait::async_trait]
pub trait OcrTransport: Send + Sync {
    /// Performs the HTTP exchange described by `request`.
    async fn send(&self, request: &OcrRequest) -> Result<String>;
}

#[async_trait::async_trait]
impl<T> OcrTransport for Arc<T>
where
    T: OcrTransport + ?Sized,
{
    async fn send(&self, request: &OcrRequest) -> Result<String> {
        (**self).send(request).await
    }
}

/// Runs one analysis: build the request, send it, extract the text.
///
/// Payload validation happens before `transport` is called. A malformed
/// body is not an error here; it comes back as [`Extraction::Partial`].
///
/// # Errors
///
/// Returns [`InvalidPayload`](crate::ErrorKind::InvalidPayload) for images
/// outside the size limits and whatever [`Transport`](crate::ErrorKind::Transport)
/// error the transport reports.
pub async fn analyze<T>(
    builder: &RequestBuilder,
    transport: &T,
    image_bytes: impl Into<Bytes>,
) -> Result<Extraction>
where
    T: OcrTransport + ?Sized,
{
    let request = builder.build_request(image_bytes)?;
    analyze_request(transport, &request).await
}

/// Sends an already built request and extracts the text of the answer.
///
/// # Errors
///
/// Returns whatever [`Transport`](crate::ErrorKind::Transport) error the
/// transport reports.
pub async fn analyze_request<T>(transport: &T, request: &OcrRequest) -> Result<Extraction>
where
    T: OcrTransport + ?Sized,
{
    tracing::debug!(
        target: TRACING_TARGET,
        request_id = %request.request_id(),
        image_size = request.body().len(),
        "Sending image for analysis"
    );

    let body = transport.send(request).await.inspect_err(|error| {
        tracing::error!(
            target: TRACING_TARGET,
            request_id = %request.request_id(),
            error = %error,
            status = ?error.status(),
            "Image analysis request failed"
        );
    })?;

    Ok(extract_text(&body))
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::mock::{MockReply, MockTransport};
    use crate::{ErrorKind, SubscriptionKey};

    fn builder() -> RequestBuilder {
        let endpoint = Url::parse("https://ocr.example.com/analyze").unwrap();
        RequestBuilder::new(endpoint, SubscriptionKey::new("k"))
    }

    #[tokio::test]
    async fn test_analyze_extracts_text() {
        let transport = MockTransport::with_body(
            r#"{"readResult":{"blocks":[{"lines":[{"text":"Hello"},{"text":"World"}]}]}}"#,
        );

        let extraction = analyze(&builder(), &transport, vec![1, 2, 3]).await.unwrap();
        assert!(extraction.is_complete());
        assert_eq!(extraction.text(), "Hello World ");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_payload_never_reaches_transport() {
        let transport = MockTransport::with_body("{}");

        let err = analyze(&builder(), &transport, Vec::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_status_failure_is_surfaced() {
        let transport = MockTransport::new(MockReply::Status(401));

        let err = analyze(&builder(), &transport, vec![1]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_malformed_body_is_partial_not_error() {
        let transport = MockTransport::with_body("<html>gateway</html>");

        let extraction = analyze(&builder(), &transport, vec![1]).await.unwrap();
        assert!(!extraction.is_complete());
        assert_eq!(extraction.text(), "");
    }

    #[tokio::test]
    async fn test_shared_transport() {
        let transport: SharedTransport = Arc::new(MockTransport::with_body(
            r#"{"readResult":{"blocks":[]}}"#,
        ));

        let extraction = analyze(&builder(), &transport, vec![1]).await.unwrap();
        assert_eq!(extraction.text(), "");
    }
}
