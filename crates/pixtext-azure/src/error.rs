//! Error types for the reqwest transport.

use serde::Deserialize;
use thiserror::Error;

/// Longest slice of an unrecognized error body kept in messages.
const MAX_BODY_EXCERPT: usize = 1024;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<Error> for pixtext_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                let error = if e.is_timeout() {
                    pixtext_core::Error::transport().with_message("request timed out")
                } else if e.is_connect() {
                    pixtext_core::Error::transport().with_message("connection failed")
                } else if e.is_builder() {
                    pixtext_core::Error::configuration().with_message(e.to_string())
                } else {
                    pixtext_core::Error::transport().with_message(e.to_string())
                };

                match e.status() {
                    Some(status) => error.with_status(status.as_u16()).with_source(e),
                    None => error.with_source(e),
                }
            }
        }
    }
}

/// Error envelope returned by the service on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Builds the transport error for a non-success response.
pub(crate) fn status_error(status: u16, body: &str) -> pixtext_core::Error {
    let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(ApiErrorResponse { error }) => match (error.code, error.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => String::new(),
        },
        Err(_) => body.chars().take(MAX_BODY_EXCERPT).collect(),
    };

    let message = if detail.is_empty() {
        format!("provider returned status {status}")
    } else {
        format!("provider returned status {status}: {detail}")
    };

    pixtext_core::Error::transport()
        .with_status(status)
        .with_message(message)
}

#[cfg(test)]
mod tests {
    use pixtext_core::ErrorKind;

    use super::*;

    #[test]
    fn test_status_error_reads_envelope() {
        let body = r#"{"error":{"code":"401","message":"Access denied due to invalid subscription key."}}"#;
        let error = status_error(401, body);

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(error.status(), Some(401));
        assert_eq!(
            error.message.as_deref(),
            Some("provider returned status 401: 401: Access denied due to invalid subscription key.")
        );
    }

    #[test]
    fn test_status_error_keeps_raw_body_excerpt() {
        let body = "x".repeat(4096);
        let error = status_error(502, &body);

        let message = error.message.unwrap();
        assert!(message.starts_with("provider returned status 502: xxx"));
        assert_eq!(
            message.len(),
            "provider returned status 502: ".len() + MAX_BODY_EXCERPT
        );
    }

    #[test]
    fn test_status_error_without_body() {
        let error = status_error(500, "");
        assert_eq!(
            error.message.as_deref(),
            Some("provider returned status 500")
        );
    }
}
