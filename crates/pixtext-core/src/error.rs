//! Error taxonomy shared by every pixtext crate.
//!
//! Errors are split by where they surface:
//!
//! - **InvalidPayload**: rejected before any network attempt
//! - **Transport**: the HTTP exchange failed or returned a non-2xx status
//! - **MalformedResponse**: the body could not be walked as a read result
//! - **UnexpectedRuntime**: anything else, reported instead of crashing
//!
//! # Examples
//!
//! ```rust
//! use pixtext_core::{Error, ErrorKind};
//!
//! let error = Error::transport()
//!     .with_status(503)
//!     .with_message("service unavailable");
//!
//! assert_eq!(error.kind(), ErrorKind::Transport);
//! assert_eq!(error.status(), Some(503));
//! assert_eq!(error.kind_str(), "transport");
//! ```

use strum::{AsRefStr, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message shown to the user when the HTTP exchange fails.
pub const TRANSPORT_FAILURE_MESSAGE: &str = "Error during image analysis.";

/// Message shown to the user for any other failure.
pub const ANALYSIS_FAILURE_MESSAGE: &str = "Failed to analyze image.";

/// Categories of errors that can occur while analyzing an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Image bytes were empty or above the provider's size ceiling.
    InvalidPayload,
    /// Network failure or non-success status from the provider.
    Transport,
    /// Response body was not JSON or did not follow the read-result schema.
    MalformedResponse,
    /// Endpoint, credential or header values could not be used.
    Configuration,
    /// Any other fault, such as a cancelled or panicked job.
    UnexpectedRuntime,
}

/// A structured error type for pixtext operations.
#[derive(Debug, Error)]
#[error("{kind:?}{}", message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// HTTP status returned by the provider, if any.
    pub status: Option<u16>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            status: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attaches the HTTP status returned by the provider.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Creates a new invalid payload error.
    pub fn invalid_payload() -> Self {
        Self::new(ErrorKind::InvalidPayload)
    }

    /// Creates a new transport error.
    pub fn transport() -> Self {
        Self::new(ErrorKind::Transport)
    }

    /// Creates a new malformed response error.
    pub fn malformed_response() -> Self {
        Self::new(ErrorKind::MalformedResponse)
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new unexpected runtime error.
    pub fn unexpected_runtime() -> Self {
        Self::new(ErrorKind::UnexpectedRuntime)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the HTTP status attached to this error.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Returns the message the presentation layer should display.
    ///
    /// Transport failures and every other failure use distinct fixed
    /// strings; details stay in the logs.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            ErrorKind::Transport => TRANSPORT_FAILURE_MESSAGE,
            _ => ANALYSIS_FAILURE_MESSAGE,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::malformed_response()
            .with_message(err.to_string())
            .with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_message() {
        let error = Error::invalid_payload().with_message("image is empty");
        assert_eq!(error.to_string(), "InvalidPayload: image is empty");

        let error = Error::unexpected_runtime();
        assert_eq!(error.to_string(), "UnexpectedRuntime");
    }

    #[test]
    fn test_kind_str_is_snake_case() {
        assert_eq!(Error::malformed_response().kind_str(), "malformed_response");
        assert_eq!(Error::invalid_payload().kind_str(), "invalid_payload");
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            Error::transport().with_status(500).user_message(),
            TRANSPORT_FAILURE_MESSAGE
        );
        assert_eq!(
            Error::unexpected_runtime().user_message(),
            ANALYSIS_FAILURE_MESSAGE
        );
        assert_eq!(
            Error::malformed_response().user_message(),
            ANALYSIS_FAILURE_MESSAGE
        );
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let error = Error::from(err);
        assert_eq!(error.kind(), ErrorKind::MalformedResponse);
        assert!(std::error::Error::source(&error).is_some());
    }
}
