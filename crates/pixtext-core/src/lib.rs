#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Pixtext Core
//!
//! This crate defines the contract for sending an image to the cloud image
//! analysis service and turning its answer into plain text. It builds
//! requests and walks responses without performing any network I/O; the
//! exchange itself happens behind the [`OcrTransport`] trait.

mod error;
mod payload;
mod transport;

pub mod request;
pub mod response;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use error::{
    ANALYSIS_FAILURE_MESSAGE, BoxedError, Error, ErrorKind, Result, TRANSPORT_FAILURE_MESSAGE,
};
pub use payload::{ImagePayload, MAX_IMAGE_BYTES};
pub use request::{AnalyzeOptions, OcrRequest, RequestBuilder, SubscriptionKey};
pub use response::{Extraction, OcrResponseDocument, extract_text};
pub use transport::{OcrTransport, SharedTransport, analyze, analyze_request};
