#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

//! # Pixtext Azure
//!
//! Reqwest transport for the Azure image analysis `read` feature. The
//! [`AzureClient`] implements [`OcrTransport`](pixtext_core::OcrTransport),
//! so it plugs into the worker or can be called directly.

mod client;
mod config;
mod error;

pub use client::AzureClient;
pub use config::{AzureConfig, DEFAULT_TIMEOUT_SECS};
pub use error::{Error, Result};

/// Tracing target for client operations.
pub const TRACING_TARGET: &str = "pixtext_azure::client";
