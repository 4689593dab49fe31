#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod analyze;
mod config;

pub use analyze::{AnalyzeHandle, AnalyzeOutcome, AnalyzeWorker};
pub use config::{DEFAULT_MAX_CONCURRENT_JOBS, WorkerConfig};
