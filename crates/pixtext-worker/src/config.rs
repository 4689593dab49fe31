//! Worker configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Default maximum number of analysis calls in flight.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

/// Worker behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct WorkerConfig {
    /// Maximum analysis calls the worker runs simultaneously.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "max-concurrent-jobs",
            env = "PIXTEXT_MAX_CONCURRENT_JOBS",
            default_value_t = DEFAULT_MAX_CONCURRENT_JOBS
        )
    )]
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

fn default_max_concurrent_jobs() -> usize {
    DEFAULT_MAX_CONCURRENT_JOBS
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
        }
    }
}

impl WorkerConfig {
    /// Creates a new worker config with the specified concurrency limit.
    pub fn with_max_concurrent_jobs(mut self, max_concurrent_jobs: usize) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self
    }

    /// Returns the concurrency limit, never below one.
    pub fn effective_max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.max_concurrent_jobs, 4);

        let config: WorkerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_concurrent_jobs, DEFAULT_MAX_CONCURRENT_JOBS);
    }

    #[test]
    fn test_zero_is_clamped() {
        let config = WorkerConfig::default().with_max_concurrent_jobs(0);
        assert_eq!(config.effective_max_concurrent_jobs(), 1);
    }
}
