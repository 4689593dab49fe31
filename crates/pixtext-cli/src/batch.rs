//! Submission of image files to the worker.

use std::path::{Path, PathBuf};

use pixtext_core::MAX_IMAGE_BYTES;
use pixtext_worker::{AnalyzeHandle, AnalyzeOutcome, AnalyzeWorker};

use crate::TRACING_TARGET_INPUT;

/// Outcomes of one run, in the order the files were given.
#[derive(Debug, Default)]
pub struct Batch {
    results: Vec<(PathBuf, AnalyzeOutcome)>,
}

impl Batch {
    /// Returns each file with its outcome.
    pub fn results(&self) -> &[(PathBuf, AnalyzeOutcome)] {
        &self.results
    }

    /// Returns true if every file produced text.
    pub fn all_text(&self) -> bool {
        self.results.iter().all(|(_, outcome)| outcome.is_text())
    }
}

/// Submits every file, then waits for all outcomes.
///
/// All files are submitted before the first outcome is awaited so that the
/// worker can run them concurrently. A file that cannot be read or is
/// rejected fails on its own without affecting the others.
pub async fn analyze_files(worker: &AnalyzeWorker, paths: &[PathBuf]) -> Batch {
    let mut submissions = Vec::with_capacity(paths.len());
    for path in paths {
        submissions.push((path.clone(), submit_file(worker, path).await));
    }

    let mut results = Vec::with_capacity(submissions.len());
    for (path, submission) in submissions {
        let outcome = match submission {
            Some(handle) => handle.outcome().await,
            None => AnalyzeOutcome::aborted(),
        };
        results.push((path, outcome));
    }

    Batch { results }
}

/// Reads `path` and submits it to the worker.
///
/// The file size is checked before reading so oversized files are never
/// loaded. Failures are logged and yield `None`.
async fn submit_file(worker: &AnalyzeWorker, path: &Path) -> Option<AnalyzeHandle> {
    let size = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_INPUT,
                path = %path.display(),
                error = %error,
                "Failed to inspect image file"
            );
            return None;
        }
    };

    if size > MAX_IMAGE_BYTES as u64 {
        tracing::error!(
            target: TRACING_TARGET_INPUT,
            path = %path.display(),
            image_size = size,
            limit = MAX_IMAGE_BYTES,
            "Image file exceeds the size limit"
        );
        return None;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_INPUT,
                path = %path.display(),
                error = %error,
                "Failed to read image file"
            );
            return None;
        }
    };

    tracing::debug!(
        target: TRACING_TARGET_INPUT,
        path = %path.display(),
        image_size = bytes.len(),
        "Read image file"
    );

    match worker.submit(bytes) {
        Ok(handle) => Some(handle),
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET_INPUT,
                path = %path.display(),
                error = %error,
                "Image rejected before analysis"
            );
            None
        }
    }
}
