//! Background analysis worker.
//!
//! Each submission runs on its own tokio task. A semaphore bounds how many
//! provider calls are in flight, and every job carries a child token of the
//! worker's cancellation token.

use std::sync::Arc;

use bytes::Bytes;
use pixtext_core::{
    ANALYSIS_FAILURE_MESSAGE, Extraction, OcrRequest, RequestBuilder, Result, SharedTransport,
    analyze_request,
};
use tokio::sync::{Semaphore, oneshot};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::WorkerConfig;

/// Tracing target for the analysis worker.
const TRACING_TARGET: &str = "pixtext_worker::analyze";

/// Result delivered to the presentation layer for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// Recognized text, possibly partial if the response was malformed.
    Text(String),
    /// User-visible failure message.
    Failed(String),
}

impl AnalyzeOutcome {
    /// Maps an analysis result to what the user should see.
    pub fn from_result(result: Result<Extraction>) -> Self {
        match result {
            Ok(extraction) => Self::Text(extraction.into_text()),
            Err(error) => Self::Failed(error.user_message().to_string()),
        }
    }

    /// Outcome of a job that was cancelled or lost.
    pub fn aborted() -> Self {
        Self::Failed(ANALYSIS_FAILURE_MESSAGE.to_string())
    }

    /// Returns true if text was produced.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the recognized text, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Failed(_) => None,
        }
    }
}

/// Handle to one submitted analysis job.
#[derive(Debug)]
pub struct AnalyzeHandle {
    job_id: Uuid,
    receiver: oneshot::Receiver<AnalyzeOutcome>,
    cancel_token: CancellationToken,
}

impl AnalyzeHandle {
    /// Returns the identifier shared with the outbound request.
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Cancels this job only.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Returns true if this job or its worker was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Waits for the job to finish.
    ///
    /// A job whose task vanished without reporting, for example after a
    /// panic, yields the generic failure message.
    pub async fn outcome(self) -> AnalyzeOutcome {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::error!(
                    target: TRACING_TARGET,
                    job_id = %self.job_id,
                    "Analysis task ended without reporting an outcome"
                );
                AnalyzeOutcome::aborted()
            }
        }
    }
}

/// Runs image analyses in the background with bounded concurrency.
pub struct AnalyzeWorker {
    transport: SharedTransport,
    builder: RequestBuilder,
    cancel_token: CancellationToken,
    semaphore: Arc<Semaphore>,
}

impl std::fmt::Debug for AnalyzeWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzeWorker")
            .field("available_permits", &self.semaphore.available_permits())
            .field("cancelled", &self.cancel_token.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl AnalyzeWorker {
    /// Creates a new analysis worker.
    ///
    /// # Arguments
    ///
    /// * `transport` - Transport performing the HTTP exchange
    /// * `builder` - Builder validating payloads and describing requests
    /// * `config` - Worker behavior settings
    /// * `cancel_token` - Token for cancelling every job of this worker
    pub fn new(
        transport: SharedTransport,
        builder: RequestBuilder,
        config: &WorkerConfig,
        cancel_token: CancellationToken,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.effective_max_concurrent_jobs()));
        Self {
            transport,
            builder,
            cancel_token,
            semaphore,
        }
    }

    /// Submits `image_bytes` for analysis.
    ///
    /// The payload is validated before anything is spawned, so an empty or
    /// oversized image is reported here and never reaches the transport.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidPayload`](pixtext_core::ErrorKind::InvalidPayload)
    /// error for images outside the size limits.
    pub fn submit(&self, image_bytes: impl Into<Bytes>) -> Result<AnalyzeHandle> {
        let request = self.builder.build_request(image_bytes)?;
        let job_id = request.request_id();
        let job_token = self.cancel_token.child_token();
        let (sender, receiver) = oneshot::channel();

        tracing::debug!(
            target: TRACING_TARGET,
            job_id = %job_id,
            image_size = request.body().len(),
            "Submitting analysis job"
        );

        let transport = self.transport.clone();
        let semaphore = self.semaphore.clone();
        let token = job_token.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;

                () = token.cancelled() => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        job_id = %job_id,
                        "Analysis job cancelled"
                    );
                    AnalyzeOutcome::aborted()
                }

                outcome = run_job(semaphore, transport, request) => outcome,
            };

            if sender.send(outcome).is_err() {
                tracing::debug!(
                    target: TRACING_TARGET,
                    job_id = %job_id,
                    "Analysis handle dropped before completion"
                );
            }
        });

        Ok(AnalyzeHandle {
            job_id,
            receiver,
            cancel_token: job_token,
        })
    }

    /// Cancels every job submitted to this worker.
    pub fn shutdown(&self) {
        tracing::info!(target: TRACING_TARGET, "Cancelling analysis jobs");
        self.cancel_token.cancel();
    }

    /// Returns the number of jobs that could start right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Waits for a permit and runs one analysis.
async fn run_job(
    semaphore: Arc<Semaphore>,
    transport: SharedTransport,
    request: OcrRequest,
) -> AnalyzeOutcome {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        tracing::error!(
            target: TRACING_TARGET,
            job_id = %request.request_id(),
            "Semaphore closed, dropping job"
        );
        return AnalyzeOutcome::aborted();
    };

    let result = analyze_request(&*transport, &request).await;
    match &result {
        Ok(extraction) if extraction.is_complete() => {
            tracing::info!(
                target: TRACING_TARGET,
                job_id = %request.request_id(),
                text_len = extraction.text().len(),
                "Analysis job completed"
            );
        }
        Ok(extraction) => {
            tracing::warn!(
                target: TRACING_TARGET,
                job_id = %request.request_id(),
                text_len = extraction.text().len(),
                "Analysis job completed with partial text"
            );
        }
        Err(error) => {
            tracing::error!(
                target: TRACING_TARGET,
                job_id = %request.request_id(),
                error = %error,
                "Analysis job failed"
            );
        }
    }

    AnalyzeOutcome::from_result(result)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pixtext_core::mock::{MockReply, MockTransport};
    use pixtext_core::{ErrorKind, SubscriptionKey, TRANSPORT_FAILURE_MESSAGE};
    use url::Url;

    use super::*;

    const HELLO_WORLD: &str =
        r#"{"readResult":{"blocks":[{"lines":[{"text":"Hello"},{"text":"World"}]}]}}"#;

    fn builder() -> RequestBuilder {
        let endpoint = Url::parse("https://ocr.example.com/analyze").unwrap();
        RequestBuilder::new(endpoint, SubscriptionKey::new("k"))
    }

    fn worker(transport: MockTransport, max_concurrent_jobs: usize) -> AnalyzeWorker {
        let config = WorkerConfig::default().with_max_concurrent_jobs(max_concurrent_jobs);
        AnalyzeWorker::new(
            Arc::new(transport),
            builder(),
            &config,
            CancellationToken::new(),
        )
    }

    #[tokio::test]
    async fn test_delivers_text() {
        let worker = worker(MockTransport::with_body(HELLO_WORLD), 4);

        let outcome = worker.submit(vec![1, 2, 3]).unwrap().outcome().await;
        assert_eq!(outcome, AnalyzeOutcome::Text("Hello World ".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_payload_rejected_before_dispatch() {
        let transport = MockTransport::with_body(HELLO_WORLD);
        let worker = worker(transport.clone(), 4);

        let err = worker.submit(Vec::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_message() {
        let worker = worker(MockTransport::new(MockReply::Status(500)), 4);

        let outcome = worker.submit(vec![1]).unwrap().outcome().await;
        assert_eq!(
            outcome,
            AnalyzeOutcome::Failed(TRANSPORT_FAILURE_MESSAGE.to_string())
        );

        let worker = self::worker(MockTransport::new(MockReply::Network), 4);
        let outcome = worker.submit(vec![1]).unwrap().outcome().await;
        assert_eq!(outcome.text(), None);
    }

    #[tokio::test]
    async fn test_partial_text_is_delivered() {
        let body = r#"{"readResult":{"blocks":[{"lines":[{"text":"A"}]},{"lines":"oops"}]}}"#;
        let worker = worker(MockTransport::with_body(body), 4);

        let outcome = worker.submit(vec![1]).unwrap().outcome().await;
        assert_eq!(outcome, AnalyzeOutcome::Text("A ".to_string()));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let transport =
            MockTransport::with_body(HELLO_WORLD).with_delay(Duration::from_millis(50));
        let worker = worker(transport.clone(), 2);

        let handles: Vec<_> = (0..8u8)
            .map(|i| worker.submit(vec![i + 1]).unwrap())
            .collect();

        for handle in handles {
            assert!(handle.outcome().await.is_text());
        }

        assert_eq!(transport.calls(), 8);
        assert!(transport.peak_in_flight() <= 2);
        assert_eq!(worker.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_job_reports_failure() {
        let transport = MockTransport::with_body(HELLO_WORLD).with_delay(Duration::from_secs(30));
        let worker = worker(transport.clone(), 4);

        let handle = worker.submit(vec![1]).unwrap();
        handle.cancel();
        assert!(handle.is_cancelled());

        let outcome = handle.outcome().await;
        assert_eq!(
            outcome,
            AnalyzeOutcome::Failed(ANALYSIS_FAILURE_MESSAGE.to_string())
        );
    }

    #[tokio::test]
    async fn test_cancelling_one_job_leaves_others() {
        let transport =
            MockTransport::with_body(HELLO_WORLD).with_delay(Duration::from_millis(20));
        let worker = worker(transport, 4);

        let cancelled = worker.submit(vec![1]).unwrap();
        let kept = worker.submit(vec![2]).unwrap();
        cancelled.cancel();

        assert!(!cancelled.outcome().await.is_text());
        assert!(kept.outcome().await.is_text());
    }

    #[tokio::test]
    async fn test_shutdown_cancels_in_flight_jobs() {
        let transport = MockTransport::with_body(HELLO_WORLD).with_delay(Duration::from_secs(30));
        let worker = worker(transport.clone(), 1);

        let running = worker.submit(vec![1]).unwrap();
        let queued = worker.submit(vec![2]).unwrap();
        worker.shutdown();

        assert_eq!(running.outcome().await, AnalyzeOutcome::aborted());
        assert_eq!(queued.outcome().await, AnalyzeOutcome::aborted());
    }

    #[tokio::test]
    async fn test_repeated_submissions_are_independent() {
        let transport = MockTransport::with_body(HELLO_WORLD);
        let worker = worker(transport.clone(), 4);

        let first = worker.submit(vec![7; 16]).unwrap();
        let second = worker.submit(vec![7; 16]).unwrap();
        assert_ne!(first.job_id(), second.job_id());

        assert_eq!(first.outcome().await, second.outcome().await);
        assert_eq!(transport.calls(), 2);
    }
}
