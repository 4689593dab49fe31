//! Mock transport for testing.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::{Error, OcrRequest, OcrTransport, Result};

/// What the mock answers with.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// A 2xx response with this body.
    Body(String),
    /// A non-2xx response.
    Status(u16),
    /// A connection failure.
    Network,
}

/// Mock transport that never touches the network.
///
/// Records how many calls it received and the highest number of calls
/// that were in flight at once.
#[derive(Debug, Clone)]
pub struct MockTransport {
    reply: MockReply,
    delay: Option<Duration>,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockTransport {
    /// Creates a mock that answers every call with `reply`.
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            delay: None,
            calls: Arc::default(),
            in_flight: Arc::default(),
            peak_in_flight: Arc::default(),
        }
    }

    /// Creates a mock answering with a successful `body`.
    pub fn with_body(body: impl Into<String>) -> Self {
        Self::new(MockReply::Body(body.into()))
    }

    /// Delays every answer by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the number of calls received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Returns the number of calls currently waiting for an answer.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Returns the highest number of concurrent calls observed.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the call is cancelled.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl OcrTransport for MockTransport {
    async fn send(&self, _request: &OcrRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            MockReply::Body(body) => Ok(body.clone()),
            MockReply::Status(status) => Err(Error::transport()
                .with_status(*status)
                .with_message(format!("provider returned status {status}"))),
            MockReply::Network => Err(Error::transport().with_message("connection refused")),
        }
    }
}
