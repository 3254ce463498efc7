//! Exactly-once envelope acknowledgement.
//!
//! The gateway expects every interaction and slash command envelope to be
//! acknowledged within a short window. An [`Ack`] is handed to the handler;
//! the first [`send`](Ack::send) delivers the acknowledgement and every later
//! call is a no-op. If the handler never acknowledges, the framework does so
//! after the handler returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{trace, warn};

use parley_core::BoxedGateway;

/// Default acknowledgement window.
pub const DEFAULT_ACK_WINDOW: Duration = Duration::from_secs(3);

/// The result of an acknowledgement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The acknowledgement was delivered.
    Sent,
    /// An earlier call already acknowledged the envelope.
    AlreadySent,
    /// The event carried no envelope id.
    NotRequired,
    /// Delivery failed; the failure was logged.
    Failed,
}

struct AckInner {
    envelope_id: Option<String>,
    gateway: BoxedGateway,
    sent: AtomicBool,
    received_at: Instant,
    window: Duration,
}

/// A one-shot acknowledgement handle for a received envelope.
#[derive(Clone)]
pub struct Ack {
    inner: Arc<AckInner>,
}

impl Ack {
    /// Creates a handle; the window starts now.
    pub fn new(envelope_id: Option<String>, gateway: BoxedGateway, window: Duration) -> Self {
        Self {
            inner: Arc::new(AckInner {
                envelope_id,
                gateway,
                sent: AtomicBool::new(false),
                received_at: Instant::now(),
                window,
            }),
        }
    }

    /// The envelope id, if the event carried one.
    pub fn envelope_id(&self) -> Option<&str> {
        self.inner.envelope_id.as_deref()
    }

    /// Returns `true` once an acknowledgement has been attempted.
    pub fn is_sent(&self) -> bool {
        self.inner.sent.load(Ordering::SeqCst)
    }

    /// Acknowledges the envelope, optionally with a response payload.
    ///
    /// Only the first call does anything. Late or failed acknowledgements
    /// are logged as warnings.
    pub async fn send(&self, payload: Option<Value>) -> AckOutcome {
        let inner = &self.inner;
        if inner.sent.swap(true, Ordering::SeqCst) {
            trace!("Envelope already acknowledged");
            return AckOutcome::AlreadySent;
        }

        let Some(envelope_id) = inner.envelope_id.as_deref() else {
            return AckOutcome::NotRequired;
        };

        let elapsed = inner.received_at.elapsed();
        if elapsed > inner.window {
            warn!(
                envelope_id,
                ?elapsed,
                window = ?inner.window,
                "Acknowledgement sent after the ack window"
            );
        }

        match inner.gateway.ack(envelope_id, payload).await {
            Ok(()) => AckOutcome::Sent,
            Err(e) => {
                warn!(envelope_id, error = %e, "Failed to acknowledge envelope");
                AckOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ack")
            .field("envelope_id", &self.inner.envelope_id)
            .field("sent", &self.is_sent())
            .finish_non_exhaustive()
    }
}
