//! Per-session shutdown signal.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::realtime::RealtimeError;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The owner of the session asked it to stop
    Requested,
    /// Both relay loops finished on their own
    Completed,
    /// The downstream event sink went away
    DownstreamClosed,
    /// An unrecoverable error ended the session
    Fatal(RealtimeError),
}

impl ShutdownReason {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ShutdownReason::Fatal(_))
    }

    /// The error to surface, if this reason is fatal.
    pub fn error(&self) -> Option<&RealtimeError> {
        match self {
            ShutdownReason::Fatal(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Requested => write!(f, "requested"),
            ShutdownReason::Completed => write!(f, "completed"),
            ShutdownReason::DownstreamClosed => write!(f, "downstream closed"),
            ShutdownReason::Fatal(err) => write!(f, "fatal: {err}"),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    set: AtomicBool,
    token: CancellationToken,
    reason: Mutex<Option<ShutdownReason>>,
}

/// Edge-triggered, clonable shutdown flag.
///
/// Once set it stays set. The first trigger records the reason; later
/// triggers are no-ops.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Returns `true` if this call set it.
    pub fn trigger(&self, reason: ShutdownReason) -> bool {
        let mut slot = self.inner.reason.lock();
        if self.inner.set.swap(true, Ordering::SeqCst) {
            return false;
        }
        tracing::debug!(reason = %reason, "Session shutdown triggered");
        *slot = Some(reason);
        drop(slot);
        self.inner.token.cancel();
        true
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::SeqCst)
    }

    /// Resolves once the signal is set.
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// The reason recorded by the first trigger.
    pub fn reason(&self) -> Option<ShutdownReason> {
        self.inner.reason.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_first_trigger_wins() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_set());
        assert!(signal.reason().is_none());

        assert!(signal.trigger(ShutdownReason::DownstreamClosed));
        assert!(!signal.trigger(ShutdownReason::Requested));

        assert!(signal.is_set());
        assert_eq!(signal.reason(), Some(ShutdownReason::DownstreamClosed));
    }

    #[test]
    fn test_clones_share_state() {
        let signal = ShutdownSignal::new();
        let clone = signal.clone();
        clone.trigger(ShutdownReason::Completed);
        assert!(signal.is_set());
        assert_eq!(signal.reason(), Some(ShutdownReason::Completed));
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let signal = ShutdownSignal::new();
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.cancelled().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger(ShutdownReason::Requested);

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_when_already_set() {
        let signal = ShutdownSignal::new();
        signal.trigger(ShutdownReason::Requested);
        tokio::time::timeout(Duration::from_millis(100), signal.cancelled())
            .await
            .unwrap();
    }

    #[test]
    fn test_fatal_reason() {
        let reason = ShutdownReason::Fatal(RealtimeError::ConnectionClosed("1008".to_string()));
        assert!(reason.is_fatal());
        assert!(reason.error().unwrap().is_connection_closed());
        assert!(reason.to_string().starts_with("fatal:"));

        assert!(!ShutdownReason::Requested.is_fatal());
        assert!(ShutdownReason::Completed.error().is_none());
    }
}
