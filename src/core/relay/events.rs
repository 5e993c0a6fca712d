//! Downstream relay events and the sender that delivers them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::mpsc;

/// Severity of a session log line forwarded to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// An event produced by a relay session for the downstream sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayEvent {
    /// A WAV-framed block of assistant audio
    Audio(Bytes),
    /// Assistant text
    Transcript(String),
    /// The assistant finished its turn
    TurnComplete,
    /// The user interrupted the assistant
    Interrupted,
    /// The session failed; no further events follow
    Error(String),
    /// Progress message about the session itself
    Log { level: LogLevel, message: String },
}

/// A relay event stamped with wall-clock milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayNotification {
    pub event: RelayEvent,
    pub timestamp_ms: u64,
}

impl RelayNotification {
    pub fn now(event: RelayEvent) -> Self {
        Self {
            event,
            timestamp_ms: now_millis(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Receiving half of a session's event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<RelayNotification>;

/// Create a connected event sender and receiver.
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventSender {
            tx,
            errored: Arc::new(AtomicBool::new(false)),
        },
        rx,
    )
}

/// Sending half of a session's event stream.
///
/// The first `Error` latches the sender: it is delivered, and every event
/// emitted afterwards is dropped.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RelayNotification>,
    errored: Arc<AtomicBool>,
}

impl EventSender {
    /// Emit an event.
    ///
    /// Returns `false` once the downstream receiver has gone away. Events
    /// suppressed by the error latch still return `true`.
    pub fn emit(&self, event: RelayEvent) -> bool {
        if let RelayEvent::Error(message) = event {
            return self.emit_error(message);
        }
        if self.errored.load(Ordering::SeqCst) {
            return !self.tx.is_closed();
        }
        self.tx.send(RelayNotification::now(event)).is_ok()
    }

    /// Emit the session's single `Error` event. Later calls are dropped.
    pub fn emit_error(&self, message: impl Into<String>) -> bool {
        if self.errored.swap(true, Ordering::SeqCst) {
            return !self.tx.is_closed();
        }
        self.tx
            .send(RelayNotification::now(RelayEvent::Error(message.into())))
            .is_ok()
    }

    /// Forward a session log line.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) -> bool {
        self.emit(RelayEvent::Log {
            level,
            message: message.into(),
        })
    }

    /// Whether the downstream receiver has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
