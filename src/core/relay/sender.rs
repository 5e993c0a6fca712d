//! Outbound send loop: ingress queue to remote model.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::events::{EventSender, LogLevel};
use super::ingress::{AudioIngressReceiver, IngressItem};
use super::shutdown::{ShutdownReason, ShutdownSignal};
use crate::core::realtime::SharedRealtime;

/// Chunks between progress log lines.
const PROGRESS_LOG_INTERVAL: u64 = 100;

pub(crate) struct SendLoop {
    pub remote: SharedRealtime,
    pub ingress: AudioIngressReceiver,
    pub shutdown: ShutdownSignal,
    pub events: EventSender,
    pub sample_rate: u32,
    pub poll_interval: Duration,
}

impl SendLoop {
    /// Forward queued audio until the sentinel, shutdown or a closed
    /// connection. Returns the number of chunks sent.
    pub async fn run(mut self) -> u64 {
        let mut chunks_sent: u64 = 0;
        debug!("Audio send loop started");

        while !self.shutdown.is_set() {
            let item = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                item = timeout(self.poll_interval, self.ingress.recv()) => item,
            };

            let chunk = match item {
                Err(_) => continue,
                Ok(Some(IngressItem::Chunk(chunk))) => chunk,
                Ok(Some(IngressItem::End)) => {
                    debug!("Audio ingress finished");
                    break;
                }
                Ok(None) => {
                    debug!("Audio ingress dropped without end marker");
                    break;
                }
            };

            match self.remote.send_audio(chunk, self.sample_rate).await {
                Ok(()) => {
                    chunks_sent += 1;
                    if chunks_sent % PROGRESS_LOG_INTERVAL == 0 {
                        debug!(chunks_sent, "Sent audio chunks");
                    }
                }
                Err(e) if e.is_connection_closed() => {
                    error!("Gemini connection closed while sending audio: {}", e);
                    self.events.log(LogLevel::Error, "Gemini connection closed");
                    self.shutdown.trigger(ShutdownReason::Fatal(e));
                    break;
                }
                Err(e) if e.is_cancellation() => break,
                Err(e) => {
                    warn!("Dropping audio chunk after send error: {}", e);
                    self.events
                        .log(LogLevel::Error, format!("Error sending audio: {e}"));
                }
            }
        }

        info!(chunks_sent, "Audio send loop ended");
        chunks_sent
    }
}
