//! Inbound receive loop: remote model events to downstream relay events.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::events::{EventSender, LogLevel, RelayEvent};
use super::playback::PlaybackBuffer;
use super::shutdown::{ShutdownReason, ShutdownSignal};
use crate::core::realtime::{RealtimeError, RemoteEvent, SharedRealtime};
use crate::utils::wav::pcm_to_wav;

pub(crate) struct ReceiveLoop {
    pub remote: SharedRealtime,
    pub shutdown: ShutdownSignal,
    pub events: EventSender,
    pub playback: PlaybackBuffer,
    pub output_sample_rate: u32,
    pub max_consecutive_failures: u32,
    pub reentry_delay: Duration,
    pub retry_delay: Duration,
}

impl ReceiveLoop {
    /// Consume remote events until shutdown or a fatal error. Returns the
    /// number of completed turns.
    pub async fn run(mut self) -> u64 {
        let mut turns: u64 = 0;
        let mut failures: u32 = 0;
        debug!("Receive loop started");

        while !self.shutdown.is_set() {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.remote.next_event() => next,
            };

            let delay = match next {
                Ok(Some(event)) => {
                    failures = 0;
                    if event == RemoteEvent::TurnComplete {
                        turns += 1;
                        debug!(turn = turns, "Turn complete");
                    }
                    if !self.handle_event(event) {
                        info!("Downstream sink closed, stopping receive loop");
                        self.shutdown.trigger(ShutdownReason::DownstreamClosed);
                        break;
                    }
                    continue;
                }
                Ok(None) => {
                    failures += 1;
                    debug!("Turn stream ended, re-entering");
                    self.reentry_delay
                }
                Err(e) if e.is_cancellation() => break,
                Err(e) if e.is_connection_closed() => {
                    error!("Gemini connection lost: {}", e);
                    self.events.log(LogLevel::Error, "Gemini connection lost");
                    self.shutdown.trigger(ShutdownReason::Fatal(e));
                    break;
                }
                Err(e) => {
                    failures += 1;
                    warn!(failures, "Receive error: {}", e);
                    self.events
                        .log(LogLevel::Warn, format!("Receive error: {e}"));
                    self.retry_delay
                }
            };

            if failures > self.max_consecutive_failures {
                error!(failures, "Giving up after consecutive receive failures");
                self.shutdown
                    .trigger(ShutdownReason::Fatal(RealtimeError::RetriesExhausted(
                        failures,
                    )));
                break;
            }

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        info!(turns, "Receive loop ended");
        turns
    }

    /// Apply one remote event. Returns `false` once the sink has gone away.
    fn handle_event(&mut self, event: RemoteEvent) -> bool {
        match event {
            RemoteEvent::Interrupted => {
                let dropped = self.playback.discard();
                debug!(dropped_bytes = dropped, "Interrupted");
                self.events.emit(RelayEvent::Interrupted)
            }
            RemoteEvent::Audio(pcm) => {
                self.playback.append(&pcm);
                if self.playback.should_flush() {
                    self.flush()
                } else {
                    !self.events.is_closed()
                }
            }
            RemoteEvent::Text(text) => self.events.emit(RelayEvent::Transcript(text)),
            RemoteEvent::TurnComplete => {
                if !self.playback.is_empty() && !self.flush() {
                    return false;
                }
                self.events.emit(RelayEvent::TurnComplete)
            }
        }
    }

    fn flush(&mut self) -> bool {
        let pcm = self.playback.take();
        match pcm_to_wav(&pcm, self.output_sample_rate) {
            Ok(wav) => self.events.emit(RelayEvent::Audio(wav)),
            Err(e) => {
                error!(bytes = pcm.len(), "Failed to frame audio: {}", e);
                !self.events.is_closed()
            }
        }
    }
}
