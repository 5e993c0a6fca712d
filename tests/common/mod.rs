//! Shared helpers for relay integration tests
//!
//! `EchoRemote` stands in for Gemini Live: every chunk sent upstream comes
//! back as an `Audio` event, and a `TurnComplete` follows every
//! `turn_every` chunks.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use voice_relay::ServerConfig;
use voice_relay::core::realtime::{
    BaseRealtime, ConnectionState, RealtimeConfig, RealtimeConnector, RealtimeError,
    RealtimeResult, RemoteEvent, SharedRealtime,
};
use voice_relay::core::relay::{EventReceiver, RelayConfig, RelayEvent, RelayTimings};

type EventItem = RealtimeResult<Option<RemoteEvent>>;

pub struct EchoRemote {
    turn_every: usize,
    events_tx: mpsc::UnboundedSender<EventItem>,
    events_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<EventItem>>,
    send_failures: parking_lot::Mutex<VecDeque<RealtimeError>>,
    sent: parking_lot::Mutex<Vec<Bytes>>,
    closes: AtomicUsize,
}

impl EchoRemote {
    pub fn new(turn_every: usize) -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            turn_every: turn_every.max(1),
            events_tx,
            events_rx: tokio::sync::Mutex::new(events_rx),
            send_failures: parking_lot::Mutex::new(VecDeque::new()),
            sent: parking_lot::Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        })
    }

    /// Make the next send fail with `err`
    pub fn fail_next_send(&self, err: RealtimeError) {
        self.send_failures.lock().push_back(err);
    }

    /// Inject a receive-side result
    pub fn inject(&self, item: EventItem) {
        let _ = self.events_tx.send(item);
    }

    pub fn sent(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseRealtime for EchoRemote {
    async fn send_audio(&self, audio: Bytes, _sample_rate: u32) -> RealtimeResult<()> {
        if let Some(err) = self.send_failures.lock().pop_front() {
            return Err(err);
        }
        let count = {
            let mut sent = self.sent.lock();
            sent.push(audio.clone());
            sent.len()
        };
        let _ = self.events_tx.send(Ok(Some(RemoteEvent::Audio(audio))));
        if count % self.turn_every == 0 {
            let _ = self.events_tx.send(Ok(Some(RemoteEvent::TurnComplete)));
        }
        Ok(())
    }

    async fn next_event(&self) -> RealtimeResult<Option<RemoteEvent>> {
        let next = self.events_rx.lock().await.recv().await;
        match next {
            Some(item) => item,
            None => std::future::pending().await,
        }
    }

    async fn close(&self) -> RealtimeResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn connection_state(&self) -> ConnectionState {
        if self.closes.load(Ordering::SeqCst) > 0 {
            ConnectionState::Closed
        } else {
            ConnectionState::Connected
        }
    }
}

/// Connector that hands out one prepared remote
pub struct EchoConnector {
    pub remote: Arc<EchoRemote>,
    pub connects: AtomicUsize,
    pub fail_with: Option<RealtimeError>,
}

impl EchoConnector {
    pub fn new(remote: Arc<EchoRemote>) -> Arc<Self> {
        Arc::new(Self {
            remote,
            connects: AtomicUsize::new(0),
            fail_with: None,
        })
    }

    pub fn failing(err: RealtimeError) -> Arc<Self> {
        Arc::new(Self {
            remote: EchoRemote::new(1),
            connects: AtomicUsize::new(0),
            fail_with: Some(err),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RealtimeConnector for EchoConnector {
    async fn connect(&self, _config: &RealtimeConfig) -> RealtimeResult<SharedRealtime> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let remote: SharedRealtime = self.remote.clone();
        Ok(remote)
    }
}

/// Relay settings with short timings for tests
pub fn relay_config(api_key: &str) -> RelayConfig {
    let realtime = RealtimeConfig {
        api_key: api_key.to_string(),
        ..Default::default()
    };
    let mut config = RelayConfig::new(realtime);
    config.timings = RelayTimings {
        queue_poll: Duration::from_millis(50),
        stream_reentry_delay: Duration::from_millis(10),
        receive_retry_delay: Duration::from_millis(10),
        supervise_poll: Duration::from_millis(50),
    };
    config
}

/// Minimal server configuration
pub fn server_config(api_key: Option<&str>) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        gemini_api_key: api_key.map(str::to_string),
        gemini_model: "gemini-2.5-flash-preview-native-audio-dialog".to_string(),
        gemini_voice: "Puck".to_string(),
        system_instruction: None,
        input_sample_rate: 16000,
        output_sample_rate: 24000,
        playback_buffer_bytes: 48000,
        max_receive_retries: 10,
        cors_allowed_origins: None,
    }
}

/// Next non-log relay event, waiting at most two seconds
pub async fn next_relay_event(rx: &mut EventReceiver) -> Option<RelayEvent> {
    loop {
        let notification = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()??;
        match notification.event {
            RelayEvent::Log { .. } => continue,
            event => return Some(event),
        }
    }
}
