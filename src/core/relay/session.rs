//! Session coordinator.
//!
//! A `RelaySession` connects to the remote model, runs the send and receive
//! loops as independent tasks, supervises them as a unit and tears everything
//! down exactly once, whichever way the session ends.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use super::events::{EventSender, LogLevel};
use super::ingress::AudioIngressReceiver;
use super::playback::{DEFAULT_PLAYBACK_TARGET_BYTES, PlaybackBuffer};
use super::receiver::ReceiveLoop;
use super::sender::SendLoop;
use super::shutdown::{ShutdownReason, ShutdownSignal};
use crate::core::realtime::{
    RealtimeConfig, RealtimeConnector, RealtimeError, RealtimeResult, SharedRealtime,
};

/// Default ceiling on consecutive receive failures.
pub const DEFAULT_MAX_RECEIVE_FAILURES: u32 = 10;

/// How long a loop gets to exit on its own once shutdown is set.
const STOP_GRACE: Duration = Duration::from_millis(250);

// =============================================================================
// Configuration
// =============================================================================

/// Wait and poll intervals used by the relay loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayTimings {
    /// Bounded wait on the ingress queue
    pub queue_poll: Duration,
    /// Pause before re-entering an ended turn stream
    pub stream_reentry_delay: Duration,
    /// Pause after a transient receive error
    pub receive_retry_delay: Duration,
    /// Bounded wait while supervising the loops
    pub supervise_poll: Duration,
}

impl Default for RelayTimings {
    fn default() -> Self {
        Self {
            queue_poll: Duration::from_millis(500),
            stream_reentry_delay: Duration::from_millis(100),
            receive_retry_delay: Duration::from_millis(500),
            supervise_poll: Duration::from_secs(1),
        }
    }
}

/// Per-session relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub realtime: RealtimeConfig,
    /// Playback flush threshold in bytes
    pub playback_target_bytes: usize,
    pub max_consecutive_receive_failures: u32,
    pub timings: RelayTimings,
}

impl RelayConfig {
    pub fn new(realtime: RealtimeConfig) -> Self {
        Self {
            realtime,
            playback_target_bytes: DEFAULT_PLAYBACK_TARGET_BYTES,
            max_consecutive_receive_failures: DEFAULT_MAX_RECEIVE_FAILURES,
            timings: RelayTimings::default(),
        }
    }
}

/// Outcome of a session that ended without a fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub reason: ShutdownReason,
    pub chunks_sent: u64,
    pub turns_completed: u64,
}

// =============================================================================
// Task supervision
// =============================================================================

async fn join_slot<T>(slot: &mut Option<JoinHandle<T>>) -> Result<T, JoinError> {
    match slot {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// The two relay tasks plus the remote they share.
///
/// `teardown` runs at most once. Dropping the value before teardown aborts the
/// tasks and schedules the remote close on the current runtime.
struct SessionTasks {
    remote: SharedRealtime,
    shutdown: ShutdownSignal,
    send: Option<JoinHandle<u64>>,
    receive: Option<JoinHandle<u64>>,
    chunks_sent: u64,
    turns_completed: u64,
    torn_down: bool,
}

impl SessionTasks {
    fn on_joined(&self, name: &str, result: &Result<u64, JoinError>) {
        match result {
            Ok(_) => debug!(task = name, "Relay task finished"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                error!(task = name, "Relay task failed: {}", e);
                self.shutdown
                    .trigger(ShutdownReason::Fatal(RealtimeError::TaskFailed(format!(
                        "{name} loop panicked"
                    ))));
            }
        }
    }

    /// Wait until shutdown is set, a task fails or both tasks finish.
    async fn supervise(&mut self, poll: Duration) {
        loop {
            if self.shutdown.is_set() {
                return;
            }
            if self.send.is_none() && self.receive.is_none() {
                self.shutdown.trigger(ShutdownReason::Completed);
                return;
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => return,
                result = join_slot(&mut self.send) => {
                    self.send = None;
                    if let Ok(sent) = result {
                        self.chunks_sent = sent;
                    }
                    self.on_joined("send", &result);
                }
                result = join_slot(&mut self.receive) => {
                    self.receive = None;
                    if let Ok(turns) = result {
                        self.turns_completed = turns;
                    }
                    self.on_joined("receive", &result);
                }
                _ = tokio::time::sleep(poll) => {}
            }
        }
    }

    async fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.shutdown.trigger(ShutdownReason::Requested);

        if let Some(handle) = self.send.take()
            && let Some(sent) = stop_task("send", handle).await
        {
            self.chunks_sent = sent;
        }
        if let Some(handle) = self.receive.take()
            && let Some(turns) = stop_task("receive", handle).await
        {
            self.turns_completed = turns;
        }

        if let Err(e) = self.remote.close().await {
            warn!("Failed to close remote connection: {}", e);
        }
    }
}

/// Give a loop `STOP_GRACE` to observe shutdown, then abort it.
async fn stop_task(name: &str, mut handle: JoinHandle<u64>) -> Option<u64> {
    let result = match tokio::time::timeout(STOP_GRACE, &mut handle).await {
        Ok(result) => result,
        Err(_) => {
            debug!(task = name, "Aborting relay task");
            handle.abort();
            handle.await
        }
    };
    match result {
        Ok(count) => Some(count),
        Err(e) if e.is_cancelled() => None,
        Err(e) => {
            warn!(task = name, "Relay task failed during teardown: {}", e);
            None
        }
    }
}

impl Drop for SessionTasks {
    fn drop(&mut self) {
        if self.torn_down {
            return;
        }
        self.shutdown.trigger(ShutdownReason::Requested);
        for handle in [self.send.take(), self.receive.take()].into_iter().flatten() {
            handle.abort();
        }
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let remote = self.remote.clone();
                runtime.spawn(async move {
                    if let Err(e) = remote.close().await {
                        warn!("Failed to close remote connection after drop: {}", e);
                    }
                });
            }
            Err(_) => warn!("Relay session dropped outside a runtime; remote left open"),
        }
    }
}

// =============================================================================
// Relay Session
// =============================================================================

/// One relay session between a client and the remote model.
pub struct RelaySession {
    id: String,
    config: RelayConfig,
    connector: Arc<dyn RealtimeConnector>,
    events: EventSender,
    shutdown: ShutdownSignal,
}

impl RelaySession {
    pub fn new(
        config: RelayConfig,
        connector: Arc<dyn RealtimeConnector>,
        events: EventSender,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            config,
            connector,
            events,
            shutdown: ShutdownSignal::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle for stopping the session from outside.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Run the session to completion.
    ///
    /// Returns `Err` with the fatal error after emitting it as the session's
    /// single `Error` event. Graceful endings return a summary.
    pub async fn run(self, ingress: AudioIngressReceiver) -> RealtimeResult<SessionSummary> {
        let span = tracing::info_span!("relay_session", session_id = %self.id);
        self.run_inner(ingress).instrument(span).await
    }

    async fn run_inner(self, ingress: AudioIngressReceiver) -> RealtimeResult<SessionSummary> {
        if let Err(e) = self.config.realtime.validate_credential() {
            error!("Refusing to start session: {}", e);
            return Err(self.fail(e));
        }

        self.events
            .log(LogLevel::Info, "Connecting to Gemini Live...");

        let connect = self.connector.connect(&self.config.realtime);
        let remote = match self.until_shutdown(connect).await {
            None => {
                info!("Session stopped before the remote connection was ready");
                return Ok(self.summary(0, 0));
            }
            Some(Ok(remote)) => remote,
            Some(Err(e)) => {
                error!("Failed to connect to Gemini Live: {}", e);
                return Err(self.fail(e));
            }
        };

        self.events.log(LogLevel::Info, "Connected to Gemini Live");
        info!("Relay session started");

        let timings = self.config.timings;
        let send = SendLoop {
            remote: remote.clone(),
            ingress,
            shutdown: self.shutdown.clone(),
            events: self.events.clone(),
            sample_rate: self.config.realtime.input_sample_rate,
            poll_interval: timings.queue_poll,
        };
        let receive = ReceiveLoop {
            remote: remote.clone(),
            shutdown: self.shutdown.clone(),
            events: self.events.clone(),
            playback: PlaybackBuffer::new(self.config.playback_target_bytes),
            output_sample_rate: self.config.realtime.output_sample_rate,
            max_consecutive_failures: self.config.max_consecutive_receive_failures,
            reentry_delay: timings.stream_reentry_delay,
            retry_delay: timings.receive_retry_delay,
        };

        let mut tasks = SessionTasks {
            remote,
            shutdown: self.shutdown.clone(),
            send: Some(tokio::spawn(send.run())),
            receive: Some(tokio::spawn(receive.run())),
            chunks_sent: 0,
            turns_completed: 0,
            torn_down: false,
        };

        tasks.supervise(timings.supervise_poll).await;
        tasks.teardown().await;

        let summary = self.summary(tasks.chunks_sent, tasks.turns_completed);
        info!(
            reason = %summary.reason,
            chunks_sent = summary.chunks_sent,
            turns_completed = summary.turns_completed,
            "Relay session ended"
        );

        match summary.reason.error() {
            Some(err) => Err(self.fail(err.clone())),
            None => {
                self.events.log(LogLevel::Warn, "Gemini session ended");
                Ok(summary)
            }
        }
    }

    /// Run `fut` unless shutdown is set first.
    async fn until_shutdown<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            output = fut => Some(output),
        }
    }

    /// Record a fatal error and surface it downstream once.
    fn fail(&self, err: RealtimeError) -> RealtimeError {
        self.shutdown.trigger(ShutdownReason::Fatal(err.clone()));
        let message = if err.is_configuration() {
            format!("Gemini is not configured: {err}")
        } else {
            format!("Gemini error: {err}")
        };
        self.events.log(LogLevel::Error, message.clone());
        self.events.emit_error(message);
        err
    }

    fn summary(&self, chunks_sent: u64, turns_completed: u64) -> SessionSummary {
        SessionSummary {
            session_id: self.id.clone(),
            reason: self.shutdown.reason().unwrap_or(ShutdownReason::Requested),
            chunks_sent,
            turns_completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::realtime::RemoteEvent;
    use crate::core::relay::events::{RelayEvent, event_channel};
    use crate::core::relay::ingress::audio_ingress;
    use crate::core::relay::testing::{Script, ScriptedRemote};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct OneShotConnector {
        remote: Mutex<Option<Arc<ScriptedRemote>>>,
        calls: Mutex<u32>,
    }

    impl OneShotConnector {
        fn new(remote: Arc<ScriptedRemote>) -> Arc<Self> {
            Arc::new(Self {
                remote: Mutex::new(Some(remote)),
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl RealtimeConnector for OneShotConnector {
        async fn connect(&self, _config: &RealtimeConfig) -> RealtimeResult<SharedRealtime> {
            *self.calls.lock() += 1;
            match self.remote.lock().take() {
                Some(remote) => Ok(remote),
                None => Err(RealtimeError::ConnectionFailed("used".to_string())),
            }
        }
    }

    fn fast_config(api_key: &str) -> RelayConfig {
        RelayConfig {
            realtime: RealtimeConfig {
                api_key: api_key.to_string(),
                ..Default::default()
            },
            playback_target_bytes: 48_000,
            max_consecutive_receive_failures: 3,
            timings: RelayTimings {
                queue_poll: Duration::from_millis(20),
                stream_reentry_delay: Duration::from_millis(5),
                receive_retry_delay: Duration::from_millis(5),
                supervise_poll: Duration::from_millis(50),
            },
        }
    }

    fn session_with_remote(
        api_key: &str,
    ) -> (
        RelaySession,
        Arc<ScriptedRemote>,
        Script,
        crate::core::relay::events::EventReceiver,
    ) {
        let (remote, script) = ScriptedRemote::new();
        let (events, events_rx) = event_channel();
        let connector = OneShotConnector::new(remote.clone());
        let session = RelaySession::new(fast_config(api_key), connector, events);
        (session, remote, script, events_rx)
    }

    #[tokio::test]
    async fn test_external_shutdown_tears_down_once() {
        let (session, remote, _script, _events_rx) = session_with_remote("key");
        let (_ingress, rx) = audio_ingress();
        let shutdown = session.shutdown_signal();

        let handle = tokio::spawn(session.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger(ShutdownReason::Requested);
        shutdown.trigger(ShutdownReason::Requested);

        let summary = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("session should stop within a second")
            .unwrap()
            .unwrap();
        assert_eq!(summary.reason, ShutdownReason::Requested);
        assert_eq!(remote.close_count(), 1);
    }

    #[tokio::test]
    async fn test_receive_side_close_surfaces_one_error() {
        let (session, remote, script, mut events_rx) = session_with_remote("key");
        let (_ingress, rx) = audio_ingress();

        script
            .send(Err(RealtimeError::ConnectionClosed("1008".to_string())))
            .unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), session.run(rx))
            .await
            .unwrap();

        assert!(matches!(result, Err(RealtimeError::ConnectionClosed(_))));
        assert_eq!(remote.close_count(), 1);

        let mut errors = 0;
        while let Ok(notification) = events_rx.try_recv() {
            if matches!(notification.event, RelayEvent::Error(_)) {
                errors += 1;
            }
        }
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_blank_credential_never_connects() {
        let (remote, _script) = ScriptedRemote::new();
        let connector = OneShotConnector::new(remote);
        let (events, mut events_rx) = event_channel();
        let session = RelaySession::new(fast_config("  "), connector.clone(), events);
        let (_ingress, rx) = audio_ingress();

        let result = session.run(rx).await;
        assert!(matches!(result, Err(RealtimeError::InvalidConfiguration(_))));
        assert_eq!(*connector.calls.lock(), 0);

        let mut saw_error = false;
        while let Ok(notification) = events_rx.try_recv() {
            if let RelayEvent::Error(message) = notification.event {
                assert!(message.contains("not configured"));
                saw_error = true;
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn test_turn_events_flow_through_session() {
        let (session, _remote, script, mut events_rx) = session_with_remote("key");
        let (_ingress, rx) = audio_ingress();
        let shutdown = session.shutdown_signal();
        let handle = tokio::spawn(session.run(rx));

        script
            .send(Ok(Some(RemoteEvent::Text("hi there".to_string()))))
            .unwrap();
        script.send(Ok(Some(RemoteEvent::TurnComplete))).unwrap();

        let mut seen = Vec::new();
        while seen.len() < 2 {
            let notification = tokio::time::timeout(Duration::from_secs(1), events_rx.recv())
                .await
                .unwrap()
                .unwrap();
            match notification.event {
                RelayEvent::Log { .. } => {}
                event => seen.push(event),
            }
        }
        assert_eq!(
            seen,
            vec![
                RelayEvent::Transcript("hi there".to_string()),
                RelayEvent::TurnComplete
            ]
        );

        shutdown.trigger(ShutdownReason::Requested);
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.turns_completed, 1);
    }

    #[tokio::test]
    async fn test_dropped_session_future_closes_remote() {
        let (session, remote, _script, _events_rx) = session_with_remote("key");
        let (_ingress, rx) = audio_ingress();
        let shutdown = session.shutdown_signal();

        let handle = tokio::spawn(session.run(rx));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();
        let _ = handle.await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(shutdown.is_set());
        assert_eq!(remote.close_count(), 1);
    }
}
