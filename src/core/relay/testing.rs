//! Scripted remote model for relay unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::core::realtime::{
    BaseRealtime, ConnectionState, RealtimeError, RealtimeResult, RemoteEvent,
};

pub(crate) type Script = mpsc::UnboundedSender<RealtimeResult<Option<RemoteEvent>>>;

/// Remote whose receive side replays a script and whose send side records.
///
/// Once the script sender is dropped and drained, `next_event` pends forever.
pub(crate) struct ScriptedRemote {
    sent: parking_lot::Mutex<Vec<(Bytes, u32)>>,
    send_failures: parking_lot::Mutex<VecDeque<RealtimeError>>,
    script: tokio::sync::Mutex<mpsc::UnboundedReceiver<RealtimeResult<Option<RemoteEvent>>>>,
    closes: AtomicUsize,
}

impl ScriptedRemote {
    pub fn new() -> (Arc<Self>, Script) {
        let (tx, rx) = mpsc::unbounded_channel();
        let remote = Arc::new(Self {
            sent: parking_lot::Mutex::new(Vec::new()),
            send_failures: parking_lot::Mutex::new(VecDeque::new()),
            script: tokio::sync::Mutex::new(rx),
            closes: AtomicUsize::new(0),
        });
        (remote, tx)
    }

    pub fn fail_next_send(&self, err: RealtimeError) {
        self.send_failures.lock().push_back(err);
    }

    pub fn sent(&self) -> Vec<(Bytes, u32)> {
        self.sent.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BaseRealtime for ScriptedRemote {
    async fn send_audio(&self, audio: Bytes, sample_rate: u32) -> RealtimeResult<()> {
        if let Some(err) = self.send_failures.lock().pop_front() {
            return Err(err);
        }
        self.sent.lock().push((audio, sample_rate));
        Ok(())
    }

    async fn next_event(&self) -> RealtimeResult<Option<RemoteEvent>> {
        let next = self.script.lock().await.recv().await;
        match next {
            Some(result) => result,
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
