//! Audio ingress queue between the client transport and the send loop.

use bytes::Bytes;
use tokio::sync::mpsc;

/// One item on the ingress queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressItem {
    /// PCM16 mono audio at the session's input rate
    Chunk(Bytes),
    /// No more audio will follow
    End,
}

/// Create an unbounded FIFO ingress queue.
pub fn audio_ingress() -> (AudioIngress, AudioIngressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AudioIngress { tx }, AudioIngressReceiver { rx })
}

/// Producer half, held by the client transport.
#[derive(Debug, Clone)]
pub struct AudioIngress {
    tx: mpsc::UnboundedSender<IngressItem>,
}

impl AudioIngress {
    /// Enqueue a chunk. Empty chunks are skipped.
    ///
    /// Returns `false` if the send loop is gone.
    pub fn push(&self, chunk: Bytes) -> bool {
        if chunk.is_empty() {
            return !self.tx.is_closed();
        }
        self.tx.send(IngressItem::Chunk(chunk)).is_ok()
    }

    /// Enqueue the end sentinel.
    pub fn finish(&self) -> bool {
        self.tx.send(IngressItem::End).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the send loop.
#[derive(Debug)]
pub struct AudioIngressReceiver {
    rx: mpsc::UnboundedReceiver<IngressItem>,
}

impl AudioIngressReceiver {
    /// Wait for the next item. `None` once every producer is dropped.
    pub async fn recv(&mut self) -> Option<IngressItem> {
        self.rx.recv().await
    }
}
