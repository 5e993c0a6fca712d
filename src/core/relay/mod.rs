//! Session relay between a client and the remote model.
//!
//! Audio flows client → [`AudioIngress`] → send loop → remote model. Remote
//! events flow back through the receive loop, which buffers audio into
//! WAV-framed blocks and emits [`RelayNotification`]s to the client side.
//! [`RelaySession`] owns the [`ShutdownSignal`] and supervises both loops.

mod events;
mod ingress;
mod playback;
mod receiver;
mod sender;
mod session;
mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{
    EventReceiver, EventSender, LogLevel, RelayEvent, RelayNotification, event_channel, now_millis,
};
pub use ingress::{AudioIngress, AudioIngressReceiver, IngressItem, audio_ingress};
pub use playback::{DEFAULT_PLAYBACK_TARGET_BYTES, PlaybackBuffer};
pub use session::{
    DEFAULT_MAX_RECEIVE_FAILURES, RelayConfig, RelaySession, RelayTimings, SessionSummary,
};
pub use shutdown::{ShutdownReason, ShutdownSignal};
