//! Voice relay WebSocket endpoint
//!
//! Bridges a browser or SDK client to a Gemini Live session:
//!
//! - Client sends binary frames of 16-bit little-endian mono PCM
//! - Client may send `{"type": "end_session"}` to hang up
//! - Server sends `session_started`, `audio`, `transcript`,
//!   `assistant_silent`, `interrupted`, `error` and `server_log` messages

mod handler;
pub mod messages;

pub use handler::realtime_handler;
pub use messages::{
    ASSISTANT_SPEAKER, RealtimeIncomingMessage, RealtimeMessageRoute, RealtimeOutgoingMessage,
};
