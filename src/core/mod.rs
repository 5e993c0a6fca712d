pub mod realtime;
pub mod relay;

// Re-export commonly used types for convenience
pub use realtime::{
    BaseRealtime, GeminiConnector, GeminiLive, RealtimeConfig, RealtimeConnector, RealtimeError,
    RealtimeResult, RemoteEvent,
};
pub use relay::{
    AudioIngress, EventSender, RelayConfig, RelayEvent, RelayNotification, RelaySession,
    ShutdownReason, ShutdownSignal, audio_ingress, event_channel,
};
