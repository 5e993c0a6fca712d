//! Voice relay WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::realtime_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the voice relay WebSocket router
///
/// # Endpoint
///
/// `GET /ws` - WebSocket upgrade for a Gemini Live voice session
///
/// # Protocol
///
/// After the upgrade, clients stream binary frames of 16-bit little-endian
/// mono PCM at the configured input rate.
///
/// Server responds with:
/// - `session_started` once the connection is accepted
/// - `audio` with base64 WAV blocks of assistant speech
/// - `transcript` for assistant text
/// - `assistant_silent` when the assistant finishes a turn
/// - `interrupted` when the user talks over the assistant
/// - `error` on failures, followed by a close frame
///
/// # Example
///
/// ```json
/// // Server greets
/// {"type": "session_started", "session_id": "..."}
///
/// // Client streams binary PCM, server answers
/// {"type": "audio", "data": "UklGR...", "timestamp_ms": 1718000000000}
/// {"type": "assistant_silent", "timestamp_ms": 1718000000500}
///
/// // Client hangs up
/// {"type": "end_session"}
/// ```
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws", get(realtime_handler))
        .layer(TraceLayer::new_for_http())
}
