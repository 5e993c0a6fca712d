//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `realtime` - Voice relay WebSocket

pub mod api;
pub mod realtime;

pub use realtime::realtime_handler;
