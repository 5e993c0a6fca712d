//! Remote streaming speech model module.
//!
//! This module provides the abstraction the session relay talks to and the
//! Gemini Live implementation of it.
//!
//! # Architecture
//!
//! - `RealtimeConnector` opens one connection per session
//! - `BaseRealtime` sends audio upstream and yields `RemoteEvent`s downstream
//! - `RealtimeError` classifies failures as configuration, closed, transient
//!   or cancellation

mod base;
pub mod gemini;

pub use base::{
    BaseRealtime, ConnectionState, DEFAULT_INPUT_SAMPLE_RATE, DEFAULT_OUTPUT_SAMPLE_RATE,
    DEFAULT_SETUP_TIMEOUT, RealtimeConfig, RealtimeConnector, RealtimeError, RealtimeResult,
    RemoteEvent, SharedRealtime,
};
pub use gemini::{GeminiConnector, GeminiLive, GeminiVoice};
