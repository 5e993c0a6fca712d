use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::realtime::{GeminiConnector, RealtimeConnector};

/// Application state shared across handlers
pub struct AppState {
    pub config: ServerConfig,
    /// Opens remote model sessions for new relay connections
    pub connector: Arc<dyn RealtimeConnector>,
}

impl AppState {
    /// Create state backed by the Gemini Live connector
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_connector(config, Arc::new(GeminiConnector))
    }

    /// Create state with a custom connector
    pub fn with_connector(
        config: ServerConfig,
        connector: Arc<dyn RealtimeConnector>,
    ) -> Arc<Self> {
        Arc::new(Self { config, connector })
    }
}
