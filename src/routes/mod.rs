pub mod api;
pub mod realtime;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Create the full application router with state applied
pub fn create_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(realtime::create_realtime_router())
        .with_state(state)
}
