//! drowse-api — public HTTP surface for the demo environment.
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/status` | Environment state: `ready` or `waking` |
//! | POST | `/wake` | Dispatch the "apply" workflow to bring the environment up |
//! | GET | `/healthz` | Daemon liveness |
//!
//! `/status` never errors toward callers: anything short of a fresh ready
//! snapshot reads as `waking`. Responses are marked `no-store` — browsers
//! poll this while the environment boots.

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};

use drowse_core::WorkflowDispatcher;
use drowse_state::ParamStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: ParamStore,
    pub dispatcher: Arc<dyn WorkflowDispatcher>,
    /// Parameter holding the workflow bearer credential.
    pub token_param: String,
    /// Parameter holding the probe status snapshot.
    pub status_param: String,
    /// Snapshot age beyond which `/status` reports waking.
    pub status_stale_after: Duration,
}

/// Build the API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/wake", post(handlers::wake))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
