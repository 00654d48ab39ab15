//! Collaborator seams for the idle reaper.
//!
//! The reaper never talks to the network itself — it is handed a dispatcher
//! and a scaler at construction. Production implementations live in
//! `drowse-dispatch` and the daemon; tests substitute in-process doubles.

use async_trait::async_trait;

/// Workflow action that tears the environment down.
pub const ACTION_DESTROY: &str = "destroy";

/// Workflow action that brings the environment up.
pub const ACTION_APPLY: &str = "apply";

/// Delivers one logical "run workflow" request to the external CI/CD system.
///
/// Implementations own their retry behavior; by the time this returns the
/// request either reached the dispatcher (Ok, with the upstream HTTP status
/// for logging) or terminally failed. The caller owns all outcome recording.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    async fn dispatch(&self, action: &str, token: &str) -> anyhow::Result<u16>;
}

/// Sets a compute pool's minimum and desired capacity to zero.
///
/// Invoked best-effort before teardown dispatch so in-flight compute cost
/// stops accruing immediately; callers log and swallow failures.
#[async_trait]
pub trait CapacityScaler: Send + Sync {
    async fn scale_to_zero(&self, pool_id: &str) -> anyhow::Result<()>;
}
