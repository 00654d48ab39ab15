//! IdleReaper — the per-tick decision and orchestration engine.
//!
//! Each invocation is a pure function of (now, stored state, config): it
//! reads the armed flag, heartbeat, and dispatch guard from the parameter
//! store, and on the teardown path drains compute capacity (best effort)
//! before dispatching the destroy workflow exactly once. The guard is
//! written only after the dispatcher confirms the request.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use drowse_state::ParamStore;

use crate::config::ReaperConfig;
use crate::outcome::ReapOutcome;
use crate::read::{Read, read_armed, read_epoch};
use crate::traits::{ACTION_DESTROY, CapacityScaler, WorkflowDispatcher};

/// The idle reaper. Cheap to construct; all collaborators are injected.
pub struct IdleReaper {
    store: ParamStore,
    dispatcher: Arc<dyn WorkflowDispatcher>,
    scaler: Arc<dyn CapacityScaler>,
    config: ReaperConfig,
}

impl IdleReaper {
    /// Create a new reaper over the given store and collaborators.
    pub fn new(
        store: ParamStore,
        dispatcher: Arc<dyn WorkflowDispatcher>,
        scaler: Arc<dyn CapacityScaler>,
        config: ReaperConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            scaler,
            config,
        }
    }

    /// Evaluate one tick at wall-clock `now` (epoch seconds).
    ///
    /// Never panics and never propagates an error: every failure path is
    /// folded into a [`ReapOutcome`].
    pub async fn run_once(&self, now: u64) -> ReapOutcome {
        // 1. Arm check. Absent or unreadable means disarmed.
        match read_armed(&self.store, &self.config.armed_param) {
            Read::Found(true) => {}
            _ => return ReapOutcome::NotArmed,
        }

        // 2. Heartbeat. Without it idleness cannot be proven.
        let last = match read_epoch(&self.store, &self.config.heartbeat_param) {
            Read::Found(epoch) => epoch,
            _ => return ReapOutcome::NoHeartbeat,
        };

        // 3. Idleness.
        let idle_secs = now.saturating_sub(last);
        if idle_secs < self.config.idle_threshold_secs() {
            return ReapOutcome::Active { idle_secs };
        }

        // 4. Dispatch guard. A recent successful dispatch means a teardown
        //    is (or was) in flight; stand down for the cooldown window.
        match read_epoch(&self.store, &self.config.guard_param) {
            Read::Found(guard) => {
                let since_dispatch_secs = now.saturating_sub(guard);
                if since_dispatch_secs < self.config.cooldown_seconds {
                    return ReapOutcome::CoolingDown {
                        since_dispatch_secs,
                    };
                }
            }
            Read::Absent => {}
            Read::Unreadable => return ReapOutcome::GuardUnreadable,
        }

        // 5. Credential.
        let token = match self.store.get_secret(&self.config.token_param) {
            Ok(Some(token)) => token,
            Ok(None) => {
                return ReapOutcome::NoCredential {
                    reason: format!("parameter {} not found", self.config.token_param),
                };
            }
            Err(e) => {
                return ReapOutcome::NoCredential {
                    reason: e.to_string(),
                };
            }
        };

        // 6. Best-effort capacity drain. Never blocks the dispatch.
        if let Some(pool_id) = &self.config.pool_id {
            match self.scaler.scale_to_zero(pool_id).await {
                Ok(()) => info!(pool = %pool_id, "compute pool scaled to zero"),
                Err(e) => {
                    warn!(pool = %pool_id, error = %e, "capacity drain failed; continuing with dispatch")
                }
            }
        }

        // 7. Dispatch teardown.
        match self.dispatcher.dispatch(ACTION_DESTROY, &token).await {
            Ok(status) => {
                // Guard records the confirmed dispatch; a failed write
                // means the next tick may double-fire.
                if let Err(e) = self.store.put(&self.config.guard_param, &now.to_string()) {
                    error!(error = %e, "dispatch guard write failed");
                }
                ReapOutcome::Dispatched {
                    github_status: status,
                }
            }
            Err(e) => ReapOutcome::DispatchFailed {
                reason: e.to_string(),
            },
        }
    }

    /// Run the reaper loop until shutdown.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = interval.as_secs(), "idle reaper started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    let outcome = self.run_once(epoch_secs()).await;
                    if outcome.is_error() {
                        error!(outcome = ?outcome, "reap tick failed");
                    } else if outcome.is_noop() {
                        debug!(outcome = ?outcome, "reap tick");
                    } else {
                        info!(outcome = ?outcome, "reap tick dispatched teardown");
                    }
                }
                _ = shutdown.changed() => {
                    info!("idle reaper shutting down");
                    break;
                }
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
