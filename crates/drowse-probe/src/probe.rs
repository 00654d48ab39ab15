//! Reachability probe and status snapshot types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What one probe observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    /// The environment answered with 2xx/3xx.
    Ready,
    /// The environment is unreachable, slow, or erroring.
    Waking,
}

/// Stored snapshot of the most recent probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStatus {
    pub state: ProbeState,
    /// Epoch seconds when the probe ran.
    pub ts: u64,
}

impl ProbeStatus {
    /// A snapshot older than `max_age` no longer proves anything — the
    /// recorder may have died, so readers must assume "waking".
    pub fn is_stale(&self, now: u64, max_age: Duration) -> bool {
        now.saturating_sub(self.ts) > max_age.as_secs()
    }
}

/// Probe the target URL once.
///
/// Any transport error, timeout, or non-2xx/3xx status is `Waking`.
pub async fn reachability_probe(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> ProbeState {
    match http.get(url).timeout(timeout).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() || status.is_redirection() {
                ProbeState::Ready
            } else {
                debug!(%url, status = status.as_u16(), "probe returned non-ready status");
                ProbeState::Waking
            }
        }
        Err(e) => {
            debug!(%url, error = %e, "probe failed");
            ProbeState::Waking
        }
    }
}
