//! HeartbeatRecorder — probes the environment and records what it saw.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use drowse_core::config::{ConfigError, required, var_or};
use drowse_state::{ParamStore, StateError, StateResult};

use crate::probe::{ProbeState, ProbeStatus, reachability_probe};

/// Configuration for the heartbeat recorder.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Public URL of the target environment.
    pub target_url: String,
    /// Timeout per probe request.
    pub probe_timeout: Duration,
    /// Parameter overwritten with `now` on each ready observation.
    pub heartbeat_param: String,
    /// Parameter holding the JSON status snapshot of the last probe.
    pub status_param: String,
}

impl ProbeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration through an arbitrary lookup (for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            target_url: required(&lookup, "DROWSE_TARGET_URL")?,
            probe_timeout: timeout_or(&lookup, "DROWSE_PROBE_TIMEOUT_SECS", 2.5)?,
            heartbeat_param: var_or(&lookup, "DROWSE_HEARTBEAT_PARAM", "/drowse/last_heartbeat"),
            status_param: var_or(&lookup, "DROWSE_STATUS_PARAM", "/drowse/probe_status"),
        })
    }
}

/// Parse a fractional-seconds timeout variable.
fn timeout_or<F>(lookup: &F, var: &'static str, default_secs: f64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(secs) if secs > 0.0 => Ok(Duration::from_secs_f64(secs)),
            _ => Err(ConfigError::Invalid { var, value: raw }),
        },
        None => Ok(Duration::from_secs_f64(default_secs)),
    }
}

/// Probes the target and writes heartbeat/status parameters.
pub struct HeartbeatRecorder {
    store: ParamStore,
    http: reqwest::Client,
    config: ProbeConfig,
}

impl HeartbeatRecorder {
    /// Create a recorder over the given store.
    pub fn new(store: ParamStore, config: ProbeConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("drowse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            store,
            http,
            config,
        })
    }

    /// Probe once at wall-clock `now` and record the observation.
    ///
    /// The heartbeat parameter is written only on a ready observation;
    /// the status snapshot is written on every probe.
    pub async fn record_once(&self, now: u64) -> StateResult<ProbeStatus> {
        let state =
            reachability_probe(&self.http, &self.config.target_url, self.config.probe_timeout)
                .await;

        if state == ProbeState::Ready {
            self.store
                .put(&self.config.heartbeat_param, &now.to_string())?;
            debug!(ts = now, "heartbeat recorded");
        }

        let status = ProbeStatus { state, ts: now };
        let json = serde_json::to_string(&status).map_err(|e| StateError::Write(e.to_string()))?;
        self.store.put(&self.config.status_param, &json)?;

        Ok(status)
    }

    /// Run the probe loop until shutdown.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            target = %self.config.target_url,
            interval_secs = interval.as_secs(),
            "heartbeat recorder started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match self.record_once(epoch_secs()).await {
                        Ok(status) => debug!(state = ?status.state, "probe tick"),
                        Err(e) => warn!(error = %e, "probe tick could not be recorded"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("heartbeat recorder shutting down");
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
