//! Environment-variable configuration for the idle reaper.
//!
//! All knobs carry defaults except the target repository and the credential
//! parameter name, which must be set explicitly. Parsing is driven through
//! an injectable lookup so tests never touch the process environment.

use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Decision-logic configuration for [`crate::IdleReaper`].
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Parameter holding the last-activity epoch timestamp.
    pub heartbeat_param: String,
    /// Idle threshold in minutes before teardown is considered.
    pub idle_minutes: u64,
    /// Parameter holding the operator arm/disarm flag.
    pub armed_param: String,
    /// Parameter holding the epoch timestamp of the last successful dispatch.
    pub guard_param: String,
    /// Minimum seconds between teardown dispatches.
    pub cooldown_seconds: u64,
    /// Compute pool to drain before dispatch; scaling is skipped when unset.
    pub pool_id: Option<String>,
    /// Parameter holding the workflow bearer credential.
    pub token_param: String,
}

impl ReaperConfig {
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
            heartbeat_param: var_or(&lookup, "DROWSE_HEARTBEAT_PARAM", "/drowse/last_heartbeat"),
            idle_minutes: parsed_or(&lookup, "DROWSE_IDLE_MINUTES", 20)?,
            armed_param: var_or(&lookup, "DROWSE_ARMED_PARAM", "/drowse/armed"),
            guard_param: var_or(&lookup, "DROWSE_GUARD_PARAM", "/drowse/last_destroy_dispatch"),
            cooldown_seconds: parsed_or(&lookup, "DROWSE_COOLDOWN_SECONDS", 1800)?,
            pool_id: lookup("DROWSE_POOL_ID").filter(|v| !v.trim().is_empty()),
            token_param: required(&lookup, "DROWSE_TOKEN_PARAM")?,
        })
    }

    /// Idle threshold in seconds.
    pub fn idle_threshold_secs(&self) -> u64 {
        self.idle_minutes * 60
    }
}

/// Look up a variable, falling back to a default.
pub fn var_or<F>(lookup: &F, var: &'static str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var).unwrap_or_else(|| default.to_string())
}

/// Look up a required variable.
pub fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

/// Look up an integer variable, falling back to a default when unset.
pub fn parsed_or<F>(lookup: &F, var: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}
