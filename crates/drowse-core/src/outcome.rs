//! Per-invocation reaper outcomes.
//!
//! One invocation produces exactly one outcome. The taxonomy mirrors the
//! error-handling contract: benign no-ops, the in-flight-guard skip, and
//! the two error shapes that must surface to the operator. Serialized for
//! operational logging, not a user-facing API.

use serde::Serialize;

/// Result of a single reaper invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReapOutcome {
    /// Automatic teardown is not permitted; nothing was read or written
    /// beyond the flag itself.
    NotArmed,
    /// No usable last-activity timestamp; idleness cannot be proven.
    NoHeartbeat,
    /// The environment saw activity within the threshold.
    Active { idle_secs: u64 },
    /// A teardown was dispatched within the cooldown window.
    CoolingDown { since_dispatch_secs: u64 },
    /// The guard parameter exists but cannot be interpreted; without proof
    /// that no dispatch is in flight, the reaper stands down.
    GuardUnreadable,
    /// The workflow credential could not be retrieved. Actionable: an
    /// operator must fix secret access.
    NoCredential { reason: String },
    /// Teardown was dispatched and acknowledged.
    Dispatched { github_status: u16 },
    /// The dispatcher terminally failed; no guard was written, so the next
    /// tick retries from scratch.
    DispatchFailed { reason: String },
}

impl ReapOutcome {
    /// Whether this outcome is a benign no-op (fail-closed skip or active).
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            Self::NotArmed
                | Self::NoHeartbeat
                | Self::Active { .. }
                | Self::CoolingDown { .. }
                | Self::GuardUnreadable
        )
    }

    /// Whether this outcome must surface as an error to the caller.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::NoCredential { .. } | Self::DispatchFailed { .. })
    }
}
