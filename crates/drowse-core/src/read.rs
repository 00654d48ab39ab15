//! Typed parameter reads.
//!
//! Every stored value the reaper consults resolves to an explicit tag —
//! `Found`, `Absent`, or `Unreadable` — and the decision table operates
//! over those tags. Store errors and unparsable values are logged here and
//! never propagate past the read.

use drowse_state::ParamStore;
use tracing::warn;

/// Outcome of reading one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Read<T> {
    /// The parameter exists and parsed.
    Found(T),
    /// The parameter does not exist.
    Absent,
    /// The parameter exists but could not be read or parsed.
    Unreadable,
}

/// Flag values that arm automatic teardown, compared case-insensitively.
pub const ARMED_VALUES: [&str; 4] = ["on", "true", "1", "yes"];

/// Whether a stored flag value is in the armed set.
pub fn is_armed_value(raw: &str) -> bool {
    let normalized = raw.trim().to_ascii_lowercase();
    ARMED_VALUES.contains(&normalized.as_str())
}

/// Read the arm/disarm flag. `Found(true)` means armed.
pub fn read_armed(store: &ParamStore, name: &str) -> Read<bool> {
    match store.get(name) {
        Ok(Some(raw)) => Read::Found(is_armed_value(&raw)),
        Ok(None) => Read::Absent,
        Err(e) => {
            warn!(param = %name, error = %e, "armed flag read failed");
            Read::Unreadable
        }
    }
}

/// Read an epoch-seconds timestamp parameter.
pub fn read_epoch(store: &ParamStore, name: &str) -> Read<u64> {
    match store.get(name) {
        Ok(Some(raw)) => match raw.trim().parse::<u64>() {
            Ok(epoch) => Read::Found(epoch),
            Err(_) => {
                warn!(param = %name, value = %raw, "timestamp parameter is not an integer");
                Read::Unreadable
            }
        },
        Ok(None) => Read::Absent,
        Err(e) => {
            warn!(param = %name, error = %e, "timestamp parameter read failed");
            Read::Unreadable
        }
    }
}
