//! drowse-probe — heartbeat recorder for the target environment.
//!
//! Periodically issues a timed GET against the environment's public URL.
//! A 2xx/3xx response means the environment is awake and serving traffic;
//! on that observation the recorder overwrites the last-activity parameter
//! the idle reaper consumes. Every probe also records a status snapshot
//! (ready/waking + timestamp) for the public status endpoint.
//!
//! Probe failures are benign: an unreachable environment is simply still
//! waking (or already torn down), never an error.

pub mod probe;
pub mod recorder;

pub use probe::{ProbeState, ProbeStatus, reachability_probe};
pub use recorder::{HeartbeatRecorder, ProbeConfig};
