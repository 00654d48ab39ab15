//! drowse-core — idle detection and teardown orchestration.
//!
//! The idle reaper is invoked once per timer tick and re-derives its entire
//! decision from stored state; there is no in-process state between ticks.
//!
//! # Decision walk
//!
//! ```text
//! armed flag ──not armed──▶ NotArmed            (terminal, no-op)
//!     │
//! heartbeat ──absent/bad──▶ NoHeartbeat         (terminal, no-op)
//!     │
//! idle check ──under thr──▶ Active              (terminal, re-checked next tick)
//!     │
//! guard ──within cooldown─▶ CoolingDown         (terminal, no-op)
//!     │
//! credential ──unreadable─▶ NoCredential        (terminal, error)
//!     │
//! scale to zero (best effort, never aborts)
//!     │
//! dispatch "destroy" ──ok─▶ Dispatched  + guard write
//!              └──failure─▶ DispatchFailed      (no guard write; next tick retries)
//! ```
//!
//! Every branch is fail-closed: ambiguous or missing state always resolves
//! to the no-action outcome. The dispatch guard bounds duplicate dispatches
//! to at most one per cooldown window; it is written only after the
//! dispatcher has confirmed the request.

pub mod config;
pub mod outcome;
pub mod read;
pub mod reaper;
pub mod traits;

pub use config::{ConfigError, ReaperConfig};
pub use outcome::ReapOutcome;
pub use read::Read;
pub use reaper::IdleReaper;
pub use traits::{ACTION_APPLY, ACTION_DESTROY, CapacityScaler, WorkflowDispatcher};
