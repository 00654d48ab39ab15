//! drowse-state — embedded parameter store for drowse.
//!
//! Backed by [redb](https://docs.rs/redb), this is the durable home of all
//! cross-invocation state: the last-activity heartbeat, the armed flag, the
//! dispatch guard, the workflow credential, and the last probe status. All
//! values are named strings with last-writer-wins semantics.
//!
//! The `ParamStore` is `Clone` + `Send` + `Sync` (backed by `Arc<Database>`)
//! and is shared across the reaper loop, the heartbeat recorder, and the
//! API handlers. The in-memory backend backs tests.

pub mod error;
pub mod secret;
pub mod store;
pub mod tables;

pub use error::{StateError, StateResult};
pub use store::ParamStore;
