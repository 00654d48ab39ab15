//! drowse-dispatch — exactly-one workflow dispatch with bounded retries.
//!
//! Delivers a "run workflow with inputs" request to the GitHub Actions
//! dispatch endpoint, tolerating transient network/server failures and
//! failing fast on auth/validation rejections. The retry behavior lives in
//! a reusable [`RetryPolicy`]; outcome recording (the dispatch guard) is
//! the caller's responsibility, which keeps this component idempotent.

pub mod error;
pub mod github;
pub mod retry;

pub use error::{DispatchError, DispatchResult};
pub use github::{GithubDispatcher, WorkflowTarget};
pub use retry::{RetryError, RetryPolicy};
