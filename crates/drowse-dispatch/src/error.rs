//! Dispatch error taxonomy.
//!
//! Authentication, authorization, and validation rejections are terminal:
//! retrying them cannot succeed and may trip abuse limits. Everything else
//! (5xx, 429, transport failures) is worth another attempt.

use thiserror::Error;

/// Result type alias for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors from a workflow dispatch request.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch rejected by auth (HTTP {0})")]
    Auth(u16),

    #[error("dispatch rejected: workflow/ref/inputs validation failed (HTTP 422)")]
    Validation,

    #[error("dispatch returned HTTP {0}")]
    Status(u16),

    #[error("dispatch transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("dispatch failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<DispatchError>,
    },
}

impl DispatchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Auth(_) | Self::Validation | Self::RetriesExhausted { .. } => false,
            Self::Status(_) | Self::Transport(_) => true,
        }
    }
}
