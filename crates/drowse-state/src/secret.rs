//! Bearer credential unwrapping.
//!
//! Operator tooling stores the workflow token either as the raw string or
//! wrapped in a JSON object (`{"token": "ghp_..."}`). Both shapes must
//! yield the bare token; an empty token is never valid.

use serde::Deserialize;

#[derive(Deserialize)]
struct TokenWrapper {
    token: Option<String>,
}

/// Extract the bare token from a stored secret value.
///
/// Returns `None` when the value (or the wrapped `token` field) is empty
/// after trimming.
pub fn unwrap_token(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Ok(wrapper) = serde_json::from_str::<TokenWrapper>(raw) {
        let token = wrapper.token.unwrap_or_default();
        let token = token.trim();
        return (!token.is_empty()).then(|| token.to_string());
    }

    (!raw.is_empty()).then(|| raw.to_string())
}
