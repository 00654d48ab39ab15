//! Capacity scaler implementations.
//!
//! The HTTP scaler drains a compute pool through the provider's pool API;
//! the no-op scaler backs deployments with no pool to drain. Both are
//! invoked best-effort — the reaper logs and swallows any error.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use drowse_core::CapacityScaler;

/// Request timeout for capacity calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Scaler that PUTs zero capacity to a pool endpoint.
pub struct HttpScaler {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScaler {
    /// Create a scaler against the given pool API base URL.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("drowse/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CapacityScaler for HttpScaler {
    async fn scale_to_zero(&self, pool_id: &str) -> anyhow::Result<()> {
        let url = format!("{}/pools/{}/capacity", self.base_url, pool_id);
        let body = serde_json::json!({ "min": 0, "desired": 0 });

        info!(%url, "setting pool capacity to zero");
        self.http
            .put(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Scaler used when no pool endpoint is configured.
pub struct NoopScaler;

#[async_trait]
impl CapacityScaler for NoopScaler {
    async fn scale_to_zero(&self, pool_id: &str) -> anyhow::Result<()> {
        debug!(pool = %pool_id, "no scaler endpoint configured; skipping capacity drain");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::put;

    type Captured = Arc<Mutex<Option<(String, serde_json::Value)>>>;

    async fn handle_capacity(
        State(captured): State<Captured>,
        Path(pool_id): Path<String>,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> StatusCode {
        *captured.lock().unwrap() = Some((pool_id, body));
        StatusCode::OK
    }

    async fn spawn_pool_api() -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route("/pools/{pool_id}/capacity", put(handle_capacity))
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), captured)
    }

    #[tokio::test]
    async fn http_scaler_puts_zero_capacity() {
        let (base, captured) = spawn_pool_api().await;
        let scaler = HttpScaler::new(&base).unwrap();

        scaler.scale_to_zero("demo-pool").await.unwrap();

        let (pool_id, body) = captured.lock().unwrap().clone().unwrap();
        assert_eq!(pool_id, "demo-pool");
        assert_eq!(body["min"], 0);
        assert_eq!(body["desired"], 0);
    }

    #[tokio::test]
    async fn http_scaler_surfaces_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let scaler = HttpScaler::new(format!("http://{addr}")).unwrap();
        assert!(scaler.scale_to_zero("demo-pool").await.is_err());
    }

    #[tokio::test]
    async fn noop_scaler_always_succeeds() {
        assert!(NoopScaler.scale_to_zero("demo-pool").await.is_ok());
    }
}
