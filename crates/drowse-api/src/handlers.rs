//! HTTP handlers for the status/wake surface.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use tracing::{info, warn};

use drowse_core::ACTION_APPLY;
use drowse_probe::{ProbeState, ProbeStatus};

use crate::ApiState;

/// Body of `GET /status`.
#[derive(serde::Serialize)]
struct StatusBody {
    state: ProbeState,
}

/// Body of `POST /wake`.
#[derive(serde::Serialize)]
struct WakeBody {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    accepted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gh_dispatch: Option<u16>,
}

/// GET /status
///
/// Reads the recorder's snapshot; absent, unparsable, or stale snapshots
/// all read as waking.
pub async fn status(State(state): State<ApiState>) -> impl IntoResponse {
    let probe_state = match state.store.get(&state.status_param) {
        Ok(Some(raw)) => match serde_json::from_str::<ProbeStatus>(&raw) {
            Ok(snapshot) if !snapshot.is_stale(epoch_secs(), state.status_stale_after) => {
                snapshot.state
            }
            Ok(_) => ProbeState::Waking,
            Err(e) => {
                warn!(error = %e, "probe status snapshot is unparsable");
                ProbeState::Waking
            }
        },
        Ok(None) => ProbeState::Waking,
        Err(e) => {
            warn!(error = %e, "probe status read failed");
            ProbeState::Waking
        }
    };

    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(StatusBody { state: probe_state }),
    )
}

/// POST /wake
///
/// Dispatches the "apply" workflow with the stored credential. The caller
/// only learns whether the dispatch was accepted; provisioning itself is
/// asynchronous.
pub async fn wake(State(state): State<ApiState>) -> impl IntoResponse {
    let token = match state.store.get_secret(&state.token_param) {
        Ok(Some(token)) => token,
        Ok(None) => {
            warn!(param = %state.token_param, "wake requested but credential is missing");
            return wake_failed();
        }
        Err(e) => {
            warn!(error = %e, "wake requested but credential is unreadable");
            return wake_failed();
        }
    };

    match state.dispatcher.dispatch(ACTION_APPLY, &token).await {
        Ok(gh_status) => {
            info!(gh_status, "apply workflow dispatched");
            (
                StatusCode::ACCEPTED,
                [(header::CACHE_CONTROL, "no-store")],
                Json(WakeBody {
                    ok: true,
                    accepted: Some(true),
                    gh_dispatch: Some(gh_status),
                }),
            )
        }
        Err(e) => {
            warn!(error = %e, "apply workflow dispatch failed");
            wake_failed()
        }
    }
}

fn wake_failed() -> (
    StatusCode,
    [(header::HeaderName, &'static str); 1],
    Json<WakeBody>,
) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CACHE_CONTROL, "no-store")],
        Json(WakeBody {
            ok: false,
            accepted: None,
            gh_dispatch: None,
        }),
    )
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use drowse_core::WorkflowDispatcher;
    use drowse_state::ParamStore;

    use crate::{ApiState, build_router};

    struct MockDispatcher {
        calls: AtomicU32,
        response: Result<u16, String>,
    }

    impl MockDispatcher {
        fn ok(status: u16) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                response: Ok(status),
            })
        }

        fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                response: Err(reason.to_string()),
            })
        }
    }

    #[async_trait]
    impl WorkflowDispatcher for MockDispatcher {
        async fn dispatch(&self, action: &str, _token: &str) -> anyhow::Result<u16> {
            assert_eq!(action, ACTION_APPLY);
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(status) => Ok(*status),
                Err(reason) => Err(anyhow::anyhow!(reason.clone())),
            }
        }
    }

    fn test_state(store: ParamStore, dispatcher: Arc<MockDispatcher>) -> ApiState {
        ApiState {
            store,
            dispatcher,
            token_param: "/drowse/gh_token".into(),
            status_param: "/drowse/probe_status".into(),
            status_stale_after: Duration::from_secs(90),
        }
    }

    async fn get_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(router: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn now() -> u64 {
        epoch_secs()
    }

    #[tokio::test]
    async fn status_reports_waking_when_no_snapshot() {
        let store = ParamStore::open_in_memory().unwrap();
        let router = build_router(test_state(store, MockDispatcher::ok(204)));

        let (status, body) = get_json(router, "/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "waking");
    }

    #[tokio::test]
    async fn status_reports_ready_from_fresh_snapshot() {
        let store = ParamStore::open_in_memory().unwrap();
        store
            .put(
                "/drowse/probe_status",
                &format!(r#"{{"state":"ready","ts":{}}}"#, now()),
            )
            .unwrap();
        let router = build_router(test_state(store, MockDispatcher::ok(204)));

        let response = router
            .clone()
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "no-store"
        );

        let (status, body) = get_json(router, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "ready");
    }

    #[tokio::test]
    async fn status_reports_waking_from_stale_snapshot() {
        let store = ParamStore::open_in_memory().unwrap();
        store
            .put(
                "/drowse/probe_status",
                &format!(r#"{{"state":"ready","ts":{}}}"#, now() - 600),
            )
            .unwrap();
        let router = build_router(test_state(store, MockDispatcher::ok(204)));

        let (_, body) = get_json(router, "/status").await;
        assert_eq!(body["state"], "waking");
    }

    #[tokio::test]
    async fn status_reports_waking_from_garbage_snapshot() {
        let store = ParamStore::open_in_memory().unwrap();
        store.put("/drowse/probe_status", "not json").unwrap();
        let router = build_router(test_state(store, MockDispatcher::ok(204)));

        let (status, body) = get_json(router, "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "waking");
    }

    #[tokio::test]
    async fn wake_dispatches_apply() {
        let store = ParamStore::open_in_memory().unwrap();
        store.put("/drowse/gh_token", "ghp_test").unwrap();
        let dispatcher = MockDispatcher::ok(204);
        let router = build_router(test_state(store, dispatcher.clone()));

        let (status, body) = post_json(router, "/wake").await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["ok"], true);
        assert_eq!(body["accepted"], true);
        assert_eq!(body["gh_dispatch"], 204);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn wake_without_credential_is_500() {
        let store = ParamStore::open_in_memory().unwrap();
        let dispatcher = MockDispatcher::ok(204);
        let router = build_router(test_state(store, dispatcher.clone()));

        let (status, body) = post_json(router, "/wake").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
        assert_eq!(dispatcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wake_dispatch_failure_is_500() {
        let store = ParamStore::open_in_memory().unwrap();
        store.put("/drowse/gh_token", "ghp_test").unwrap();
        let router = build_router(test_state(
            store,
            MockDispatcher::failing("dispatch failed after 3 attempts"),
        ));

        let (status, body) = post_json(router, "/wake").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["ok"], false);
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let store = ParamStore::open_in_memory().unwrap();
        let router = build_router(test_state(store, MockDispatcher::ok(204)));

        let response = router
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
