//! GitHub Actions workflow-dispatch client.
//!
//! `POST /repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches`
//! with a bearer token and `{"ref": ..., "inputs": {"action": ...,
//! "auto_approve": "true"}}`. The endpoint replies 204 on acceptance; any
//! 2xx/3xx is treated as success and the status is only carried for
//! logging. The base URL is configurable so tests can target a loopback
//! mock.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use tracing::debug;

use drowse_core::WorkflowDispatcher;
use drowse_core::config::{ConfigError, required, var_or};

use crate::error::{DispatchError, DispatchResult};
use crate::retry::{RetryError, RetryPolicy};

/// Request timeout for each dispatch attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity of the workflow to dispatch.
#[derive(Debug, Clone)]
pub struct WorkflowTarget {
    pub owner: String,
    pub repo: String,
    pub workflow: String,
    pub ref_name: String,
}

impl WorkflowTarget {
    /// Read the target from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the target through an arbitrary lookup (for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            owner: required(&lookup, "DROWSE_GH_OWNER")?,
            repo: required(&lookup, "DROWSE_GH_REPO")?,
            workflow: var_or(&lookup, "DROWSE_GH_WORKFLOW", "infra.yml"),
            ref_name: var_or(&lookup, "DROWSE_GH_REF", "main"),
        })
    }
}

/// Workflow dispatcher backed by the GitHub Actions REST API.
pub struct GithubDispatcher {
    http: reqwest::Client,
    base_url: String,
    target: WorkflowTarget,
    policy: RetryPolicy,
}

impl GithubDispatcher {
    /// Create a dispatcher against the given API base URL.
    pub fn new(base_url: impl Into<String>, target: WorkflowTarget) -> DispatchResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("drowse/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            target,
            policy: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy (tests use millisecond backoff).
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn dispatch_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/actions/workflows/{}/dispatches",
            self.base_url, self.target.owner, self.target.repo, self.target.workflow
        )
    }

    /// Dispatch the named action, retrying per the policy.
    ///
    /// Returns the upstream HTTP status on success. Auth/validation
    /// rejections abort immediately; retryable failures exhaust the
    /// attempt budget before surfacing as [`DispatchError::RetriesExhausted`].
    pub async fn dispatch_action(&self, action: &str, token: &str) -> DispatchResult<u16> {
        let url = self.dispatch_url();
        let body = serde_json::json!({
            "ref": self.target.ref_name,
            "inputs": { "action": action, "auto_approve": "true" },
        });

        let result = self
            .policy
            .run(DispatchError::is_retryable, |attempt| {
                let url = url.clone();
                let body = body.clone();
                async move {
                    debug!(%url, action, attempt, "dispatching workflow");
                    let response = self
                        .http
                        .post(&url)
                        .bearer_auth(token)
                        .header(ACCEPT, "application/vnd.github+json")
                        .json(&body)
                        .send()
                        .await?;
                    classify(response.status())
                }
            })
            .await;

        match result {
            Ok(status) => Ok(status),
            Err(RetryError::Aborted(e)) => Err(e),
            Err(RetryError::Exhausted { attempts, last }) => Err(DispatchError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            }),
        }
    }
}

/// Map a dispatch response status onto the error taxonomy.
fn classify(status: StatusCode) -> DispatchResult<u16> {
    let code = status.as_u16();
    if status.is_success() || status.is_redirection() {
        return Ok(code);
    }
    match code {
        401 | 403 => Err(DispatchError::Auth(code)),
        422 => Err(DispatchError::Validation),
        _ => Err(DispatchError::Status(code)),
    }
}

#[async_trait]
impl WorkflowDispatcher for GithubDispatcher {
    async fn dispatch(&self, action: &str, token: &str) -> anyhow::Result<u16> {
        Ok(self.dispatch_action(action, token).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;

    /// State of the loopback dispatch endpoint: scripted statuses plus a
    /// record of what the client actually sent.
    struct MockEndpoint {
        statuses: Mutex<VecDeque<u16>>,
        calls: AtomicU32,
        last_auth: Mutex<Option<String>>,
        last_body: Mutex<Option<serde_json::Value>>,
    }

    impl MockEndpoint {
        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    async fn handle_dispatch(
        State(endpoint): State<Arc<MockEndpoint>>,
        headers: HeaderMap,
        axum::Json(body): axum::Json<serde_json::Value>,
    ) -> AxumStatus {
        endpoint.calls.fetch_add(1, Ordering::SeqCst);
        *endpoint.last_auth.lock().unwrap() = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *endpoint.last_body.lock().unwrap() = Some(body);

        let status = endpoint
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(500);
        AxumStatus::from_u16(status).unwrap()
    }

    async fn spawn_mock(statuses: Vec<u16>) -> (String, Arc<MockEndpoint>) {
        let endpoint = Arc::new(MockEndpoint {
            statuses: Mutex::new(statuses.into()),
            calls: AtomicU32::new(0),
            last_auth: Mutex::new(None),
            last_body: Mutex::new(None),
        });

        let app = Router::new()
            .route(
                "/repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches",
                post(handle_dispatch),
            )
            .with_state(endpoint.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), endpoint)
    }

    fn test_target() -> WorkflowTarget {
        WorkflowTarget {
            owner: "acme".into(),
            repo: "demo-env".into(),
            workflow: "infra.yml".into(),
            ref_name: "main".into(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(
            3,
            Duration::from_millis(1),
            Duration::from_millis(4),
            Duration::ZERO,
        )
    }

    fn dispatcher(base: &str) -> GithubDispatcher {
        GithubDispatcher::new(base, test_target())
            .unwrap()
            .with_policy(fast_policy())
    }

    #[tokio::test]
    async fn success_carries_status_and_wire_shape() {
        let (base, endpoint) = spawn_mock(vec![204]).await;

        let status = dispatcher(&base)
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap();

        assert_eq!(status, 204);
        assert_eq!(endpoint.calls(), 1);
        assert_eq!(
            endpoint.last_auth.lock().unwrap().as_deref(),
            Some("Bearer ghp_test")
        );

        let body = endpoint.last_body.lock().unwrap().clone().unwrap();
        assert_eq!(body["ref"], "main");
        assert_eq!(body["inputs"]["action"], "destroy");
        assert_eq!(body["inputs"]["auto_approve"], "true");
    }

    #[tokio::test]
    async fn transient_server_errors_are_retried_to_success() {
        let (base, endpoint) = spawn_mock(vec![500, 500, 200]).await;

        let status = dispatcher(&base)
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap();

        assert_eq!(status, 200);
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test]
    async fn forbidden_aborts_after_one_call() {
        let (base, endpoint) = spawn_mock(vec![403]).await;

        let err = dispatcher(&base)
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Auth(403)));
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn unprocessable_aborts_after_one_call() {
        let (base, endpoint) = spawn_mock(vec![422]).await;

        let err = dispatcher(&base)
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Validation));
        assert_eq!(endpoint.calls(), 1);
    }

    #[tokio::test]
    async fn persistent_failures_exhaust_the_budget() {
        let (base, endpoint) = spawn_mock(vec![500, 502, 503]).await;

        let err = dispatcher(&base)
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap_err();

        match err {
            DispatchError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, DispatchError::Status(503)));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
        assert_eq!(endpoint.calls(), 3);
    }

    #[tokio::test]
    async fn connection_refused_is_retryable_then_exhausts() {
        // Bind then drop to get a port with no listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = dispatcher(&format!("http://{addr}"))
            .dispatch_action("destroy", "ghp_test")
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DispatchError::RetriesExhausted { attempts: 3, .. }
        ));
    }

    #[test]
    fn classify_buckets() {
        assert_eq!(classify(StatusCode::NO_CONTENT).unwrap(), 204);
        assert_eq!(classify(StatusCode::OK).unwrap(), 200);
        assert!(matches!(
            classify(StatusCode::UNAUTHORIZED),
            Err(DispatchError::Auth(401))
        ));
        assert!(matches!(
            classify(StatusCode::UNPROCESSABLE_ENTITY),
            Err(DispatchError::Validation)
        ));
        assert!(matches!(
            classify(StatusCode::INTERNAL_SERVER_ERROR),
            Err(DispatchError::Status(500))
        ));
    }

    #[test]
    fn target_from_lookup_defaults() {
        let target = WorkflowTarget::from_lookup(|var| match var {
            "DROWSE_GH_OWNER" => Some("acme".to_string()),
            "DROWSE_GH_REPO" => Some("demo-env".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(target.workflow, "infra.yml");
        assert_eq!(target.ref_name, "main");
    }

    #[test]
    fn target_requires_owner_and_repo() {
        let err = WorkflowTarget::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DROWSE_GH_OWNER")));
    }
}
