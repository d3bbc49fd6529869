use std::fmt;

use reqwest::StatusCode;
use serde_json::json;
use tracing::{info, warn};

use super::{error_body, RemoteClient};
use crate::error::{ConsoleError, Result};

/// Repository dispatch trigger for a remote batch job.
#[derive(Clone)]
pub struct DispatchRequest {
    pub owner: String,
    pub repo: String,
    /// Dispatch event type the remote workflow listens for.
    pub job: String,
    pub token: String,
    pub code_url: String,
    pub dataset_url: String,
}

impl fmt::Debug for DispatchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRequest")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("job", &self.job)
            .field("token", &"<redacted>")
            .field("code_url", &self.code_url)
            .field("dataset_url", &self.dataset_url)
            .finish()
    }
}

impl DispatchRequest {
    fn body(&self) -> serde_json::Value {
        json!({
            "event_type": self.job,
            "client_payload": {
                "codeurl": self.code_url,
                "dataseturl": self.dataset_url,
            }
        })
    }
}

impl RemoteClient {
    fn dispatch_endpoint(&self, owner: &str, repo: &str) -> String {
        format!("{}/repos/{}/{}/dispatches", self.api_base, owner, repo)
    }

    /// Fire the trigger. Only `204 No Content` counts as accepted; any other
    /// status comes back with its body untouched. No job handle is returned.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<()> {
        let url = self.dispatch_endpoint(&request.owner, &request.repo);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&request.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github.v3+json")
            .json(&request.body())
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NO_CONTENT {
            info!(owner = %request.owner, repo = %request.repo, job = %request.job, "job dispatched");
            return Ok(());
        }

        warn!(owner = %request.owner, repo = %request.repo, status = status.as_u16(), "dispatch rejected");
        Err(ConsoleError::UnexpectedStatus {
            status: status.as_u16(),
            body: error_body(resp).await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::{dead_url, serve, truncated};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn request() -> DispatchRequest {
        DispatchRequest {
            owner: "acme".into(),
            repo: "spark-jobs".into(),
            job: "spark".into(),
            token: "ghp_secret".into(),
            code_url: "https://example.org/autos.py".into(),
            dataset_url: "https://example.org/autos.csv".into(),
        }
    }

    #[tokio::test]
    async fn accepted_on_204_with_expected_request_shape() {
        let seen: Arc<Mutex<Vec<(HeaderMap, serde_json::Value)>>> = Arc::default();
        let captured = seen.clone();
        let app = Router::new().route(
            "/repos/acme/spark-jobs/dispatches",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push((headers, body));
                    StatusCode::NO_CONTENT
                }
            }),
        );
        let base = serve(app).await;
        let client = RemoteClient::new(&base, Duration::from_secs(5)).unwrap();

        client.dispatch(&request()).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (headers, body) = &seen[0];
        assert_eq!(headers["authorization"], "Bearer ghp_secret");
        assert_eq!(headers["accept"], "application/vnd.github.v3+json");
        assert_eq!(
            body,
            &json!({
                "event_type": "spark",
                "client_payload": {
                    "codeurl": "https://example.org/autos.py",
                    "dataseturl": "https://example.org/autos.csv"
                }
            })
        );
    }

    #[tokio::test]
    async fn rejected_status_surfaces_body_verbatim() {
        let body = r#"{"message":"Not Found","documentation_url":"https://docs.github.com"}"#;
        let app = Router::new().route(
            "/repos/acme/spark-jobs/dispatches",
            post(move || async move { (StatusCode::NOT_FOUND, body) }),
        );
        let base = serve(app).await;
        let client = RemoteClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.dispatch(&request()).await {
            Err(ConsoleError::UnexpectedStatus { status, body: got }) => {
                assert_eq!(status, 404);
                assert_eq!(got, body);
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn plain_200_is_not_acceptance() {
        let app = Router::new().route(
            "/repos/acme/spark-jobs/dispatches",
            post(|| async { (StatusCode::OK, "ok") }),
        );
        let base = serve(app).await;
        let client = RemoteClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.dispatch(&request()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::UnexpectedStatus { status: 200, .. }));
    }

    #[tokio::test]
    async fn rejection_keeps_status_when_body_is_cut_short() {
        let base = truncated("403 Forbidden").await;
        let client = RemoteClient::new(&base, Duration::from_secs(5)).unwrap();

        match client.dispatch(&request()).await {
            Err(ConsoleError::UnexpectedStatus { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.is_empty());
            }
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transport_failure_is_a_connection_error() {
        let base = dead_url().await;
        let client = RemoteClient::new(&base, Duration::from_secs(5)).unwrap();
        let err = client.dispatch(&request()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Connection(_)));
    }

    #[test]
    fn debug_output_hides_token() {
        let printed = format!("{:?}", request());
        assert!(!printed.contains("ghp_secret"));
        assert!(printed.contains("<redacted>"));
    }
}
