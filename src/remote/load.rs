use reqwest::StatusCode;
use tracing::{info, warn};

use super::{error_body, RemoteClient};
use crate::error::{ConsoleError, Result};

impl RemoteClient {
    /// Empty POST to a loader endpoint. `200`/`201` count as success; the
    /// response body is returned either way so the operator can read it.
    pub async fn trigger_load(&self, url: &str) -> Result<String> {
        let resp = self.client.post(url).send().await?;
        let status = resp.status();

        if matches!(status, StatusCode::OK | StatusCode::CREATED) {
            info!(url, status = status.as_u16(), "loader triggered");
            Ok(resp.text().await?)
        } else {
            warn!(url, status = status.as_u16(), "loader answered unexpectedly");
            Err(ConsoleError::UnexpectedStatus {
                status: status.as_u16(),
                body: error_body(resp).await,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::test_support::{serve, truncated};
    use axum::routing::post;
    use axum::Router;
    use std::time::Duration;

    #[tokio::test]
    async fn created_is_success_and_returns_body() {
        let app = Router::new().route("/load", post(|| async { (StatusCode::CREATED, "queued 12 rows") }));
        let base = serve(app).await;
        let client = RemoteClient::new("http://unused", Duration::from_secs(5)).unwrap();

        let body = client.trigger_load(&format!("{}/load", base)).await.unwrap();
        assert_eq!(body, "queued 12 rows");
    }

    #[tokio::test]
    async fn accepted_is_not_in_the_success_set() {
        let app = Router::new().route("/load", post(|| async { (StatusCode::ACCEPTED, "later") }));
        let base = serve(app).await;
        let client = RemoteClient::new("http://unused", Duration::from_secs(5)).unwrap();

        let err = client.trigger_load(&format!("{}/load", base)).await.unwrap_err();
        match err {
            ConsoleError::UnexpectedStatus { status, body } => {
                assert_eq!(status, 202);
                assert_eq!(body, "later");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn bad_gateway_with_broken_body_still_reports_status() {
        let base = truncated("502 Bad Gateway").await;
        let client = RemoteClient::new("http://unused", Duration::from_secs(5)).unwrap();

        let err = client.trigger_load(&format!("{}/load", base)).await.unwrap_err();
        assert!(matches!(err, ConsoleError::UnexpectedStatus { status: 502, .. }));
    }
}
