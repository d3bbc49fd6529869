use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{error_body, RemoteClient};
use crate::error::{ConsoleError, Result};

/// What a result URL returned.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Json(Value),
    /// Body was not JSON; shown as-is.
    Text(String),
}

impl RemoteClient {
    /// One GET against an operator-supplied results URL.
    pub async fn poll(&self, url: &str) -> Result<PollOutcome> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();

        if status != StatusCode::OK {
            warn!(url, status = status.as_u16(), "results fetch failed");
            return Err(ConsoleError::UnexpectedStatus {
                status: status.as_u16(),
                body: error_body(resp).await,
            });
        }

        let body = resp.text().await?;

        info!(url, bytes = body.len(), "results fetched");
        Ok(match parse_body(&body) {
            Ok(value) => PollOutcome::Json(value),
            Err(e) => {
                debug!("results are not JSON, showing raw text: {}", e);
                PollOutcome::Text(body)
            }
        })
    }
}

fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| ConsoleError::Parse(e.to_string()))
}
