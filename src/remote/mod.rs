mod dispatch;
mod load;
mod poll;

use std::time::Duration;

use tracing::warn;

use crate::error::Result;

pub use dispatch::DispatchRequest;
pub use poll::PollOutcome;

/// HTTP client for the CI dispatch API, result URLs and loader triggers.
///
/// Every call is a single attempt bounded by the client timeout. Nothing is
/// retried and no state is kept between calls.
pub struct RemoteClient {
    client: reqwest::Client,
    api_base: String,
}

impl RemoteClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("autos-console/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }
}

/// Body of a non-success response. A failed read keeps the status and
/// yields an empty body.
async fn error_body(resp: reqwest::Response) -> String {
    let status = resp.status().as_u16();
    match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(status, "could not read error response body: {}", e);
            String::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Answer one request with `status_line` and a body that ends before its
    /// declared length. Returns the base URL.
    pub async fn truncated(status_line: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Length: 1000\r\nConnection: close\r\n\r\npartial",
                status_line
            );
            socket.write_all(head.as_bytes()).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let declared = text[..end]
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        raw.len() >= end + 4 + declared
    }

    /// A local URL with nothing listening behind it.
    pub async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/results", addr)
    }
}
