//! Snapshot fetcher
//!
//! One request/response cycle per call. No retries here: the poll scheduler's
//! fixed cadence is the only retry mechanism.

use super::types::Snapshot;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("fetch failed with status {0}")]
    Status(StatusCode),

    #[error("malformed snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can produce a full snapshot on demand
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Snapshot, FetchError>;
}

/// Fetches snapshots with a plain `GET` against a fixed endpoint
pub struct HttpFetcher {
    client: reqwest::Client,
    url: String,
}

impl HttpFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpFetcher {
    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        // Read the body first so a truncated transfer is a transport error,
        // not a parse error
        let body = response.bytes().await?;
        let snapshot: Snapshot = serde_json::from_slice(&body)?;

        log::debug!("Fetched {} slot groups from {}", snapshot.len(), self.url);
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the endpoint URL
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{}/transactions", addr)
    }

    fn fetcher(url: String) -> HttpFetcher {
        HttpFetcher::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let url = serve_once(
            "200 OK",
            r#"[{"slot":5,"txns":[{"signatures":["abc123"],"txn":{"from":"A","to":"B","amount":10}}]}]"#,
        )
        .await;

        let snapshot = fetcher(url).fetch().await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].slot, 5);
        assert_eq!(snapshot[0].transactions[0].transfer.amount, 10.0);
    }

    #[tokio::test]
    async fn test_fetch_empty_feed() {
        let url = serve_once("200 OK", "[]").await;
        assert!(fetcher(url).fetch().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let url = serve_once("503 Service Unavailable", "").await;

        let err = fetcher(url).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let url = serve_once("200 OK", r#"{"slot":5}"#).await;

        let err = fetcher(url).fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = fetcher(format!("http://{}/transactions", addr))
            .fetch()
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
