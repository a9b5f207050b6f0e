use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, ClientBuilder, StatusCode};
use serde_json::Value;
use url::Url;

use super::{ApiRequest, Gateway, HEALTH_PATH, INFO_PATH};
use crate::core::error::ScanError;

/// Scans can take minutes on the service side.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// reqwest-backed [`Gateway`] for the scan service.
pub struct ApiClient {
    inner: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let inner = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("websec-viewer/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<Value, ScanError> {
        self.send(ApiRequest::get(HEALTH_PATH)).await
    }

    pub async fn info(&self) -> Result<Value, ScanError> {
        self.send(ApiRequest::get(INFO_PATH)).await
    }

    fn resolve(&self, path: &str) -> Result<Url, ScanError> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|e| {
            ScanError::request_invalid(format!("Invalid service URL '{}': {}", joined, e))
        })
    }
}

#[async_trait]
impl Gateway for ApiClient {
    async fn send(&self, req: ApiRequest) -> Result<Value, ScanError> {
        let url = match self.resolve(&req.path) {
            Ok(url) => url,
            Err(e) => {
                warn!("[api] {} {} not dispatched: {}", req.method, req.path, e.message);
                return Err(e);
            }
        };

        debug!("[api] → {} {}", req.method, req.path);

        let mut builder = self
            .inner
            .request(req.method.clone(), url)
            .timeout(self.timeout);
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                let err = classify_transport_error(&e);
                warn!("[api] ✗ {} {}: {} ({})", req.method, req.path, err.message, e);
                return Err(err);
            }
        };

        let status = response.status();
        info!("[api] ← {} {} {}", status.as_u16(), req.method, req.path);

        if !status.is_success() {
            // The status already arrived; a broken error body only loses the remote message.
            let body = match response.bytes().await {
                Ok(b) => b.to_vec(),
                Err(e) => {
                    warn!("[api] {} {} error body unreadable: {}", req.method, req.path, e);
                    Vec::new()
                }
            };
            return Err(rejection(status, &body));
        }

        let body = match response.bytes().await {
            Ok(b) => b,
            Err(e) => {
                let err = classify_transport_error(&e);
                warn!("[api] ✗ {} {} body: {} ({})", req.method, req.path, err.message, e);
                return Err(err);
            }
        };

        serde_json::from_slice(&body).map_err(|e| {
            warn!("[api] {} {} returned a non-JSON body: {}", req.method, req.path, e);
            ScanError::request_invalid(format!("Malformed response body: {}", e))
        })
    }
}

/// Anything reqwest could not even put on the wire is an invalid request;
/// every other failure means the service never answered.
fn classify_transport_error(e: &reqwest::Error) -> ScanError {
    if e.is_builder() {
        ScanError::request_invalid(e.to_string())
    } else {
        ScanError::no_response()
    }
}

/// Prefers the service's own `error` field over the status reason phrase.
fn rejection(status: StatusCode, body: &[u8]) -> ScanError {
    let remote = serde_json::from_slice::<Value>(body).ok().and_then(|v| {
        v.get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    });

    let message = remote.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    });

    ScanError::server_rejected(message, Some(status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{ErrorCategory, NO_RESPONSE_MESSAGE};
    use crate::http::SCAN_PATH;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Answers exactly one request with `response` and returns the base URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn error_status_uses_remote_message() {
        let base = serve_once(http_response(
            "500 Internal Server Error",
            r#"{"error":"internal"}"#,
        ))
        .await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .send(ApiRequest::post(SCAN_PATH, json!({ "url": "http://t" })))
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::ServerRejected);
        assert_eq!(err.http_status, Some(500));
        assert_eq!(err.message, "internal");
    }

    #[tokio::test]
    async fn error_status_without_body_falls_back_to_reason() {
        let base = serve_once(http_response("404 Not Found", "")).await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client.health().await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::ServerRejected);
        assert_eq!(err.http_status, Some(404));
        assert_eq!(err.message, "Not Found");
    }

    #[tokio::test]
    async fn truncated_error_body_keeps_the_status() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"err"
                .to_string(),
        )
        .await;
        let client = ApiClient::new(&base, Duration::from_secs(5)).unwrap();

        let err = client
            .send(ApiRequest::post(SCAN_PATH, json!({ "url": "http://t" })))
            .await
            .unwrap_err();

        assert_eq!(err.category, ErrorCategory::ServerRejected);
        assert_eq!(err.http_status, Some(500));
        assert_eq!(err.message, "Internal Server Error");
    }

    #[tokio::test]
    async fn success_passes_json_through() {
        let base = serve_once(http_response("200 OK", r#"{"status":"ok"}"#)).await;
        let client = ApiClient::new(&format!("{}/", base), Duration::from_secs(5)).unwrap();

        let value = client.health().await.unwrap();
        assert_eq!(value, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn silent_server_times_out_as_no_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let err = client.info().await.unwrap_err();

        assert_eq!(err.category, ErrorCategory::NoResponse);
        assert_eq!(err.message, NO_RESPONSE_MESSAGE);
        assert_eq!(err.http_status, None);
    }

    #[tokio::test]
    async fn refused_connection_is_no_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::NoResponse);
    }

    #[tokio::test]
    async fn unusable_base_url_is_request_invalid() {
        let client = ApiClient::new("not a url", Duration::from_secs(1)).unwrap();
        let err = client.health().await.unwrap_err();
        assert_eq!(err.category, ErrorCategory::RequestInvalid);
    }
}
