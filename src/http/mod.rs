pub mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use crate::core::error::ScanError;

pub const SCAN_PATH: &str = "/api/scan";
pub const HEALTH_PATH: &str = "/api/health";
pub const INFO_PATH: &str = "/";

/// One call against the scan service, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path, None)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path, Some(body))
    }
}

/// Transport seam between the orchestrator and the network.
///
/// Implementations never fail past this boundary with anything but a
/// classified [`ScanError`].
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ScanError>;
}
