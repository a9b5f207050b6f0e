use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const NO_RESPONSE_MESSAGE: &str = "No response from server";

/// Failure classes a scan attempt can end in. None of them are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The service answered, but with an error (non-2xx status or `success: false`).
    ServerRejected,
    /// The request went out and nothing came back in time.
    NoResponse,
    /// The request could not be built, or the reply did not match the report schema.
    RequestInvalid,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::ServerRejected => write!(f, "Server rejected"),
            ErrorCategory::NoResponse => write!(f, "No response"),
            ErrorCategory::RequestInvalid => write!(f, "Invalid request"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{category}: {message}")]
pub struct ScanError {
    pub category: ErrorCategory,
    pub message: String,
    /// Only set when the rejection came with an HTTP status.
    pub http_status: Option<u16>,
}

impl ScanError {
    pub fn server_rejected(message: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            category: ErrorCategory::ServerRejected,
            message: message.into(),
            http_status,
        }
    }

    pub fn no_response() -> Self {
        Self {
            category: ErrorCategory::NoResponse,
            message: NO_RESPONSE_MESSAGE.to_string(),
            http_status: None,
        }
    }

    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::RequestInvalid,
            message: message.into(),
            http_status: None,
        }
    }
}
