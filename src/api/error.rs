//! API Errors

use serde_json::Value;
use thiserror::Error;

/// Fallback shown when the server gives no detail
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failure reported by the remote layer.
///
/// Cloneable so a failed fetch can sit in the page cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("API request failed: {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("Failed to reach API: {0}")]
    Transport(String),
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// Build a status error from a response body, pulling out `detail`
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| extract_detail(&value));
        Self::Status { status, detail }
    }

    /// Server-provided detail text, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

/// FastAPI sends `detail` as a string, or as a list of validation entries
/// with a `msg` each.
fn extract_detail(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

/// Format an API error for display
pub fn format_api_error(error: &ApiError) -> String {
    if let Some(detail) = error.detail() {
        return detail.to_string();
    }

    match error {
        ApiError::Status { status: 401, .. } | ApiError::Unauthenticated => {
            "Authentication failed. Check your credentials or token.".to_string()
        }
        ApiError::Status { status: 403, .. } => "Not enough permissions.".to_string(),
        ApiError::Status { status: 404, .. } => "Resource not found.".to_string(),
        ApiError::Status { status, .. } if *status >= 500 => {
            "Server temporarily unavailable. Please try again.".to_string()
        }
        ApiError::Transport(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}
