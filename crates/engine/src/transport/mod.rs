//! Callback transports.
//!
//! A [`CallbackTransport`] performs one callback request and returns the
//! interpreted response. The editor never awaits a transport while holding
//! its own state; see [`AttributeEditor::resolve_callbacks`](crate::AttributeEditor::resolve_callbacks).

#[cfg(feature = "http")]
mod http;
mod static_transport;

#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use static_transport::StaticTransport;

use async_trait::async_trait;
use attrform_interchange::CallbackResponse;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::callback::CallbackRequest;

pub const API_URL_ENV: &str = "ATTRFORM_API_URL";
pub const AUTH_TOKEN_ENV: &str = "ATTRFORM_AUTH_TOKEN";

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors that can occur while performing a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// The request never produced a response.
    Connection(String),
    /// The response body is not a valid callback response.
    InvalidResponse(String),
    /// The request has no scope to address it with.
    MissingScope,
    /// A canned or synthetic failure.
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { status, message } => {
                write!(f, "callback returned status {}: {}", status, message)
            }
            TransportError::Connection(msg) => write!(f, "callback request failed: {}", msg),
            TransportError::InvalidResponse(msg) => {
                write!(f, "invalid callback response: {}", msg)
            }
            TransportError::MissingScope => {
                write!(f, "callback has no connector or resource scope")
            }
            TransportError::Rejected(msg) => write!(f, "callback rejected: {}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

// ──────────────────────────────────────────────
// Configuration
// ──────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}

/// Where and how callbacks are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl TransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        TransportConfig {
            base_url: base_url.into(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Configuration from `ATTRFORM_API_URL` and `ATTRFORM_AUTH_TOKEN`.
    ///
    /// Returns `None` when no API URL is set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(API_URL_ENV).ok().filter(|s| !s.is_empty())?;
        let mut config = TransportConfig::new(base_url);
        config.auth_token = std::env::var(AUTH_TOKEN_ENV).ok().filter(|s| !s.is_empty());
        Some(config)
    }

    /// Fill unset fields from the environment.
    pub fn with_env_fallback(mut self) -> Self {
        if self.auth_token.is_none() {
            self.auth_token = std::env::var(AUTH_TOKEN_ENV).ok().filter(|s| !s.is_empty());
        }
        self
    }
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Asynchronous executor of callback requests.
#[async_trait]
pub trait CallbackTransport: Send + Sync {
    async fn dispatch(&self, request: &CallbackRequest) -> Result<CallbackResponse, TransportError>;

    /// Short name used in logs.
    fn transport_id(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = TransportError::Status {
            status: 404,
            message: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "callback returned status 404: not found");
        assert_eq!(
            TransportError::MissingScope.to_string(),
            "callback has no connector or resource scope"
        );
    }

    #[test]
    fn config_defaults_timeout() {
        let config: TransportConfig =
            serde_json::from_value(serde_json::json!({ "base_url": "http://localhost" })).unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.auth_token.is_none());
    }
}
