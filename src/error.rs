//! Error types for the proxy
//!
//! Configuration, connection and protocol failures are recorded in
//! [`crate::adapter::ServiceState`]; validation and check failures are
//! returned per request.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// Engine URL missing or invalid
    #[error("{0}")]
    Config(String),

    /// Engine unreachable
    #[error("{0}")]
    Connection(String),

    /// Engine answered, but not like a LanguageTool server
    #[error("{0}")]
    Protocol(String),

    /// Malformed or incomplete check request
    #[error("{0}")]
    Validation(String),

    /// Engine reachable but the check call failed
    #[error("Error checking grammar: {0}")]
    CheckFailed(String),
}

pub type Result<T> = std::result::Result<T, ProxyError>;

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProxyError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Config(_) | ProxyError::Protocol(_) | ProxyError::CheckFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ProxyError::Connection(err.to_string())
        } else if err.is_decode() {
            ProxyError::Protocol(err.to_string())
        } else {
            ProxyError::CheckFailed(err.to_string())
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_client_error() {
        let err = ProxyError::Validation("Field required: text".to_string());
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.status_code().is_client_error());
    }

    #[test]
    fn test_check_failed_message_embeds_cause() {
        let err = ProxyError::CheckFailed("engine exploded".to_string());
        assert_eq!(err.to_string(), "Error checking grammar: engine exploded");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ProxyError::Validation("missing text".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "missing text");
    }
}
