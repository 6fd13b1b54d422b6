//! Client error types

use echo_core::CoreError;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Body of a failed response: the server's JSON payload when it sent one,
/// otherwise whatever text was available
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    Json(Value),
    Text(String),
}

impl ErrorPayload {
    /// Parse a raw response body, preferring JSON
    #[must_use]
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(body),
        }
    }

    /// Best human-readable message: a `message` or `detail` field of a JSON
    /// payload, the raw JSON otherwise, or the text itself
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Json(value) => ["message", "detail"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str))
                .map_or_else(|| value.to_string(), str::to_string),
            Self::Text(text) => text.clone(),
        }
    }

    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {payload}")]
    ServerError { status: u16, payload: ErrorPayload },

    /// Authentication failed; the local session has been torn down
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(ErrorPayload),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(ErrorPayload),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(ErrorPayload),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(ErrorPayload),

    /// Server answered with `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Local session storage failed
    #[error("Session storage error: {0}")]
    Session(#[from] CoreError),

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Create error from HTTP status code
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, payload: ErrorPayload) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(payload),
            401 => Self::AuthenticationFailed(payload),
            403 => Self::Forbidden(payload),
            404 => Self::NotFound(payload),
            _ => Self::ServerError {
                status: status.as_u16(),
                payload,
            },
        }
    }

    /// HTTP status behind this error, if the server answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Server payload of an error response
    #[must_use]
    pub const fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            Self::BadRequest(p)
            | Self::AuthenticationFailed(p)
            | Self::Forbidden(p)
            | Self::NotFound(p)
            | Self::ServerError { payload: p, .. } => Some(p),
            _ => None,
        }
    }

    /// True when the server rejected our credentials
    #[must_use]
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Message suitable for showing to an end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::Request(e) => e.to_string(),
            other => other
                .payload()
                .map_or_else(|| other.to_string(), ErrorPayload::message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn payload_prefers_json() {
        let payload = ErrorPayload::from_body(r#"{"detail":"Not Found"}"#.to_string());
        assert_eq!(payload.as_json(), Some(&json!({"detail": "Not Found"})));
        assert_eq!(payload.message(), "Not Found");

        let payload = ErrorPayload::from_body("Bad Gateway".to_string());
        assert_eq!(payload, ErrorPayload::Text("Bad Gateway".to_string()));
        assert_eq!(payload.message(), "Bad Gateway");
    }

    #[test]
    fn json_without_message_field_renders_whole_value() {
        let payload = ErrorPayload::Json(json!({"code": 7}));
        assert_eq!(payload.message(), r#"{"code":7}"#);
    }

    #[test]
    fn status_mapping() {
        let text = || ErrorPayload::Text(String::new());
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, text()),
            ClientError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, text()),
            ClientError::NotFound(_)
        ));

        let err = ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, text());
        assert_eq!(err.status(), Some(500));
        assert!(!err.is_auth_expired());
        assert!(ClientError::from_status(StatusCode::UNAUTHORIZED, text()).is_auth_expired());
    }

    #[test]
    fn user_message_uses_payload() {
        let err = ClientError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            ErrorPayload::Json(json!({"message": "消息内容不能为空"})),
        );
        assert_eq!(err.user_message(), "消息内容不能为空");
        assert_eq!(ClientError::Rejected("登录失败".into()).user_message(), "登录失败");
    }
}
