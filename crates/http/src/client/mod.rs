//! Echo Chat HTTP client
//!
//! [`EchoClient`] wraps a `reqwest` client with the two cross-cutting hooks
//! every API call goes through:
//!
//! * outbound, [`EchoClient::request`] attaches the stored bearer token;
//! * inbound, [`EchoClient::execute`] unwraps the payload of a successful
//!   response (JSON, text or empty), and on `401 Unauthorized` clears the stored
//!   session and notifies the [`SessionExpiredHandler`].

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod files;

use config::ClientConfig;
use echo_core::Session;
use error::{ClientError, ErrorPayload};
use reqwest::{Client, ClientBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default API root of a local backend
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_USER_AGENT: &str = concat!("echo-chat/", env!("CARGO_PKG_VERSION"));

/// Invoked after a 401 response has cleared the local session.
///
/// This is the hard client-side logout: there is no retry and no refresh.
#[cfg_attr(test, mockall::automock)]
pub trait SessionExpiredHandler: Send + Sync {
    fn on_session_expired(&self);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn() + Send + Sync,
{
    fn on_session_expired(&self) {
        self()
    }
}

/// Handler used when none is configured
struct LogSessionExpired;

impl SessionExpiredHandler for LogSessionExpired {
    fn on_session_expired(&self) {
        warn!("Session expired, sign in again to continue");
    }
}

/// Echo Chat API client
#[derive(Clone)]
pub struct EchoClient {
    client: Client,
    base_url: String,
    session: Session,
    on_session_expired: Arc<dyn SessionExpiredHandler>,
}

impl EchoClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    #[must_use]
    pub fn builder() -> EchoClientBuilder {
        EchoClientBuilder::default()
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session storage used by the interceptors
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Create a request builder, attaching the stored token if there is one
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");
        let mut request = self.client.request(method, url);

        if let Some(token) = self.session.token() {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        request
    }

    /// Execute a request and return the decoded payload
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses (see [`ClientError::from_status`])
    /// and bodies that do not decode as `T`. A 401 also clears the session
    /// and notifies the [`SessionExpiredHandler`] before returning.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "API error");
                return Err(e.into());
            }
        };
        let status = response.status();

        if status.is_success() {
            let body = match response.bytes().await {
                Ok(body) => body,
                Err(e) => {
                    error!(error = %e, status = status.as_u16(), "API error reading body");
                    return Err(e.into());
                }
            };
            return decode_body(&body).map_err(|e| {
                error!(error = %e, status = status.as_u16(), "API error decoding body");
                e.into()
            });
        }

        let payload = match response.text().await {
            Ok(body) if !body.is_empty() => ErrorPayload::from_body(body),
            _ => ErrorPayload::Text(status.to_string()),
        };
        error!(status = status.as_u16(), payload = %payload, "API error");

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
        }

        Err(ClientError::from_status(status, payload))
    }

    fn expire_session(&self) {
        warn!("Received 401, clearing local session");
        if let Err(e) = self.session.clear() {
            error!(error = %e, "failed to clear session storage");
        }
        self.on_session_expired.on_session_expired();
    }
}

/// Decode a successful response body.
///
/// An empty body decodes as `null`, falling back to `{}` for types with
/// all-default fields. A body that is not JSON decodes as a JSON string.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_value(Value::Null)
            .or_else(|_| serde_json::from_value(Value::Object(serde_json::Map::new())));
    }

    match serde_json::from_slice(body) {
        Ok(value) => Ok(value),
        Err(e) if e.is_syntax() || e.is_eof() => {
            let text = String::from_utf8_lossy(body).into_owned();
            serde_json::from_value(Value::String(text)).map_err(|_| e)
        }
        Err(e) => Err(e),
    }
}

/// Builder for [`EchoClient`]
#[derive(Default)]
pub struct EchoClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    session: Option<Session>,
    on_session_expired: Option<Arc<dyn SessionExpiredHandler>>,
}

impl EchoClientBuilder {
    /// Start from a loaded configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::default()
            .base_url(config.base_url.clone())
            .timeout(Duration::from_secs(config.timeout_secs));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the session storage read and cleared by the interceptors
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Set the hook run after a 401 tears the session down
    #[must_use]
    pub fn on_session_expired(mut self, handler: impl SessionExpiredHandler + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(handler));
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// [`ClientError::Configuration`] for a blank base URL, or the TLS/client
    /// setup error from `reqwest`
    pub fn build(self) -> Result<EchoClient, ClientError> {
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if base_url.trim().is_empty() {
            return Err(ClientError::Configuration("base_url must not be empty".into()));
        }

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(
                self.user_agent
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            )
            .build()?;

        Ok(EchoClient {
            client,
            base_url,
            session: self.session.unwrap_or_default(),
            on_session_expired: self
                .on_session_expired
                .unwrap_or_else(|| Arc::new(LogSessionExpired)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_local_backend() {
        let client = EchoClient::builder().build().unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let client = EchoClient::new("http://example.test/api/").unwrap();
        assert_eq!(client.base_url(), "http://example.test/api");
    }

    #[test]
    fn builder_rejects_blank_base_url() {
        let result = EchoClient::builder().base_url("  ").build();
        assert!(matches!(result, Err(ClientError::Configuration(_))));
    }

    #[test]
    fn request_attaches_stored_token() {
        let session = Session::in_memory();
        let client = EchoClient::builder()
            .session(session.clone())
            .build()
            .unwrap();

        let request = client
            .request(reqwest::Method::GET, "/auth/user")
            .build()
            .unwrap();
        assert!(request.headers().get(header::AUTHORIZATION).is_none());
        assert_eq!(request.url().as_str(), "http://localhost:8000/api/auth/user");

        session.set_token("tok-1").unwrap();
        let request = client
            .request(reqwest::Method::GET, "/auth/user")
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(header::AUTHORIZATION).unwrap(),
            "Bearer tok-1"
        );
    }

    #[test]
    fn empty_body_decodes_as_null_or_default() {
        assert_eq!(decode_body::<Value>(b"").unwrap(), Value::Null);
        assert_eq!(decode_body::<Option<String>>(b"  ").unwrap(), None);

        let ack: crate::types::AckResponse = decode_body(b"").unwrap();
        assert!(ack.success);
        assert_eq!(ack.message, None);
    }

    #[test]
    fn text_body_decodes_as_string() {
        assert_eq!(decode_body::<Value>(b"ok").unwrap(), Value::String("ok".into()));
        assert_eq!(decode_body::<String>("上传完成".as_bytes()).unwrap(), "上传完成");
    }

    #[test]
    fn mismatched_body_keeps_json_error() {
        let err = decode_body::<crate::types::AckResponse>(b"ok").unwrap_err();
        assert!(err.is_syntax());

        let err = decode_body::<crate::types::AckResponse>(br#"{"success":"yes"}"#).unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn closures_act_as_session_expired_handlers() {
        let mut handler = MockSessionExpiredHandler::new();
        handler.expect_on_session_expired().times(1).return_const(());
        handler.on_session_expired();

        let fired = std::sync::atomic::AtomicBool::new(false);
        let closure = || fired.store(true, std::sync::atomic::Ordering::SeqCst);
        closure.on_session_expired();
        assert!(fired.load(std::sync::atomic::Ordering::SeqCst));
    }
}
