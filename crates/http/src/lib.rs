//! Echo Chat HTTP client
//!
//! Typed access to the Echo Chat REST backend: a client facade with token
//! and session-expiry interceptors, plus one method per API endpoint.

pub mod client;
pub mod types;

pub use client::config::ClientConfig;
pub use client::error::{ClientError, ErrorPayload};
pub use client::{EchoClient, EchoClientBuilder, SessionExpiredHandler};
