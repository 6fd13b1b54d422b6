//! Authentication API client methods

use super::{ClientError, EchoClient};
use crate::types::{AckResponse, AuthResponse, Envelope, LoginRequest, RegisterRequest, User};
use reqwest::Method;
use tracing::{info, warn};

impl EchoClient {
    /// Log in with a username or email
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::POST, "/auth/login").json(credentials);
        self.execute(request).await
    }

    /// Create an account
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn register(&self, user: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::POST, "/auth/register").json(user);
        self.execute(request).await
    }

    /// Fetch the signed-in user
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn get_user_info(&self) -> Result<AuthResponse, ClientError> {
        let request = self.request(Method::GET, "/auth/user");
        self.execute(request).await
    }

    /// End the session on the server
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn logout(&self) -> Result<AckResponse, ClientError> {
        let request = self.request(Method::POST, "/auth/logout");
        self.execute(request).await
    }

    /// Log in and persist the token and user info on success
    ///
    /// # Errors
    ///
    /// Request failures, [`ClientError::Rejected`] for a `success: false`
    /// reply or a reply without a user, and [`ClientError::Session`] when
    /// the session cannot be written
    pub async fn sign_in(&self, credentials: &LoginRequest) -> Result<User, ClientError> {
        let response = self.login(credentials).await?.into_result()?;
        let user = response
            .user
            .ok_or_else(|| ClientError::Rejected("登录响应缺少用户信息".to_string()))?;

        if let Some(token) = response.token.as_deref() {
            self.session().set_token(token)?;
        }
        self.session().set_user_info(&user)?;

        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Log out on the server and clear the local session.
    ///
    /// The local session is cleared even when the server call fails.
    ///
    /// # Errors
    ///
    /// The server-side failure, after the local session has been cleared,
    /// or [`ClientError::Session`] if clearing it failed
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        let result = self.logout().await;
        self.session().clear()?;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                warn!(error = %e, "server logout failed, local session cleared anyway");
                Err(e)
            }
        }
    }

    /// User persisted by the last [`sign_in`](Self::sign_in)
    ///
    /// # Errors
    ///
    /// [`ClientError::Session`] if the stored user info cannot be read
    pub fn current_user(&self) -> Result<Option<User>, ClientError> {
        Ok(self.session().user_info()?)
    }
}
