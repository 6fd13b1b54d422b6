//! Credential store abstraction and the in-memory mock used during development.
//!
//! The mock keeps plaintext passwords and simulates network latency with a
//! fixed sleep before answering, so callers see the same suspension points a
//! real backend would introduce.

use crate::error::AuthError;
use crate::types::{NewUser, Plan, UserProfile, UserRecord};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Simulated latency of a login round trip
pub const LOGIN_DELAY: Duration = Duration::from_millis(500);
/// Simulated latency of a registration round trip
pub const REGISTER_DELAY: Duration = Duration::from_millis(1000);

const SEED_AVATAR: &str = "https://design.gemcoder.com/staticResource/echoAiSystemImages/3af53b10252ba2331a996da3c32fd378.png";

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Verify `identifier` (username or email) and `password`
    ///
    /// # Errors
    ///
    /// [`AuthError::NotFound`] for an unknown identifier and
    /// [`AuthError::WrongPassword`] for a password mismatch
    async fn login(&self, identifier: &str, password: &str) -> Result<UserProfile, AuthError>;

    /// Create a new account
    ///
    /// # Errors
    ///
    /// [`AuthError::DuplicateEmail`] or [`AuthError::DuplicateUsername`] when
    /// either is already taken; the email is checked first
    async fn register(&self, user: NewUser) -> Result<UserProfile, AuthError>;
}

/// In-memory credential store seeded with a single test account
pub struct MockCredentialStore {
    users: RwLock<Vec<UserRecord>>,
    login_delay: Duration,
    register_delay: Duration,
}

impl MockCredentialStore {
    /// Create a store holding the default seed account
    #[must_use]
    pub fn new() -> Self {
        Self::with_users(seed_users())
    }

    /// Create a store holding exactly `users`
    #[must_use]
    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            users: RwLock::new(users),
            login_delay: LOGIN_DELAY,
            register_delay: REGISTER_DELAY,
        }
    }

    /// Override the simulated latencies
    #[must_use]
    pub const fn with_delays(mut self, login: Duration, register: Duration) -> Self {
        self.login_delay = login;
        self.register_delay = register;
        self
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Redacted snapshot of every stored account
    pub async fn users(&self) -> Vec<UserProfile> {
        self.users
            .read()
            .await
            .iter()
            .map(UserRecord::redacted)
            .collect()
    }
}

impl Default for MockCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MockCredentialStore {
    async fn login(&self, identifier: &str, password: &str) -> Result<UserProfile, AuthError> {
        tokio::time::sleep(self.login_delay).await;

        let users = self.users.read().await;
        let user = users
            .iter()
            .find(|u| u.matches_identifier(identifier))
            .ok_or(AuthError::NotFound)?;

        if user.password != password {
            return Err(AuthError::WrongPassword);
        }

        debug!(user_id = user.id, "mock login succeeded");
        Ok(user.redacted())
    }

    async fn register(&self, user: NewUser) -> Result<UserProfile, AuthError> {
        tokio::time::sleep(self.register_delay).await;

        // Held across check-and-append so two registrations cannot both pass
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::DuplicateEmail);
        }
        if users.iter().any(|u| u.username == user.username) {
            return Err(AuthError::DuplicateUsername);
        }

        let record = UserRecord {
            id: users.len() as u64 + 1,
            username: user.username,
            email: user.email,
            password: user.password,
            avatar: user.avatar,
            plan: Plan::default(),
            created_at: Utc::now().date_naive(),
        };
        let profile = record.redacted();
        users.push(record);

        debug!(user_id = profile.id, "mock registration succeeded");
        Ok(profile)
    }
}

fn seed_users() -> Vec<UserRecord> {
    vec![UserRecord {
        id: 1,
        username: "冷丶布丁".to_string(),
        email: "498128186@qq.com".to_string(),
        password: "shuishui".to_string(),
        avatar: Some(SEED_AVATAR.to_string()),
        plan: Plan::default(),
        created_at: NaiveDate::from_ymd_opt(2023, 11, 1).unwrap_or_default(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthFailure;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
            avatar: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn login_by_email_returns_redacted_profile() {
        let store = MockCredentialStore::new();
        let user = store.login("498128186@qq.com", "shuishui").await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "冷丶布丁");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn login_by_username_succeeds() {
        let store = MockCredentialStore::new();
        let user = store.login("冷丶布丁", "shuishui").await.unwrap();
        assert_eq!(user.email, "498128186@qq.com");
    }

    #[tokio::test(start_paused = true)]
    async fn login_unknown_identifier_is_not_found() {
        let store = MockCredentialStore::new();
        let err = store.login("nobody@example.com", "shuishui").await.unwrap_err();

        assert_eq!(err, AuthError::NotFound);
        assert_eq!(AuthFailure::from(err).message, "用户不存在");
    }

    #[tokio::test(start_paused = true)]
    async fn login_wrong_password_is_rejected() {
        let store = MockCredentialStore::new();
        let err = store.login("498128186@qq.com", "wrong").await.unwrap_err();

        assert_eq!(err, AuthError::WrongPassword);
        assert_eq!(err.to_string(), "密码错误");
    }

    #[tokio::test(start_paused = true)]
    async fn login_waits_for_simulated_delay() {
        let store = MockCredentialStore::new();
        let start = tokio::time::Instant::now();
        store.login("冷丶布丁", "shuishui").await.unwrap();
        assert!(start.elapsed() >= LOGIN_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn register_duplicate_email_leaves_store_unchanged() {
        let store = MockCredentialStore::new();
        let err = store
            .register(new_user("fresh", "498128186@qq.com"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::DuplicateEmail);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn register_duplicate_username_is_rejected() {
        let store = MockCredentialStore::new();
        let err = store
            .register(new_user("冷丶布丁", "fresh@example.com"))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::DuplicateUsername);
        assert_eq!(err.to_string(), "用户名已被使用");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn register_email_collision_wins_over_username_collision() {
        let store = MockCredentialStore::new();
        let err = store
            .register(new_user("冷丶布丁", "498128186@qq.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::DuplicateEmail);
    }

    #[tokio::test(start_paused = true)]
    async fn register_fresh_user_appends_one_record() {
        let store = MockCredentialStore::new();
        let profile = store
            .register(new_user("newbie", "newbie@example.com"))
            .await
            .unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(profile.id, 2);
        assert_eq!(profile.plan, Plan::default());
        assert_eq!(profile.created_at, Utc::now().date_naive());
        assert!(serde_json::to_value(&profile).unwrap().get("password").is_none());

        // The new account can log in straight away
        let user = store.login("newbie@example.com", "secret").await.unwrap();
        assert_eq!(user, profile);
    }

    #[tokio::test]
    async fn empty_store_rejects_every_login() {
        let store = MockCredentialStore::with_users(Vec::new())
            .with_delays(Duration::ZERO, Duration::ZERO);
        assert!(store.is_empty().await);
        assert_eq!(
            store.login("anyone", "anything").await.unwrap_err(),
            AuthError::NotFound
        );
    }
}
