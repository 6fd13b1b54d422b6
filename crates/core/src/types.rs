use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription tier attached to an account.
///
/// The backend treats this as a free-form label; every new account starts on
/// [`Plan::PERSONAL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan(String);

impl Plan {
    pub const PERSONAL: &'static str = "个人版";

    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::new(Self::PERSONAL)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored account, including its plaintext password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: Option<String>,
    pub plan: Plan,
    pub created_at: NaiveDate,
}

impl UserRecord {
    /// Strip the password, producing the shape returned to callers
    #[must_use]
    pub fn redacted(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            avatar: self.avatar.clone(),
            plan: self.plan.clone(),
            created_at: self.created_at,
        }
    }

    /// True when `identifier` is exactly this record's username or email
    #[must_use]
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.email == identifier || self.username == identifier
    }
}

/// A [`UserRecord`] without its password
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub plan: Plan,
    pub created_at: NaiveDate,
}

/// Registration input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Successful credential-store response: `{success: true, user}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSuccess {
    pub success: bool,
    pub user: UserProfile,
}

impl From<UserProfile> for AuthSuccess {
    fn from(user: UserProfile) -> Self {
        Self {
            success: true,
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        UserRecord {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "hunter2".to_string(),
            avatar: None,
            plan: Plan::default(),
            created_at: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        }
    }

    #[test]
    fn redacted_profile_has_no_password_field() {
        let json = serde_json::to_value(record().redacted()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["createdAt"], "2024-02-29");
        assert_eq!(json["plan"], "个人版");
    }

    #[test]
    fn identifier_matches_username_or_email_exactly() {
        let record = record();
        assert!(record.matches_identifier("alice"));
        assert!(record.matches_identifier("alice@example.com"));
        assert!(!record.matches_identifier("Alice"));
        assert!(!record.matches_identifier("alice@example"));
    }
}
