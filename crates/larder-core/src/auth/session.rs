use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{User, UserId};

/// Token expiry time in minutes.
const TOKEN_EXPIRY_MINUTES: i64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub token: String,
    pub user: User,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::minutes(TOKEN_EXPIRY_MINUTES)
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self) -> i64 {
        (self.expires_at() - Utc::now()).num_minutes().max(0)
    }
}

/// The signed-in account, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session, returning the previous user when the account changed.
    pub fn update(&mut self, data: SessionData) -> Option<UserId> {
        let previous = self.user_id().filter(|id| *id != data.user.id);
        self.data = Some(data);
        previous
    }

    pub fn clear(&mut self) {
        self.data = None;
    }

    /// Get the bearer token if session is valid
    pub fn token(&self) -> Option<&str> {
        self.valid().map(|d| d.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.valid().map(|d| &d.user)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user().map(|u| u.id)
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.valid().is_some()
    }

    fn valid(&self) -> Option<&SessionData> {
        self.data.as_ref().filter(|d| !d.is_expired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(user: i64, minutes_old: i64) -> SessionData {
        SessionData {
            token: format!("token-{}", user),
            user: User {
                id: UserId(user),
                email: format!("user{}@example.com", user),
                email_verified: true,
            },
            created_at: Utc::now() - Duration::minutes(minutes_old),
        }
    }

    #[test]
    fn test_fresh_session_is_valid() {
        let mut session = Session::new();
        assert!(!session.is_valid());
        session.update(data(1, 0));
        assert!(session.is_valid());
        assert_eq!(session.token(), Some("token-1"));
        assert_eq!(session.user_id(), Some(UserId(1)));
    }

    #[test]
    fn test_expired_session_hides_token() {
        let mut session = Session::new();
        session.update(data(1, 61));
        assert!(!session.is_valid());
        assert_eq!(session.token(), None);
        assert_eq!(session.user_id(), None);
    }

    #[test]
    fn test_update_reports_account_switch() {
        let mut session = Session::new();
        assert_eq!(session.update(data(1, 0)), None);
        assert_eq!(session.update(data(1, 0)), None);
        assert_eq!(session.update(data(2, 0)), Some(UserId(1)));
    }

    #[test]
    fn test_minutes_until_expiry() {
        assert!(data(1, 0).minutes_until_expiry() >= 59);
        assert_eq!(data(1, 90).minutes_until_expiry(), 0);
    }
}
