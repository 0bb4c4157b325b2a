use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned account identifier.
///
/// Every cache key carries one, so cached data can never be served to a
/// different account after a session switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// The API only assigns positive ids; anything else means "no account yet".
    pub fn is_valid(&self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validity() {
        assert!(UserId(7).is_valid());
        assert!(!UserId(0).is_valid());
        assert!(!UserId(-1).is_valid());
    }

    #[test]
    fn test_user_deserializes_without_verified_flag() {
        let user: User = serde_json::from_str(r#"{"id": 3, "email": "a@b.c"}"#).unwrap();
        assert_eq!(user.id, UserId(3));
        assert!(!user.email_verified);
    }
}
