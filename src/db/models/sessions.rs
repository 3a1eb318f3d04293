//! Database models for refresh sessions.
//!
//! One session row exists per (user, device) login. Its `refresh_token_hash`
//! always holds the hash of the *current* refresh token for that login;
//! rotation replaces the hash in place rather than inserting a new row.

use crate::types::{SessionId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new session
#[derive(Debug, Clone)]
pub struct SessionCreateDBRequest {
    pub user_id: UserId,
    pub device_id: String,
    pub refresh_token_hash: String,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Database response for a session
#[derive(Debug, Clone, FromRow)]
pub struct SessionDBResponse {
    pub id: SessionId,
    pub user_id: UserId,
    pub device_id: String,
    pub refresh_token_hash: String,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl SessionDBResponse {
    /// Whether the session can still be used to refresh at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at.is_none_or(|expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn session(expires_at: Option<DateTime<Utc>>, revoked_at: Option<DateTime<Utc>>) -> SessionDBResponse {
        SessionDBResponse {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            device_id: "d1".to_string(),
            refresh_token_hash: "hash".to_string(),
            user_agent: None,
            ip: None,
            created_at: Utc::now(),
            expires_at,
            revoked_at,
        }
    }

    #[test]
    fn test_active_when_unbounded_and_unrevoked() {
        assert!(session(None, None).is_active(Utc::now()));
    }

    #[test]
    fn test_inactive_when_revoked() {
        let now = Utc::now();
        assert!(!session(None, Some(now)).is_active(now));
    }

    #[test]
    fn test_inactive_when_expired() {
        let now = Utc::now();
        assert!(!session(Some(now - Duration::seconds(1)), None).is_active(now));
        assert!(session(Some(now + Duration::seconds(1)), None).is_active(now));
    }
}
