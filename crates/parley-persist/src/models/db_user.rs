use std::fmt;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Stored credential record
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

// Keeps digests out of logs.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_digest", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Registration input; the store assigns id and timestamp.
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub password_digest: String,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            username: self.username,
            password_digest: self.password_digest,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
