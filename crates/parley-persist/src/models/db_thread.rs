use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use super::DBMessage;

/// Database-agnostic thread model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub thread_id: String,
    pub owner_id: String,
    pub title: String,
    pub messages: Vec<DBMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Thread {
    pub fn summary(&self) -> ThreadSummary {
        ThreadSummary {
            thread_id: self.thread_id.clone(),
            title: self.title.clone(),
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

/// Result of a committed exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The exchange was the thread's first; the thread now exists.
    Created,
    Appended,
}
