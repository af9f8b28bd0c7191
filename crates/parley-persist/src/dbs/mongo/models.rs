use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DBMessage, MessageRole, ThreadSummary, User};

/// MongoDB user document; `_id` is the user id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub password_digest: String,
    pub created_at: bson::DateTime,
}

/// Message embedded in a thread document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: bson::DateTime,
}

/// MongoDB thread document.
///
/// `_id` is the client-chosen thread id, which makes it unique across owners,
/// and the whole message list lives in the document so one update is atomic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub thread_id: String,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<MongoMessage>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

/// Projection used for listings (no message bodies)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThreadSummary {
    #[serde(rename = "_id")]
    pub thread_id: String,
    pub title: String,
    pub updated_at: bson::DateTime,
}

pub(crate) fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

pub(crate) fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<User> for MongoUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password_digest: user.password_digest,
            created_at: to_bson_datetime(user.created_at),
        }
    }
}

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            password_digest: user.password_digest,
            created_at: from_bson_datetime(user.created_at),
        }
    }
}

impl From<DBMessage> for MongoMessage {
    fn from(msg: DBMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            created_at: to_bson_datetime(msg.created_at),
        }
    }
}

impl From<MongoMessage> for DBMessage {
    fn from(msg: MongoMessage) -> Self {
        Self {
            role: msg.role,
            content: msg.content,
            created_at: from_bson_datetime(msg.created_at),
        }
    }
}

impl From<MongoThreadSummary> for ThreadSummary {
    fn from(summary: MongoThreadSummary) -> Self {
        Self {
            thread_id: summary.thread_id,
            title: summary.title,
            updated_at: from_bson_datetime(summary.updated_at),
        }
    }
}
