//! In-process store used by tests and by `storage.backend = "memory"`.
//!
//! Each table sits behind one `RwLock`, so an exchange is appended inside a
//! single write section and readers never see half of it.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{AppendOutcome, DBMessage, Exchange, NewUser, Thread, ThreadSummary, User};
use crate::title::derive_title;
use crate::trait_client::{CredentialStore, ThreadStore};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    threads: RwLock<ThreadTable>,
}

#[derive(Default)]
struct ThreadTable {
    rows: HashMap<String, ThreadRow>,
    // Monotonic write counter; orders listings when timestamps tie.
    revision: u64,
}

struct ThreadRow {
    thread: Thread,
    revision: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted messages in a thread, regardless of owner.
    pub async fn message_count(&self, thread_id: &str) -> usize {
        self.threads
            .read()
            .await
            .rows
            .get(thread_id)
            .map_or(0, |row| row.thread.messages.len())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(PersistError::UsernameTaken(user.username));
        }
        let user = user.into_user();
        users.insert(user.username.clone(), user.clone());
        tracing::debug!(username = %user.username, "User created");
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

#[async_trait]
impl ThreadStore for MemoryStore {
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>> {
        let table = self.threads.read().await;
        let mut owned: Vec<&ThreadRow> = table
            .rows
            .values()
            .filter(|row| row.thread.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| b.revision.cmp(&a.revision));
        Ok(owned.into_iter().map(|row| row.thread.summary()).collect())
    }

    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Vec<DBMessage>> {
        let table = self.threads.read().await;
        match table.rows.get(thread_id) {
            Some(row) if row.thread.owner_id == owner_id => Ok(row.thread.messages.clone()),
            _ => Err(PersistError::ThreadNotFound(thread_id.to_string())),
        }
    }

    async fn append_exchange(
        &self,
        owner_id: &str,
        thread_id: &str,
        exchange: Exchange,
    ) -> Result<AppendOutcome> {
        let mut table = self.threads.write().await;
        table.revision += 1;
        let revision = table.revision;
        let now = Utc::now();

        if let Some(row) = table.rows.get_mut(thread_id) {
            if row.thread.owner_id != owner_id {
                return Err(PersistError::ThreadNotFound(thread_id.to_string()));
            }
            row.thread.messages.extend(exchange.into_messages());
            row.thread.updated_at = now;
            row.revision = revision;
            return Ok(AppendOutcome::Appended);
        }

        let thread = Thread {
            thread_id: thread_id.to_string(),
            owner_id: owner_id.to_string(),
            title: derive_title(&exchange.user().content),
            messages: Vec::from(exchange.into_messages()),
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(thread_id.to_string(), ThreadRow { thread, revision });
        tracing::debug!(owner_id = %owner_id, thread_id = %thread_id, "Thread created");
        Ok(AppendOutcome::Created)
    }

    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()> {
        let mut table = self.threads.write().await;
        let owned = table
            .rows
            .get(thread_id)
            .is_some_and(|row| row.thread.owner_id == owner_id);
        if !owned {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        table.rows.remove(thread_id);
        Ok(())
    }
}
