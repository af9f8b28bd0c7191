use async_trait::async_trait;
use crate::models::{AppendOutcome, DBMessage, Exchange, NewUser, ThreadSummary, User};
use crate::error::Result;

/// Persists user identities and password digests
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Store a new user; `UsernameTaken` on an exact, case-sensitive match
    async fn create_user(&self, user: NewUser) -> Result<User>;
    
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Persists threads and their ordered message lists, scoped by owner.
/// 
/// Every read and write checks ownership. A thread owned by someone else is
/// reported as `ThreadNotFound`, exactly like a missing one.
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Owner's threads, most recently updated first
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>>;
    
    /// Full ordered history of one thread
    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Vec<DBMessage>>;
    
    /// Append both messages of an exchange in one atomic write, creating the
    /// thread (titled from the user message) when it does not exist yet.
    /// 
    /// This is the only mutation besides deletion.
    async fn append_exchange(
        &self,
        owner_id: &str,
        thread_id: &str,
        exchange: Exchange,
    ) -> Result<AppendOutcome>;
    
    /// Remove a thread and all of its messages
    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()>;
    
    /// Cheap liveness probe for health checks
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
