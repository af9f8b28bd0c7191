use std::time::Duration;

use async_trait::async_trait;
use mongodb::{Client, Database, bson::doc, options::ClientOptions};

use crate::dbs::mongo::models::{MongoMessage, MongoUser};
use crate::dbs::mongo::repositories::{MongoThreadRepository, MongoUserRepository};
use crate::error::{PersistError, Result};
use crate::models::{AppendOutcome, DBMessage, Exchange, NewUser, ThreadSummary, User};
use crate::title::derive_title;
use crate::trait_client::{CredentialStore, ThreadStore};

pub struct MongoStore {
    database: Database,
    user_repo: MongoUserRepository,
    thread_repo: MongoThreadRepository,
}

impl MongoStore {
    /// Connect to MongoDB, create indexes and return the store
    pub async fn connect(mongodb_uri: &str, database: &str, timeout: Duration) -> Result<Self> {
        let mut options = ClientOptions::parse(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        options.app_name = Some("parley".to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        
        let client = Client::with_options(options)
            .map_err(|e| PersistError::Connection(e.to_string()))?;
        
        let store = Self {
            database: client.database(database),
            user_repo: MongoUserRepository::new(&client, database),
            thread_repo: MongoThreadRepository::new(&client, database),
        };
        
        store.user_repo.ensure_indexes().await?;
        store.thread_repo.ensure_indexes().await?;
        tracing::info!(database = %database, "MongoDB store ready");
        
        Ok(store)
    }
}

#[async_trait]
impl CredentialStore for MongoStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let user = user.into_user();
        self.user_repo.create_user(&MongoUser::from(user.clone())).await?;
        Ok(user)
    }
    
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self.user_repo.find_by_username(username).await?;
        Ok(user.map(Into::into))
    }
}

#[async_trait]
impl ThreadStore for MongoStore {
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>> {
        let threads = self.thread_repo.list_threads(owner_id).await?;
        Ok(threads.into_iter().map(Into::into).collect())
    }
    
    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Vec<DBMessage>> {
        let thread = self.thread_repo
            .get_thread(owner_id, thread_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        Ok(thread.messages.into_iter().map(Into::into).collect())
    }
    
    async fn append_exchange(
        &self,
        owner_id: &str,
        thread_id: &str,
        exchange: Exchange,
    ) -> Result<AppendOutcome> {
        let title = derive_title(&exchange.user().content);
        let [user, assistant] = exchange.into_messages();
        self.thread_repo
            .append_exchange(owner_id, thread_id, &title, [MongoMessage::from(user), MongoMessage::from(assistant)])
            .await
    }
    
    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()> {
        self.thread_repo.delete_thread(owner_id, thread_id).await
    }
    
    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
