use mongodb::{Client, Collection, IndexModel, bson, bson::doc};
use futures::TryStreamExt;

use crate::dbs::mongo::models::{MongoMessage, MongoThread, MongoThreadSummary};
use crate::dbs::mongo::repositories::is_duplicate_key;
use crate::error::{PersistError, Result};
use crate::models::AppendOutcome;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }
    
    /// Listing index; `_id` already guarantees thread id uniqueness
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "owner_id": 1, "updated_at": -1 })
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    /// List threads for an owner, most recent first
    pub async fn list_threads(&self, owner_id: &str) -> Result<Vec<MongoThreadSummary>> {
        let threads = self.collection
            .clone_with_type::<MongoThreadSummary>()
            .find(doc! { "owner_id": owner_id })
            .projection(doc! { "title": 1, "updated_at": 1 })
            .sort(doc! { "updated_at": -1, "_id": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }
    
    /// Get thread by ID, only if owned by `owner_id`
    pub async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id, "owner_id": owner_id };
        Ok(self.collection.find_one(filter).await?)
    }
    
    /// Push both messages with a single upsert.
    /// 
    /// A foreign thread with the same `_id` makes the upsert collide on the
    /// primary key, which is reported as not found.
    pub async fn append_exchange(
        &self,
        owner_id: &str,
        thread_id: &str,
        title: &str,
        messages: [MongoMessage; 2],
    ) -> Result<AppendOutcome> {
        let now = bson::DateTime::now();
        let [user, assistant] = messages;
        let pair = vec![bson::to_bson(&user)?, bson::to_bson(&assistant)?];
        
        let filter = doc! { "_id": thread_id, "owner_id": owner_id };
        let update = doc! {
            "$push": { "messages": { "$each": pair } },
            "$set": { "updated_at": now },
            "$setOnInsert": { "title": title, "created_at": now },
        };
        
        match self.collection
            .update_one(filter.clone(), update.clone())
            .upsert(true)
            .await
        {
            Ok(result) if result.upserted_id.is_some() => Ok(AppendOutcome::Created),
            Ok(_) => Ok(AppendOutcome::Appended),
            Err(e) if is_duplicate_key(&e) => {
                // Either a concurrent first exchange from the same owner won the
                // insert, or the id belongs to another owner.
                let retry = self.collection.update_one(filter, update).await?;
                if retry.matched_count == 1 {
                    Ok(AppendOutcome::Appended)
                } else {
                    Err(PersistError::ThreadNotFound(thread_id.to_string()))
                }
            }
            Err(e) => Err(e.into()),
        }
    }
    
    /// Delete thread together with its embedded messages
    pub async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()> {
        let filter = doc! { "_id": thread_id, "owner_id": owner_id };
        let result = self.collection.delete_one(filter).await?;
        if result.deleted_count == 0 {
            return Err(PersistError::ThreadNotFound(thread_id.to_string()));
        }
        Ok(())
    }
}
