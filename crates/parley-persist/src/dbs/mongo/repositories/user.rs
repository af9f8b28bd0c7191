use mongodb::{Client, Collection, IndexModel, bson::doc, options::IndexOptions};

use crate::dbs::mongo::models::MongoUser;
use crate::dbs::mongo::repositories::is_duplicate_key;
use crate::error::{PersistError, Result};

#[derive(Clone)]
pub struct MongoUserRepository {
    collection: Collection<MongoUser>,
}

impl MongoUserRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("users");
        Self { collection }
    }
    
    /// Unique, case-sensitive username index
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }
    
    pub async fn create_user(&self, user: &MongoUser) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(PersistError::UsernameTaken(user.username.clone())),
            Err(e) => Err(e.into()),
        }
    }
    
    pub async fn find_by_username(&self, username: &str) -> Result<Option<MongoUser>> {
        Ok(self.collection.find_one(doc! { "username": username }).await?)
    }
}
