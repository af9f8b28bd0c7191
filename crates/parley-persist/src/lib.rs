pub mod models;
pub mod title;
pub mod trait_client;
pub mod memory;
pub mod error;
#[cfg(feature = "mongodb")]
pub mod dbs;

pub use models::{AppendOutcome, DBMessage, Exchange, MessageRole, NewUser, Thread, ThreadSummary, User};
pub use trait_client::{CredentialStore, ThreadStore};
pub use memory::MemoryStore;
pub use error::PersistError;
pub use title::derive_title;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
