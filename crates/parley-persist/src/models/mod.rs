mod db_message;
mod db_thread;
mod db_user;

// Export database-agnostic models
pub use db_message::{DBMessage, Exchange, MessageRole};
pub use db_thread::{AppendOutcome, Thread, ThreadSummary};
pub use db_user::{NewUser, User};
