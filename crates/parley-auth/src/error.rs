use parley_persist::PersistError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),
    
    #[error("Username already exists")]
    Conflict,
    
    /// Unknown user and wrong password share this variant and its message.
    #[error("Invalid credentials")]
    Unauthorized,
    
    #[error("Authentication required")]
    Unauthenticated,
    
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    
    #[error("Token signing failed: {0}")]
    Signing(String),
    
    #[error("Storage error: {0}")]
    Store(#[from] PersistError),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
