use std::sync::Arc;

use parley_persist::{CredentialStore, NewUser, PersistError, User};

use crate::claims::UserIdentity;
use crate::error::{AuthError, Result};
use crate::password::PasswordHasher;
use crate::token::{SessionToken, TokenIssuer};

// Verified against for unknown usernames so both failure paths pay for bcrypt.
const PLACEHOLDER_SECRET: &str = "parley-placeholder-password";

/// Registration, login and token verification.
///
/// Sessions are stateless: a token stays valid until it expires, and logout
/// changes nothing server-side.
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: TokenIssuer,
    placeholder_digest: String,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: TokenIssuer,
    ) -> Result<Self> {
        let placeholder_digest = hasher.hash(PLACEHOLDER_SECRET)?;
        Ok(Self {
            credentials,
            hasher,
            tokens,
            placeholder_digest,
        })
    }
    
    /// Create an account. The username is stored exactly as given.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        require_credentials(username, password)?;
        
        if self.credentials.find_by_username(username).await?.is_some() {
            tracing::info!(username = %username, "Registration refused: username taken");
            return Err(AuthError::Conflict);
        }
        
        let password_digest = self.hash_password(password).await?;
        let new_user = NewUser {
            username: username.to_string(),
            password_digest,
        };
        
        let user = self
            .credentials
            .create_user(new_user)
            .await
            .map_err(|e| match e {
                PersistError::UsernameTaken(_) => AuthError::Conflict,
                other => AuthError::Store(other),
            })?;
        
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }
    
    /// Exchange credentials for a session token
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken> {
        require_credentials(username, password)?;
        
        let user = self.credentials.find_by_username(username).await?;
        let digest = user
            .as_ref()
            .map_or(self.placeholder_digest.clone(), |u| u.password_digest.clone());
        let matches = self.verify_password(password, digest).await?;
        
        let user = match user {
            Some(user) if matches => user,
            _ => {
                tracing::warn!(username = %username, "Login rejected");
                return Err(AuthError::Unauthorized);
            }
        };
        
        let identity = UserIdentity {
            user_id: user.id,
            username: user.username,
        };
        let session = self.tokens.issue(&identity)?;
        
        tracing::info!(user_id = %identity.user_id, expires_at = %session.expires_at, "User logged in");
        Ok(session)
    }
    
    /// Resolve a bearer token to its identity. Does not touch storage.
    pub fn verify(&self, token: &str) -> Result<UserIdentity> {
        self.tokens.verify(token)
    }
    
    /// No server-side session exists, so this only records the event.
    pub fn logout(&self) {
        tracing::debug!("Logout requested");
    }
    
    async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
    }
    
    async fn verify_password(&self, password: &str, digest: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
    }
}

fn require_credentials(username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() || password.is_empty() {
        return Err(AuthError::InvalidInput("Username and password are required".to_string()));
    }
    Ok(())
}
