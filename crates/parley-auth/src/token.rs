use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::claims::{Claims, UserIdentity};
use crate::error::{AuthError, Result};

/// Seven days
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A signed token and the instant it stops verifying
#[derive(Debug, Clone, Serialize)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and checks HS256 session tokens. Holds no per-session state.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::InvalidInput("Token secret must not be empty".to_string()));
        }
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|_| AuthError::InvalidInput("Token lifetime is out of range".to_string()))?;
        
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);
        
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }
    
    pub fn issue(&self, identity: &UserIdentity) -> Result<SessionToken> {
        self.issue_at(identity, Utc::now())
    }
    
    /// Issue a token as if it were signed at `issued_at`
    pub fn issue_at(&self, identity: &UserIdentity, issued_at: DateTime<Utc>) -> Result<SessionToken> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Signing("Token expiry overflows".to_string()))?;
        
        let claims = Claims {
            sub: identity.user_id.clone(),
            username: identity.username.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        
        Ok(SessionToken { token, expires_at })
    }
    
    /// Check signature, shape and expiry. Never touches storage.
    pub fn verify(&self, token: &str) -> Result<UserIdentity> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims.into()),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserIdentity {
        UserIdentity {
            user_id: "user-1".to_string(),
            username: "alice".to_string(),
        }
    }

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(secret, DEFAULT_TOKEN_TTL).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = issuer("secret");
        let session = tokens.issue(&alice()).unwrap();

        assert_eq!(tokens.verify(&session.token).unwrap(), alice());
        let lifetime = session.expires_at - Utc::now();
        assert!(lifetime > TimeDelta::days(6));
        assert!(lifetime <= TimeDelta::days(7));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let session = issuer("secret").issue(&alice()).unwrap();
        assert!(matches!(
            issuer("other").verify(&session.token),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[test]
    fn test_malformed_token_is_rejected() {
        let tokens = issuer("secret");
        assert!(matches!(tokens.verify(""), Err(AuthError::Unauthenticated)));
        assert!(matches!(tokens.verify("not.a.jwt"), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let tokens = issuer("secret");
        let token = tokens.issue(&alice()).unwrap().token;
        let bob = UserIdentity {
            user_id: "user-2".to_string(),
            username: "bob".to_string(),
        };
        let other = tokens.issue(&bob).unwrap().token;

        // alice's claims under bob's signature
        let (signed_part, _) = token.rsplit_once('.').unwrap();
        let (_, signature) = other.rsplit_once('.').unwrap();
        let token = format!("{signed_part}.{signature}");

        assert!(matches!(tokens.verify(&token), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = issuer("secret");
        let issued_at = Utc::now() - TimeDelta::days(8);
        let session = tokens.issue_at(&alice(), issued_at).unwrap();

        assert!(session.expires_at < Utc::now());
        assert!(matches!(tokens.verify(&session.token), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn test_token_inside_window_is_accepted() {
        let tokens = issuer("secret");
        let issued_at = Utc::now() - TimeDelta::days(6);
        let session = tokens.issue_at(&alice(), issued_at).unwrap();

        assert!(tokens.verify(&session.token).is_ok());
    }

    #[test]
    fn test_empty_secret_is_refused() {
        assert!(TokenIssuer::new("", DEFAULT_TOKEN_TTL).is_err());
    }
}
