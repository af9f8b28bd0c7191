use crate::error::Result;

/// bcrypt work factor used when none is configured
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// One-way password digest primitive.
///
/// Implementations are blocking; callers on the async runtime should move
/// them onto the blocking pool.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, secret: &str) -> Result<String>;
    
    fn verify(&self, secret: &str, digest: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
    
    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, secret: &str) -> Result<String> {
        Ok(bcrypt::hash(secret, self.cost)?)
    }
    
    fn verify(&self, secret: &str, digest: &str) -> Result<bool> {
        Ok(bcrypt::verify(secret, digest)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bcrypt_round_trip() {
        let hasher = BcryptHasher::new(4);
        let digest = hasher.hash("pw123").unwrap();

        assert_ne!(digest, "pw123");
        assert!(hasher.verify("pw123", &digest).unwrap());
        assert!(!hasher.verify("pw124", &digest).unwrap());
    }

    #[test]
    fn test_same_password_salts_differently() {
        let hasher = BcryptHasher::new(4);
        assert_ne!(hasher.hash("pw").unwrap(), hasher.hash("pw").unwrap());
    }

    #[test]
    fn test_invalid_cost_is_an_error() {
        assert!(BcryptHasher::new(2).hash("pw").is_err());
    }

    #[test]
    fn test_malformed_digest_is_an_error() {
        assert!(BcryptHasher::new(4).verify("pw", "not-a-digest").is_err());
    }
}
