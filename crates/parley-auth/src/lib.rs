pub mod claims;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use claims::{Claims, UserIdentity};
pub use error::AuthError;
pub use password::{BcryptHasher, PasswordHasher, DEFAULT_BCRYPT_COST};
pub use service::AuthService;
pub use token::{SessionToken, TokenIssuer, DEFAULT_TOKEN_TTL};
