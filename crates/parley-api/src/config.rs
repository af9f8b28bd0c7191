use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use parley_llm::openai::OPENAI_API_BASE;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub storage: StorageConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    
    // Secrets (from ENV only)
    #[serde(skip)]
    pub jwt_secret: String,
    #[serde(skip)]
    pub mongodb_uri: String,
    #[serde(skip)]
    pub openai_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request, provider call included
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 90,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    Mongodb,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub database: String,
    pub timeout_ms: u64,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "parley".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl MongoDbConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    /// Local acknowledgement provider, no API key needed
    Echo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_ms: u64,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            base_url: OPENAI_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: None,
            max_tokens: None,
            timeout_ms: 60_000,
            system_prompt: String::new(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_ttl_secs: u64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: parley_auth::DEFAULT_TOKEN_TTL.as_secs(),
            bcrypt_cost: parley_auth::DEFAULT_BCRYPT_COST,
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    /// 
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (PARLEY_ prefix, `__` between section and key,
    ///    e.g. PARLEY_SERVER__PORT)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());
        
        let builder = ConfigLoader::builder()
            // 1. Load default config
            .add_source(File::with_name("config/default").required(false))
            // 2. Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // 3. Environment variables override everything
            .add_source(
                Environment::with_prefix("PARLEY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
            );
        
        let config = builder.build()?;
        
        let mut cfg: Config = config.try_deserialize()?;
        cfg.load_secrets()?;
        cfg.validate()?;
        
        Ok(cfg)
    }
    
    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()));
        
        let config = builder.build()?;
        let cfg: Config = config.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }
    
    /// Secrets never come from TOML. Only the ones the selected backends
    /// need are required.
    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        self.jwt_secret = required_env("JWT_SECRET")?;
        if self.llm.provider == LlmProvider::OpenAI {
            self.openai_api_key = required_env("OPENAI_API_KEY")?;
        }
        if self.storage.backend == StorageBackend::Mongodb {
            self.mongodb_uri = required_env("MONGODB_URI")?;
        }
        Ok(())
    }
    
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Message("auth.token_ttl_secs must be positive".to_string()));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::Message("auth.bcrypt_cost must be between 4 and 31".to_string()));
        }
        if self.llm.timeout_ms == 0 {
            return Err(ConfigError::Message("llm.timeout_ms must be positive".to_string()));
        }
        if self.server.request_timeout_secs.saturating_mul(1000) <= self.llm.timeout_ms {
            tracing::warn!(
                request_timeout_secs = self.server.request_timeout_secs,
                llm_timeout_ms = self.llm.timeout_ms,
                "Request timeout does not exceed the provider timeout"
            );
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::Message(format!("{} environment variable is required", name)))
}
