use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::{
    config::{Config, LlmProvider, StorageBackend},
    router::build_router,
    state::AppState,
};
use parley_auth::{AuthService, BcryptHasher, TokenIssuer};
use parley_llm::{ChatCompletionProvider, ChatOptions, CompletionProvider, EchoProvider, OpenAIClient};
use parley_persist::{CredentialStore, MemoryStore, ThreadStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    
    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    
    // Initialize logging
    init_logging(&config);
    
    tracing::info!("Starting Parley API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);
    
    // Initialize storage
    let (credentials, threads) = build_stores(&config).await?;
    
    // Initialize completion provider
    let provider = build_provider(&config)?;
    
    // Initialize auth
    let tokens = TokenIssuer::new(&config.jwt_secret, config.auth.token_ttl())?;
    let hasher = Arc::new(BcryptHasher::new(config.auth.bcrypt_cost));
    let auth = Arc::new(AuthService::new(credentials, hasher, tokens)?);
    
    // Create application state
    let state = Arc::new(AppState::new(config.clone(), auth, threads, provider));
    
    // Build router
    let app = build_router(state);
    
    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/openapi.json", addr);
    
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    
    tracing::info!("Server stopped");
    Ok(())
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CredentialStore>, Arc<dyn ThreadStore>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let credentials: Arc<dyn CredentialStore> = store.clone();
            let threads: Arc<dyn ThreadStore> = store;
            Ok((credentials, threads))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let store = Arc::new(
                parley_persist::MongoStore::connect(
                    &config.mongodb_uri,
                    &config.mongodb.database,
                    config.mongodb.timeout(),
                )
                .await?,
            );
            tracing::info!("MongoDB connected");
            let credentials: Arc<dyn CredentialStore> = store.clone();
            let threads: Arc<dyn ThreadStore> = store;
            Ok((credentials, threads))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("storage.backend = \"mongodb\" requires the `mongodb` feature")
        }
    }
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<dyn CompletionProvider>> {
    match config.llm.provider {
        LlmProvider::Echo => {
            tracing::warn!("Using echo provider; replies are not generated by a model");
            Ok(Arc::new(EchoProvider))
        }
        LlmProvider::OpenAI => {
            tracing::info!(model = %config.llm.model, base_url = %config.llm.base_url, "Initializing LLM client");
            let client = OpenAIClient::with_options(
                config.openai_api_key.clone(),
                config.llm.base_url.clone(),
                config.llm.timeout(),
            )?;
            
            let mut options = ChatOptions::new();
            if let Some(temperature) = config.llm.temperature {
                options = options.temperature(temperature);
            }
            if let Some(max_tokens) = config.llm.max_tokens {
                options = options.max_tokens(max_tokens);
            }
            
            let provider = ChatCompletionProvider::new(Arc::new(client), config.llm.model.clone())
                .with_options(options)
                .with_system_prompt(config.llm.system_prompt.clone());
            Ok(Arc::new(provider))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    
    let registry = tracing_subscriber::registry().with(env_filter);
    
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
