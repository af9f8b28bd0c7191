use std::sync::Arc;

use parley_auth::AuthService;
use parley_llm::CompletionProvider;
use parley_persist::ThreadStore;

use crate::config::Config;
use crate::controller::SessionController;

/// Shared application state passed to all handlers
/// 
/// All resources are wrapped in Arc for sharing across async tasks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<AuthService>,
    pub controller: Arc<SessionController>,
    pub threads: Arc<dyn ThreadStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        auth: Arc<AuthService>,
        threads: Arc<dyn ThreadStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let controller = SessionController::new(
            auth.clone(),
            threads.clone(),
            provider,
            config.llm.timeout(),
        );
        
        Self {
            config: Arc::new(config),
            auth,
            controller: Arc::new(controller),
            threads,
        }
    }
}
