//! Orchestrates one authenticated request: verify the caller, enforce
//! ownership through the store, call the provider, persist the exchange.

use std::sync::Arc;
use std::time::Duration;

use parley_auth::{AuthService, UserIdentity};
use parley_llm::{CompletionProvider, Message};
use parley_persist::{DBMessage, Exchange, PersistError, ThreadStore, ThreadSummary};

use crate::error::{ApiError, ApiResult};

pub struct SessionController {
    auth: Arc<AuthService>,
    threads: Arc<dyn ThreadStore>,
    provider: Arc<dyn CompletionProvider>,
    provider_timeout: Duration,
}

impl SessionController {
    pub fn new(
        auth: Arc<AuthService>,
        threads: Arc<dyn ThreadStore>,
        provider: Arc<dyn CompletionProvider>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            auth,
            threads,
            provider,
            provider_timeout,
        }
    }
    
    /// Send one user message and persist it together with the reply.
    /// 
    /// Nothing is written unless the provider answers in time. A reply that
    /// arrives after the caller went away is still persisted.
    pub async fn submit_message(&self, token: &str, thread_id: &str, text: &str) -> ApiResult<String> {
        let caller = self.authenticate(token)?;
        
        if text.trim().is_empty() {
            return Err(ApiError::InvalidInput("Message is required".to_string()));
        }
        if thread_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("Thread id is required".to_string()));
        }
        
        // Detached: once started, the exchange completes and persists even if
        // the request future is dropped.
        let exchange = tokio::spawn(run_exchange(
            self.threads.clone(),
            self.provider.clone(),
            self.provider_timeout,
            caller.user_id,
            thread_id.to_string(),
            text.to_string(),
        ));
        
        match exchange.await {
            Ok(result) => result,
            Err(e) => Err(ApiError::Internal(format!("Exchange task failed: {}", e))),
        }
    }
    
    pub async fn list_my_threads(&self, token: &str) -> ApiResult<Vec<ThreadSummary>> {
        let caller = self.authenticate(token)?;
        Ok(self.threads.list_threads(&caller.user_id).await?)
    }
    
    pub async fn get_my_thread(&self, token: &str, thread_id: &str) -> ApiResult<Vec<DBMessage>> {
        let caller = self.authenticate(token)?;
        Ok(self.threads.get_thread(&caller.user_id, thread_id).await?)
    }
    
    pub async fn delete_my_thread(&self, token: &str, thread_id: &str) -> ApiResult<()> {
        let caller = self.authenticate(token)?;
        self.threads.delete_thread(&caller.user_id, thread_id).await?;
        tracing::info!(user_id = %caller.user_id, thread_id = %thread_id, "Thread deleted");
        Ok(())
    }
    
    fn authenticate(&self, token: &str) -> ApiResult<UserIdentity> {
        Ok(self.auth.verify(token)?)
    }
}

async fn run_exchange(
    threads: Arc<dyn ThreadStore>,
    provider: Arc<dyn CompletionProvider>,
    provider_timeout: Duration,
    user_id: String,
    thread_id: String,
    text: String,
) -> ApiResult<String> {
    let history = match threads.get_thread(&user_id, &thread_id).await {
        Ok(messages) => messages,
        Err(PersistError::ThreadNotFound(_)) => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    
    let mut prompt: Vec<Message> = history.iter().map(Message::from).collect();
    prompt.push(Message::human(text.as_str()));
    
    let reply = match tokio::time::timeout(provider_timeout, provider.generate_reply(&prompt)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => return Err(ApiError::UpstreamFailure(format!("{:#}", e))),
        Err(_) => {
            return Err(ApiError::UpstreamFailure(format!(
                "No reply within {} ms",
                provider_timeout.as_millis()
            )))
        }
    };
    
    // A foreign thread id surfaces here as NotFound, after the provider call.
    let outcome = threads
        .append_exchange(&user_id, &thread_id, Exchange::new(text, reply.clone()))
        .await?;
    
    tracing::info!(
        user_id = %user_id,
        thread_id = %thread_id,
        history_len = history.len(),
        outcome = ?outcome,
        "Exchange committed"
    );
    
    Ok(reply)
}
