use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

use crate::api::ChatBackend;
use crate::error::{ClientError, Result};
use crate::reveal::{Reveal, RevealFrame, DEFAULT_REVEAL_INTERVAL};
use crate::state::{ReplyOutcome, SessionState, SubmitBlocked, SwitchTicket};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Submission refused: {0:?}")]
    Blocked(SubmitBlocked),
    
    #[error(transparent)]
    Failed(#[from] ClientError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The reply is in the history and its reveal is running
    Shown,
    /// The user left the thread before the reply came back
    Stale,
    /// The user left and came back; the history was reloaded with the reply
    Reloaded,
}

/// Drives a [`SessionState`] against a [`ChatBackend`].
///
/// Methods take `&self` and may run concurrently. The state lock is never
/// held across a request; tickets decide which completion still applies.
pub struct ChatSession<B> {
    backend: B,
    state: Mutex<SessionState>,
    reveal: Mutex<Option<Reveal>>,
    reveal_interval: Duration,
}

impl<B: ChatBackend> ChatSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_state(backend, SessionState::new())
    }
    
    pub fn with_state(backend: B, state: SessionState) -> Self {
        Self {
            backend,
            state: Mutex::new(state),
            reveal: Mutex::new(None),
            reveal_interval: DEFAULT_REVEAL_INTERVAL,
        }
    }
    
    pub fn with_reveal_interval(mut self, interval: Duration) -> Self {
        self.reveal_interval = interval;
        self
    }
    
    pub fn backend(&self) -> &B {
        &self.backend
    }
    
    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> SessionState {
        self.lock_state().clone()
    }
    
    pub fn set_draft(&self, draft: impl Into<String>) {
        self.lock_state().set_draft(draft);
    }
    
    pub fn take_notice(&self) -> Option<String> {
        self.lock_state().take_notice()
    }
    
    /// Frames of the running reveal, if any
    pub fn reveal_frames(&self) -> Option<watch::Receiver<RevealFrame>> {
        self.lock_reveal().as_ref().map(Reveal::subscribe)
    }
    
    /// Wait until the running reveal ends; None when nothing is revealing
    pub async fn wait_for_reveal(&self) -> Option<RevealFrame> {
        let mut frames = self.reveal_frames()?;
        let finished = frames.wait_for(|frame| frame.done).await.map(|frame| frame.clone());
        Some(finished.unwrap_or_else(|_| frames.borrow().clone()))
    }
    
    pub async fn register(&self, username: &str, password: &str) -> Result<()> {
        let result = self.backend.register(username, password).await;
        if let Err(e) = &result {
            self.lock_state().record_error(e);
        }
        result
    }
    
    /// Store the token and load the thread list
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = match self.backend.login(username, password).await {
            Ok(token) => token,
            Err(e) => {
                self.lock_state().record_error(&e);
                return Err(e);
            }
        };
        
        self.lock_state().set_token(Some(token));
        tracing::info!(username = %username, "Logged in");
        self.refresh_threads().await
    }
    
    /// Local reset first; the server call is best-effort
    pub async fn logout(&self) {
        let token = {
            let mut state = self.lock_state();
            self.cancel_reveal();
            let token = state.token().map(str::to_string);
            state.logout();
            token
        };
        
        if let Err(e) = self.backend.logout(token.as_deref()).await {
            tracing::debug!(error = %e, "Server logout failed");
        }
    }
    
    pub async fn refresh_threads(&self) -> Result<()> {
        let token = self.require_token()?;
        match self.backend.list_threads(&token).await {
            Ok(threads) => {
                self.lock_state().set_threads(threads);
                Ok(())
            }
            Err(e) => {
                self.lock_state().record_error(&e);
                Err(e)
            }
        }
    }
    
    pub fn new_chat(&self) {
        let mut state = self.lock_state();
        self.cancel_reveal();
        state.start_new_chat();
    }
    
    /// Switch to a thread and load its history.
    /// 
    /// Returns false when another navigation happened while the history was
    /// in flight; the fetched messages are then discarded.
    pub async fn open_thread(&self, thread_id: &str) -> Result<bool> {
        let ticket = {
            let mut state = self.lock_state();
            self.cancel_reveal();
            state.begin_switch(thread_id)
        };
        let token = self.require_token()?;
        
        self.fetch_history(&token, &ticket).await
    }
    
    /// Refetch the current thread without navigating
    pub async fn reload_thread(&self) -> Result<bool> {
        let ticket = self.lock_state().begin_reload();
        let token = self.require_token()?;
        self.fetch_history(&token, &ticket).await
    }
    
    /// Send `text` on the current thread and start revealing the reply.
    pub async fn submit(&self, text: &str) -> std::result::Result<SubmitOutcome, SubmitError> {
        let ticket = self.lock_state().begin_submit(text).map_err(SubmitError::Blocked)?;
        
        let result = self
            .backend
            .send_message(ticket.token(), ticket.thread_id(), ticket.text())
            .await;
        
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                self.lock_state().fail_submit(&ticket, &e);
                return Err(SubmitError::Failed(e));
            }
        };
        
        let outcome = {
            let mut state = self.lock_state();
            let outcome = state.complete_submit(&ticket, reply.clone());
            if outcome == ReplyOutcome::Shown {
                *self.lock_reveal() = Some(Reveal::start(reply, self.reveal_interval));
            }
            outcome
        };
        
        if outcome == ReplyOutcome::Returned {
            if let Err(e) = self.reload_thread().await {
                tracing::debug!(error = %e, "History reload failed");
            }
        }
        
        // The thread may be new, and its position in the list has changed.
        if let Err(e) = self.refresh_threads().await {
            tracing::debug!(error = %e, "Thread list refresh failed");
        }
        
        Ok(match outcome {
            ReplyOutcome::Shown => SubmitOutcome::Shown,
            ReplyOutcome::Stale => SubmitOutcome::Stale,
            ReplyOutcome::Returned => SubmitOutcome::Reloaded,
        })
    }
    
    pub async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let token = self.require_token()?;
        if let Err(e) = self.backend.delete_thread(&token, thread_id).await {
            self.lock_state().record_error(&e);
            return Err(e);
        }
        
        let mut state = self.lock_state();
        if state.current_thread_id() == thread_id {
            self.cancel_reveal();
        }
        state.remove_thread(thread_id);
        Ok(())
    }
    
    async fn fetch_history(&self, token: &str, ticket: &SwitchTicket) -> Result<bool> {
        match self.backend.get_thread(token, ticket.thread_id()).await {
            Ok(messages) => Ok(self.lock_state().apply_history(ticket, messages)),
            Err(e) => {
                self.lock_state().fail_switch(ticket, &e);
                Err(e)
            }
        }
    }
    
    fn require_token(&self) -> Result<String> {
        let mut state = self.lock_state();
        match state.token() {
            Some(token) => Ok(token.to_string()),
            None => {
                let err = ClientError::Unauthorized("Authentication required".to_string());
                state.record_error(&err);
                Err(err)
            }
        }
    }
    
    fn cancel_reveal(&self) {
        if let Some(reveal) = self.lock_reveal().take() {
            reveal.cancel();
        }
    }
    
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
    
    fn lock_reveal(&self) -> MutexGuard<'_, Option<Reveal>> {
        self.reveal.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
