//! Client-side session state.
//!
//! Every async operation is split into a synchronous `begin_*` step that
//! returns a ticket and a completion step that takes the ticket back. A
//! completion whose ticket predates the latest navigation is stale and only
//! clears what it owns, so a late response can never overwrite the thread
//! the user moved to.
//!
//! Pending submissions are keyed by thread and outlive navigation, so coming
//! back to a thread while its reply is in flight does not allow a second send.

use std::collections::HashMap;

use uuid::Uuid;

use crate::api::{ChatMessage, ThreadSummary};
use crate::error::ClientError;

/// Why a submission was refused before any request was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlocked {
    /// No token; the front end should show the login entry point
    NeedsAuth,
    EmptyMessage,
    AlreadyPending,
}

/// What happened to a reply when it arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Appended to the visible history; the reveal should start
    Shown,
    /// The user navigated away first; nothing was shown
    Stale,
    /// The user left the thread and came back before the reply arrived.
    /// The visible history predates the reply and should be reloaded.
    Returned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTicket {
    epoch: u64,
    thread_id: String,
}

impl SwitchTicket {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitTicket {
    id: u64,
    epoch: u64,
    thread_id: String,
    text: String,
    token: String,
}

impl SubmitTicket {
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
    
    pub fn text(&self) -> &str {
        &self.text
    }
    
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// An in-flight submission. A thread has at most one, and it survives
/// navigation until its reply or error comes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub thread_id: String,
    pub text: String,
    id: u64,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    token: Option<String>,
    current_thread_id: String,
    is_new_chat: bool,
    messages: Vec<ChatMessage>,
    threads: Vec<ThreadSummary>,
    pending: HashMap<String, PendingReply>,
    draft: String,
    notice: Option<String>,
    epoch: u64,
    submissions: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            token: None,
            current_thread_id: new_thread_id(),
            is_new_chat: true,
            messages: Vec::new(),
            threads: Vec::new(),
            pending: HashMap::new(),
            draft: String::new(),
            notice: None,
            epoch: 0,
            submissions: 0,
        }
    }
    
    pub fn with_token(token: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.token = Some(token.into());
        state
    }
    
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
    
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
    
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
    
    pub fn current_thread_id(&self) -> &str {
        &self.current_thread_id
    }
    
    pub fn is_new_chat(&self) -> bool {
        self.is_new_chat
    }
    
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
    
    pub fn threads(&self) -> &[ThreadSummary] {
        &self.threads
    }
    
    pub fn set_threads(&mut self, threads: Vec<ThreadSummary>) {
        self.threads = threads;
    }
    
    /// The submission in flight on the current thread
    pub fn pending(&self) -> Option<&PendingReply> {
        self.pending.get(&self.current_thread_id)
    }
    
    pub fn pending_for(&self, thread_id: &str) -> Option<&PendingReply> {
        self.pending.get(thread_id)
    }
    
    pub fn draft(&self) -> &str {
        &self.draft
    }
    
    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }
    
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
    
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }
    
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
    
    /// Local-only chat with a fresh client-generated id
    pub fn start_new_chat(&mut self) {
        self.epoch += 1;
        self.current_thread_id = new_thread_id();
        self.is_new_chat = true;
        self.messages.clear();
        self.draft.clear();
    }
    
    /// Move to an existing thread; its history arrives through [`Self::apply_history`]
    pub fn begin_switch(&mut self, thread_id: impl Into<String>) -> SwitchTicket {
        self.epoch += 1;
        self.current_thread_id = thread_id.into();
        self.is_new_chat = false;
        self.messages.clear();
        self.draft.clear();
        
        SwitchTicket {
            epoch: self.epoch,
            thread_id: self.current_thread_id.clone(),
        }
    }
    
    /// Returns false, leaving state untouched, when the fetch is stale
    pub fn apply_history(&mut self, ticket: &SwitchTicket, messages: Vec<ChatMessage>) -> bool {
        if !self.is_current(ticket.epoch, &ticket.thread_id) {
            tracing::debug!(thread_id = %ticket.thread_id, "Dropping stale history");
            return false;
        }
        self.messages = messages;
        true
    }
    
    pub fn fail_switch(&mut self, ticket: &SwitchTicket, err: &ClientError) -> bool {
        if !self.is_current(ticket.epoch, &ticket.thread_id) {
            self.record_if_unauthorized(err);
            return false;
        }
        self.record_error(err);
        true
    }
    
    /// Refetch the current thread in place. Unlike [`Self::begin_switch`]
    /// nothing is cleared and older tickets stay valid.
    pub fn begin_reload(&self) -> SwitchTicket {
        SwitchTicket {
            epoch: self.epoch,
            thread_id: self.current_thread_id.clone(),
        }
    }
    
    /// Reserve the pending slot for `text` on the current thread
    pub fn begin_submit(&mut self, text: &str) -> Result<SubmitTicket, SubmitBlocked> {
        let Some(token) = self.token.clone() else {
            self.notice = Some("Please log in to send messages.".to_string());
            return Err(SubmitBlocked::NeedsAuth);
        };
        if text.trim().is_empty() {
            return Err(SubmitBlocked::EmptyMessage);
        }
        if self.pending.contains_key(&self.current_thread_id) {
            return Err(SubmitBlocked::AlreadyPending);
        }
        
        self.submissions += 1;
        let id = self.submissions;
        self.pending.insert(
            self.current_thread_id.clone(),
            PendingReply {
                thread_id: self.current_thread_id.clone(),
                text: text.to_string(),
                id,
            },
        );
        self.draft.clear();
        self.notice = None;
        
        Ok(SubmitTicket {
            id,
            epoch: self.epoch,
            thread_id: self.current_thread_id.clone(),
            text: text.to_string(),
            token,
        })
    }
    
    /// Append the exchange as one step if the user is still on its thread
    pub fn complete_submit(&mut self, ticket: &SubmitTicket, reply: impl Into<String>) -> ReplyOutcome {
        self.release_pending(ticket);
        
        if self.current_thread_id != ticket.thread_id {
            return ReplyOutcome::Stale;
        }
        if self.epoch != ticket.epoch {
            return ReplyOutcome::Returned;
        }
        
        self.messages.extend([
            ChatMessage::user(ticket.text.clone()),
            ChatMessage::assistant(reply),
        ]);
        self.is_new_chat = false;
        ReplyOutcome::Shown
    }
    
    /// Revert the optimistic submit: the text goes back to the draft
    pub fn fail_submit(&mut self, ticket: &SubmitTicket, err: &ClientError) -> bool {
        self.release_pending(ticket);
        
        if self.current_thread_id != ticket.thread_id {
            self.record_if_unauthorized(err);
            return false;
        }
        
        // Back on the thread after navigating: keep whatever was typed since.
        if self.epoch == ticket.epoch || self.draft.is_empty() {
            self.draft = ticket.text.clone();
        }
        self.record_error(err);
        true
    }
    
    /// Drop a deleted thread from the list. Returns true when it was the
    /// current one, in which case a new chat has been started.
    pub fn remove_thread(&mut self, thread_id: &str) -> bool {
        self.threads.retain(|t| t.thread_id != thread_id);
        self.pending.remove(thread_id);
        let was_current = self.current_thread_id == thread_id;
        if was_current {
            self.start_new_chat();
        }
        was_current
    }
    
    /// Forget the token and everything fetched with it
    pub fn logout(&mut self) {
        self.token = None;
        self.threads.clear();
        self.pending.clear();
        self.notice = None;
        self.start_new_chat();
    }
    
    /// Show the error's notice; an auth failure also discards the token
    pub fn record_error(&mut self, err: &ClientError) {
        self.record_if_unauthorized(err);
        self.notice = Some(err.notice());
    }
    
    fn record_if_unauthorized(&mut self, err: &ClientError) {
        if err.is_unauthorized() {
            self.token = None;
        }
    }
    
    fn is_current(&self, epoch: u64, thread_id: &str) -> bool {
        self.epoch == epoch && self.current_thread_id == thread_id
    }
    
    fn release_pending(&mut self, ticket: &SubmitTicket) {
        let owned = self
            .pending
            .get(&ticket.thread_id)
            .is_some_and(|p| p.id == ticket.id);
        if owned {
            self.pending.remove(&ticket.thread_id);
        }
    }
}

fn new_thread_id() -> String {
    Uuid::new_v4().to_string()
}
