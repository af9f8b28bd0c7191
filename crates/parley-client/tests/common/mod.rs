#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use parley_client::{ChatBackend, ChatMessage, ClientError, Result, ThreadSummary};

pub const TOKEN: &str = "valid-token";

/// In-process stand-in for the HTTP API.
///
/// `hold(thread_id)` parks every request on that thread until the returned
/// `Notify` is signalled, which lets tests interleave operations.
#[derive(Default)]
pub struct FakeBackend {
    threads: Mutex<HashMap<String, Vec<ChatMessage>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fail_next_send: AtomicBool,
    tokens_expired: AtomicBool,
    send_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, thread_id: &str, messages: Vec<ChatMessage>) {
        self.threads.lock().unwrap().insert(thread_id.to_string(), messages);
    }

    pub fn hold(&self, thread_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(thread_id.to_string(), gate.clone());
        gate
    }

    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    pub fn expire_tokens(&self) {
        self.tokens_expired.store(true, Ordering::SeqCst);
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, thread_id: &str) -> Vec<ChatMessage> {
        self.threads.lock().unwrap().get(thread_id).cloned().unwrap_or_default()
    }

    async fn wait_at_gate(&self, thread_id: &str) {
        let gate = self.gates.lock().unwrap().remove(thread_id);
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }

    fn check(&self, token: &str) -> Result<()> {
        if token != TOKEN || self.tokens_expired.load(Ordering::SeqCst) {
            return Err(ClientError::Unauthorized("Authentication required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn register(&self, username: &str, _password: &str) -> Result<()> {
        if username == "taken" {
            return Err(ClientError::Conflict("Username already exists".to_string()));
        }
        Ok(())
    }

    async fn login(&self, _username: &str, password: &str) -> Result<String> {
        if password != "pw123" {
            return Err(ClientError::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(TOKEN.to_string())
    }

    async fn logout(&self, _token: Option<&str>) -> Result<()> {
        Ok(())
    }

    async fn send_message(&self, token: &str, thread_id: &str, message: &str) -> Result<String> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        self.check(token)?;
        self.wait_at_gate(thread_id).await;

        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(ClientError::UpstreamFailure("Failed to get a reply".to_string()));
        }

        let reply = format!("reply to: {}", message);
        self.threads
            .lock()
            .unwrap()
            .entry(thread_id.to_string())
            .or_default()
            .extend([ChatMessage::user(message), ChatMessage::assistant(reply.clone())]);
        Ok(reply)
    }

    async fn list_threads(&self, token: &str) -> Result<Vec<ThreadSummary>> {
        self.check(token)?;
        let mut threads: Vec<ThreadSummary> = self
            .threads
            .lock()
            .unwrap()
            .iter()
            .map(|(id, messages)| ThreadSummary {
                thread_id: id.clone(),
                title: messages.first().map(|m| m.content.clone()).unwrap_or_default(),
            })
            .collect();
        threads.sort_by(|a, b| a.thread_id.cmp(&b.thread_id));
        Ok(threads)
    }

    async fn get_thread(&self, token: &str, thread_id: &str) -> Result<Vec<ChatMessage>> {
        self.check(token)?;
        self.wait_at_gate(thread_id).await;
        self.threads
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound("Thread not found".to_string()))
    }

    async fn delete_thread(&self, token: &str, thread_id: &str) -> Result<()> {
        self.check(token)?;
        self.threads
            .lock()
            .unwrap()
            .remove(thread_id)
            .map(|_| ())
            .ok_or_else(|| ClientError::NotFound("Thread not found".to_string()))
    }
}
