#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use parley_api::{
    config::{Config, LlmProvider, StorageBackend},
    router::build_router,
    state::AppState,
};
use parley_auth::{AuthService, BcryptHasher, TokenIssuer};
use parley_llm::{CompletionProvider, Message};
use parley_persist::MemoryStore;

pub const JWT_SECRET: &str = "test-secret";

#[derive(Clone, Copy)]
pub enum Behavior {
    Reply,
    Fail,
    Stall(Duration),
}

/// Provider double that records every history it is given
pub struct FakeProvider {
    behavior: Behavior,
    calls: AtomicUsize,
    histories: Mutex<Vec<Vec<Message>>>,
}

impl FakeProvider {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            histories: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_history(&self) -> Vec<Message> {
        self.histories.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn generate_reply(&self, history: &[Message]) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.histories.lock().unwrap().push(history.to_vec());

        match self.behavior {
            Behavior::Reply => {
                let last = history.last().map(|m| m.content().to_string()).unwrap_or_default();
                Ok(format!("reply to: {}", last))
            }
            Behavior::Fail => anyhow::bail!("provider exploded"),
            Behavior::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok("too late".to_string())
            }
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub provider: Arc<FakeProvider>,
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.storage.backend = StorageBackend::Memory;
    config.llm.provider = LlmProvider::Echo;
    config.llm.timeout_ms = 200;
    config.auth.bcrypt_cost = 4;
    config.jwt_secret = JWT_SECRET.to_string();
    config
}

pub fn token_issuer() -> TokenIssuer {
    TokenIssuer::new(JWT_SECRET, parley_auth::DEFAULT_TOKEN_TTL).unwrap()
}

pub fn spawn_app(behavior: Behavior) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(FakeProvider::new(behavior));

    let auth = Arc::new(
        AuthService::new(store.clone(), Arc::new(BcryptHasher::new(4)), token_issuer()).unwrap(),
    );
    let state = Arc::new(AppState::new(config, auth, store.clone(), provider.clone()));

    TestApp {
        router: build_router(state),
        store,
        provider,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string());
        self.raw_request(method, uri, token, body).await
    }

    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Register and log in, returning the bearer token
    pub async fn login_as(&self, username: &str, password: &str) -> String {
        let credentials = serde_json::json!({ "username": username, "password": password });

        let (status, _) = self
            .request(Method::POST, "/api/auth/register", None, Some(credentials.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .request(Method::POST, "/api/auth/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn chat(&self, token: &str, thread_id: &str, message: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/chat",
            Some(token),
            Some(serde_json::json!({ "message": message, "threadId": thread_id })),
        )
        .await
    }
}
