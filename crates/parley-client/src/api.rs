use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::{
    de::{DeserializeOwned, IgnoredAny},
    Deserialize, Serialize,
};
use serde_json::json;

use crate::error::{ClientError, ErrorBody, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub thread_id: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
    
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The HTTP API as the client sees it
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn register(&self, username: &str, password: &str) -> Result<()>;
    
    /// Returns the bearer token
    async fn login(&self, username: &str, password: &str) -> Result<String>;
    
    async fn logout(&self, token: Option<&str>) -> Result<()>;
    
    /// Returns the assistant reply once the exchange is stored
    async fn send_message(&self, token: &str, thread_id: &str, message: &str) -> Result<String>;
    
    async fn list_threads(&self, token: &str) -> Result<Vec<ThreadSummary>>;
    
    async fn get_thread(&self, token: &str, thread_id: &str) -> Result<Vec<ChatMessage>>;
    
    async fn delete_thread(&self, token: &str, thread_id: &str) -> Result<()>;
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

/// reqwest implementation of [`ChatBackend`]
#[derive(Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }
    
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidInput(format!("Invalid server URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidInput("Invalid server URL".to_string()));
        }
        
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        
        Ok(Self { http_client, base_url })
    }
    
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
    
    /// Append path segments to the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidInput("Invalid server URL".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
    
    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ClientError::Decode(e.to_string()));
        }
        
        let body = response.json::<ErrorBody>().await.ok();
        let err = ClientError::from_response(status.as_u16(), body);
        tracing::debug!(status = status.as_u16(), error = %err, "API request failed");
        Err(err)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn register(&self, username: &str, password: &str) -> Result<()> {
        let url = self.endpoint(&["api", "auth", "register"])?;
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "username": username, "password": password }));
        self.execute::<IgnoredAny>(request).await?;
        Ok(())
    }
    
    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.endpoint(&["api", "auth", "login"])?;
        let request = self
            .http_client
            .post(url)
            .json(&json!({ "username": username, "password": password }));
        Ok(self.execute::<LoginResponse>(request).await?.token)
    }
    
    async fn logout(&self, token: Option<&str>) -> Result<()> {
        let url = self.endpoint(&["api", "auth", "logout"])?;
        let mut request = self.http_client.post(url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        self.execute::<IgnoredAny>(request).await?;
        Ok(())
    }
    
    async fn send_message(&self, token: &str, thread_id: &str, message: &str) -> Result<String> {
        let url = self.endpoint(&["api", "chat"])?;
        let request = self
            .http_client
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "message": message, "threadId": thread_id }));
        Ok(self.execute::<ChatReply>(request).await?.reply)
    }
    
    async fn list_threads(&self, token: &str) -> Result<Vec<ThreadSummary>> {
        let url = self.endpoint(&["api", "thread"])?;
        self.execute(self.http_client.get(url).bearer_auth(token)).await
    }
    
    async fn get_thread(&self, token: &str, thread_id: &str) -> Result<Vec<ChatMessage>> {
        let url = self.endpoint(&["api", "thread", thread_id])?;
        self.execute(self.http_client.get(url).bearer_auth(token)).await
    }
    
    async fn delete_thread(&self, token: &str, thread_id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "thread", thread_id])?;
        self.execute::<IgnoredAny>(self.http_client.delete(url).bearer_auth(token)).await?;
        Ok(())
    }
}
