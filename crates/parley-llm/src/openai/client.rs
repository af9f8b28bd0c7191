// OpenAI-compatible chat completions client

use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, TokenUsage};
use crate::types::Message;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const ERROR_BODY_LIMIT: usize = 512;

/// OpenAI client (HTTP direct, no SDK)
pub struct OpenAIClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl OpenAIClient {
    /// Create new client with API key against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, OPENAI_API_BASE, DEFAULT_TIMEOUT)
    }

    /// Create a client for any OpenAI-compatible endpoint.
    ///
    /// `timeout` bounds the whole request, so a hung upstream surfaces as an error.
    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build chat completion request payload
    pub(crate) fn build_chat_request(
        &self,
        model: &str,
        messages: &[Message],
        options: &ChatOptions,
    ) -> Value {
        let openai_messages: Vec<Value> = messages
            .iter()
            .map(convert_message)
            .collect();

        let mut request = serde_json::json!({
            "model": model,
            "messages": openai_messages,
            "stream": false,
        });

        if let Some(obj) = request.as_object_mut() {
            // o1 and gpt-5 models use different parameter names
            let is_reasoning_model = model.starts_with("o1") || model.starts_with("gpt-5");

            if let Some(temp) = options.temperature {
                // o1 and gpt-5 models don't support temperature
                if !is_reasoning_model {
                    obj.insert("temperature".to_string(), serde_json::json!(temp));
                }
            }
            if let Some(max_tokens) = options.max_tokens {
                let token_field = if is_reasoning_model {
                    "max_completion_tokens"
                } else {
                    "max_tokens"
                };
                obj.insert(token_field.to_string(), serde_json::json!(max_tokens));
            }
        }

        request
    }
}

/// Convert our Message type to OpenAI format
fn convert_message(message: &Message) -> Value {
    serde_json::json!({
        "role": message.role(),
        "content": message.content(),
    })
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl ChatClient for OpenAIClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_chat_request(&request.model, &request.messages, &request.options);
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion request");

        let response = self.http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Failed to send chat completion request")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, truncate_body(&body));
        }

        let raw: Value = response
            .json()
            .await
            .context("Failed to read chat completion response")?;
        let completion: ChatCompletion = serde_json::from_value(raw.clone())
            .context("Unexpected chat completion response shape")?;

        let first = completion.choices.into_iter().next();
        let (content, finish_reason) = match first {
            Some(choice) => (choice.message.content, choice.finish_reason),
            None => (None, None),
        };

        Ok(ChatResponse {
            content,
            usage: completion.usage.map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason,
            raw,
        })
    }
}
