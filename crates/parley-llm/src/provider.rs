use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::traits::{ChatClient, ChatOptions, ChatRequest, CompletionProvider};
use crate::types::Message;

/// Turns any [`ChatClient`] into a [`CompletionProvider`].
///
/// The system prompt, when set, is prepended to every history before the call.
pub struct ChatCompletionProvider {
    client: Arc<dyn ChatClient>,
    model: String,
    options: ChatOptions,
    system_prompt: Option<String>,
}

impl ChatCompletionProvider {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default(),
            system_prompt: None,
        }
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        self.system_prompt = (!prompt.trim().is_empty()).then_some(prompt);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for ChatCompletionProvider {
    async fn generate_reply(&self, history: &[Message]) -> Result<String> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend_from_slice(history);

        let request = ChatRequest::new(self.model.clone(), messages)
            .with_options(self.options.clone());
        let response = self.client.chat(request).await?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion finished"
            );
        }

        response
            .content
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("Completion provider returned an empty reply"))
    }
}

/// Local provider that acknowledges the latest user message. No network.
#[derive(Debug, Clone, Default)]
pub struct EchoProvider;

#[async_trait]
impl CompletionProvider for EchoProvider {
    async fn generate_reply(&self, history: &[Message]) -> Result<String> {
        let last = history
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Human { .. }))
            .ok_or_else(|| anyhow!("No user message to reply to"))?;
        Ok(format!("You said: {}", last.content()))
    }
}
