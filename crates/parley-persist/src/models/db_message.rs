use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Database-agnostic message model.
///
/// A message's sequence position is its index in the owning thread's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DBMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl DBMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
    
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One user message plus its assistant reply; the unit of thread mutation.
///
/// The fields are private so the pair can only be built in user-then-assistant order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    user: DBMessage,
    assistant: DBMessage,
}

impl Exchange {
    pub fn new(user_text: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            user: DBMessage::user(user_text),
            assistant: DBMessage::assistant(reply),
        }
    }
    
    pub fn user(&self) -> &DBMessage {
        &self.user
    }
    
    pub fn assistant(&self) -> &DBMessage {
        &self.assistant
    }
    
    pub fn into_messages(self) -> [DBMessage; 2] {
        [self.user, self.assistant]
    }
}

// Conversion: DBMessage → parley_llm::Message
impl From<&DBMessage> for parley_llm::Message {
    fn from(msg: &DBMessage) -> Self {
        match msg.role {
            MessageRole::User => parley_llm::Message::human(msg.content.clone()),
            MessageRole::Assistant => parley_llm::Message::ai(msg.content.clone()),
        }
    }
}
