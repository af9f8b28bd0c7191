pub mod types;
pub mod traits;
pub mod openai;
pub mod provider;

pub use traits::{
    ChatClient,
    CompletionProvider,
    ChatRequest, ChatResponse, ChatOptions,
    TokenUsage,
};

pub use openai::OpenAIClient;
pub use provider::{ChatCompletionProvider, EchoProvider};
pub use types::Message;
