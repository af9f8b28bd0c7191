pub mod auth;
pub mod chat;
pub mod health;
pub mod threads;

use serde::Serialize;
use utoipa::ToSchema;

/// `{ "message": ... }` acknowledgement body
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
