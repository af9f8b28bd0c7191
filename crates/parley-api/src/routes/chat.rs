use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{
    error::ApiResult,
    middleware::auth::BearerToken,
    state::AppState,
};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    /// Client-chosen id; the thread is created by its first exchange
    pub thread_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
}

/// Send a message and wait for the assistant's full reply
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply generated and exchange saved", body = ChatResponse),
        (status = 400, description = "Empty message or thread id", body = crate::error::ErrorBody),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Thread belongs to another user", body = crate::error::ErrorBody),
        (status = 500, description = "Completion provider failed or timed out", body = crate::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(req) = payload?;
    let reply = state
        .controller
        .submit_message(&token, &req.thread_id, &req.message)
        .await?;
    
    Ok(Json(ChatResponse { reply }))
}
