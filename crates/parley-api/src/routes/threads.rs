use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use parley_persist::{DBMessage, ThreadSummary};

use crate::{
    error::ApiResult,
    middleware::auth::BearerToken,
    routes::MessageResponse,
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummaryResponse {
    pub thread_id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

impl From<ThreadSummary> for ThreadSummaryResponse {
    fn from(summary: ThreadSummary) -> Self {
        Self {
            thread_id: summary.thread_id,
            title: summary.title,
            updated_at: summary.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMessageResponse {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DBMessage> for ThreadMessageResponse {
    fn from(msg: DBMessage) -> Self {
        Self {
            role: msg.role.as_str().to_string(),
            content: msg.content,
            created_at: msg.created_at,
        }
    }
}

/// List the caller's threads, most recently updated first
#[utoipa::path(
    get,
    path = "/api/thread",
    responses(
        (status = 200, description = "Caller's threads", body = Vec<ThreadSummaryResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
) -> ApiResult<Json<Vec<ThreadSummaryResponse>>> {
    let threads = state.controller.list_my_threads(&token).await?;
    Ok(Json(threads.into_iter().map(Into::into).collect()))
}

/// Full message history of one thread
#[utoipa::path(
    get,
    path = "/api/thread/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Messages in order", body = Vec<ThreadMessageResponse>),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Thread not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<Vec<ThreadMessageResponse>>> {
    let messages = state.controller.get_my_thread(&token, &thread_id).await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

/// Delete a thread and all of its messages
#[utoipa::path(
    delete,
    path = "/api/thread/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread ID")
    ),
    responses(
        (status = 200, description = "Thread deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorBody),
        (status = 404, description = "Thread not found", body = crate::error::ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    state.controller.delete_my_thread(&token, &thread_id).await?;
    Ok(Json(MessageResponse::new("Thread deleted")))
}
