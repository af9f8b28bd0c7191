use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use parley_auth::AuthError;
use parley_persist::PersistError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    
    #[error("{0}")]
    Conflict(String),
    
    #[error("{0}")]
    Unauthorized(String),
    
    #[error("{0}")]
    NotFound(String),
    
    /// Provider error or timeout; the detail is logged, never returned
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn unauthenticated() -> Self {
        Self::Unauthorized("Authentication required".to_string())
    }
    
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
    
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::UpstreamFailure(_) => "upstream_failure",
            Self::Internal(_) => "internal",
        }
    }
    
    fn public_message(&self) -> String {
        match self {
            Self::UpstreamFailure(_) => "Failed to get a reply from the assistant".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::UpstreamFailure(detail) => tracing::error!(error = %detail, "Completion provider failed"),
            Self::Internal(detail) => tracing::error!(error = %detail, "Internal error"),
            _ => {}
        }
        
        let body = ErrorBody {
            error: self.public_message(),
            code: self.code().to_string(),
        };
        
        (self.status(), Json(body)).into_response()
    }
}

impl From<PersistError> for ApiError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::ThreadNotFound(_) => Self::NotFound("Thread not found".to_string()),
            PersistError::UsernameTaken(_) => Self::Conflict("Username already exists".to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => Self::InvalidInput(msg),
            AuthError::Conflict => Self::Conflict(err.to_string()),
            AuthError::Unauthorized => Self::Unauthorized(err.to_string()),
            AuthError::Unauthenticated => Self::unauthenticated(),
            AuthError::Store(inner) => inner.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(reason = %rejection.body_text(), "Rejected request body");
        Self::InvalidInput("Invalid JSON body".to_string())
    }
}
