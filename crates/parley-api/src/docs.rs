use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::error::ErrorBody;
use crate::routes::{self, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::auth::logout,
        routes::chat::send_message,
        routes::threads::list_threads,
        routes::threads::get_thread,
        routes::threads::delete_thread,
    ),
    components(schemas(
        ErrorBody,
        MessageResponse,
        routes::health::HealthResponse,
        routes::health::ServiceHealth,
        routes::auth::CredentialsRequest,
        routes::auth::LoginResponse,
        routes::chat::ChatRequest,
        routes::chat::ChatResponse,
        routes::threads::ThreadSummaryResponse,
        routes::threads::ThreadMessageResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Service status"),
        (name = "auth", description = "Registration and login"),
        (name = "chat", description = "Message submission"),
        (name = "threads", description = "Thread history and deletion")
    ),
    info(title = "Parley API")
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Serve the generated OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
