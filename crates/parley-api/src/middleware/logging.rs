use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Log method, uri, status and latency of every request
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();
    
    let response = next.run(req).await;
    
    let duration_ms = start.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    
    if response.status().is_server_error() {
        tracing::error!(method = %method, uri = %uri, status, duration_ms, "Request failed");
    } else if response.status().is_client_error() {
        tracing::warn!(method = %method, uri = %uri, status, duration_ms, "Request rejected");
    } else {
        tracing::info!(method = %method, uri = %uri, status, duration_ms, "Request completed");
    }
    
    response
}
