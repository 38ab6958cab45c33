use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::metrics::PROXY_LATENCY;
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// Fallback handler - forwards an admitted request to the ticket API
// backend and relays the response
pub async fn proxy_handler(State(state): State<Arc<AppState>>, request: Request) -> Response {
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let url = format!("{}{}", state.backend, path);

    // host and content-length are set by the outgoing client
    let mut headers = request.headers().clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let body = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let start = Instant::now();
    let result = state
        .client
        .request(method, url.as_str())
        .headers(headers)
        .body(body)
        .send()
        .await;
    PROXY_LATENCY.observe(start.elapsed().as_secs_f64());

    match result {
        Ok(upstream) => {
            let status = upstream.status();
            let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();

            match upstream.bytes().await {
                Ok(bytes) => {
                    let mut response = Response::builder().status(status);
                    if let Some(content_type) = content_type {
                        response = response.header(header::CONTENT_TYPE, content_type);
                    }
                    response
                        .body(Body::from(bytes))
                        .unwrap_or_else(|_| StatusCode::BAD_GATEWAY.into_response())
                }
                Err(e) => {
                    error!(url = %url, error = %e, "failed to read backend response");
                    (StatusCode::BAD_GATEWAY, "Backend read failed").into_response()
                }
            }
        }
        Err(e) => {
            error!(url = %url, error = %e, "backend request failed");
            (StatusCode::BAD_GATEWAY, "Backend request failed").into_response()
        }
    }
}
