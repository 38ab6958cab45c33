use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

use crate::metrics::{REQUEST_TOTAL, REQUESTS_REJECTED};
use crate::state::AppState;

// Header the upstream authentication step uses to hand us the
// validated principal
pub const USER_ID_HEADER: &str = "x-user-id";

// Validated identity attached by the auth step upstream of the limiter
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
}

// Reads the upstream identity header and attaches it as a request
// extension so later middleware can key on the user instead of the IP.
pub async fn attach_identity(mut request: Request, next: Next) -> Response {
    let user = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty())
        .map(|id| AuthUser { id: id.to_string() });

    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}

// Quota key for a request: authenticated user id, else peer IP,
// else the shared "anonymous" bucket.
fn resolve_client_id(user: Option<&AuthUser>, peer: Option<SocketAddr>) -> String {
    if let Some(user) = user {
        return user.id.clone();
    }
    if let Some(peer) = peer {
        return peer.ip().to_string();
    }
    "anonymous".to_string()
}

// Admission middleware. Rejected requests get a 429 and never reach
// the proxy; quota exhaustion is routine control flow, not an error.
pub async fn enforce_rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    REQUEST_TOTAL.inc();

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = resolve_client_id(request.extensions().get::<AuthUser>(), peer);

    if !state.limiter.admit(&client, Instant::now()) {
        REQUESTS_REJECTED.inc();
        warn!(client = %client, "rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded").into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::RateLimiter;
    use axum::{Router, body::Body, http::Request as HttpRequest, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[test]
    fn user_id_wins_over_peer_address() {
        let user = AuthUser {
            id: "u42".to_string(),
        };
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(resolve_client_id(Some(&user), Some(peer)), "u42");
    }

    #[test]
    fn peer_address_used_when_unauthenticated() {
        let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
        assert_eq!(resolve_client_id(None, Some(peer)), "10.0.0.1");
        // port must not split one host into many buckets
        let other_port: SocketAddr = "10.0.0.1:6000".parse().unwrap();
        assert_eq!(resolve_client_id(None, Some(other_port)), "10.0.0.1");
    }

    #[test]
    fn anonymous_fallback_when_nothing_known() {
        assert_eq!(resolve_client_id(None, None), "anonymous");
    }

    fn test_router(requests_per_minute: u32, requests_per_hour: u32) -> Router {
        let state = Arc::new(AppState {
            client: reqwest::Client::new(),
            backend: String::new(),
            limiter: RateLimiter::new(requests_per_minute, requests_per_hour),
        });
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(
                state,
                enforce_rate_limit,
            ))
            .layer(axum::middleware::from_fn(attach_identity))
    }

    async fn send(router: &Router, user: Option<&str>) -> (StatusCode, String) {
        let mut request = HttpRequest::builder().uri("/ping");
        if let Some(user) = user {
            request = request.header(USER_ID_HEADER, user);
        }
        let response = router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&body).to_string())
    }

    #[tokio::test]
    async fn rejects_with_429_once_quota_is_spent() {
        let router = test_router(2, 100);
        assert_eq!(send(&router, Some("u1")).await.0, StatusCode::OK);
        assert_eq!(send(&router, Some("u1")).await.0, StatusCode::OK);

        let (status, body) = send(&router, Some("u1")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body, "Rate limit exceeded");
    }

    #[tokio::test]
    async fn distinct_users_get_their_own_quota() {
        let router = test_router(1, 100);
        assert_eq!(send(&router, Some("u1")).await.0, StatusCode::OK);
        assert_eq!(
            send(&router, Some("u1")).await.0,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(send(&router, Some("u2")).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn identityless_requests_share_the_anonymous_bucket() {
        // no auth header and no connect info: both requests land on the
        // shared "anonymous" key and jointly exhaust it
        let router = test_router(2, 100);
        assert_eq!(send(&router, None).await.0, StatusCode::OK);
        assert_eq!(send(&router, None).await.0, StatusCode::OK);
        assert_eq!(send(&router, None).await.0, StatusCode::TOO_MANY_REQUESTS);
    }
}
