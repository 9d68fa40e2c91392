use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::net::{IpAddr, SocketAddr};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::handlers::AppState;
use crate::rate_limiter::Decision;

/// Per-route rate limiting. Runs before the handler and short-circuits with
/// a 429 once the client's window budget is spent.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let Some(client) = client_addr(&request) else {
        // Only reachable when the router is served without connect info;
        // admit rather than charge all such traffic to one fabricated key.
        warn!(
            target: "greeter::middleware",
            uri = %request.uri(),
            "no client address on request, skipping rate limit"
        );
        return Ok(next.run(request).await);
    };

    let scope = request.uri().path().to_string();

    match state.rate_limiter.check(&scope, client)? {
        Decision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert(
                "x-ratelimit-limit",
                HeaderValue::from(state.rate_limiter.limit()),
            );
            headers.insert("x-ratelimit-remaining", HeaderValue::from(remaining));
            Ok(response)
        }
        Decision::Denied { retry_after } => {
            info!(
                target: "greeter::middleware",
                client_ip = %client,
                scope = %scope,
                retry_after,
                "Rate limit exceeded"
            );
            Err(ApiError::rate_limited(
                state.rate_limiter.describe(),
                retry_after,
            ))
        }
    }
}

/// Logging middleware for request/response tracking.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_addr(&request)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    info!(
        target: "greeter::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        target: "greeter::middleware",
        %request_id,
        method = %method,
        uri = %uri,
        status = %response.status(),
        "Request completed"
    );

    response
}

/// The rate limit key is the connection peer address as seen by the server.
/// Forwarding headers are deliberately not consulted.
fn client_addr(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}
