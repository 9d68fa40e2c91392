use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::config::Config;
use crate::rate_limiter::RateLimiter;
use crate::version::VersionResolver;

/// Shared application state, cloned into every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rate_limiter: RateLimiter,
    pub version: VersionResolver,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let rate_limiter = RateLimiter::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
        );
        let version = VersionResolver::new(config.version_file.clone());

        Self {
            config: Arc::new(config),
            rate_limiter,
            version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub agent_name: String,
}

/// Main greeting endpoint.
pub async fn hello(State(state): State<AppState>) -> Json<GreetingResponse> {
    let current_time = Utc::now().format("%H:%M");
    let message = format!(
        "Ciao, mi chiamo {}, versione {}, sono le ore {}.",
        state.config.agent_name,
        state.version.resolve(),
        current_time
    );

    Json(GreetingResponse { message })
}

/// Health check endpoint, kept outside rate limiting so liveness and
/// readiness probes are never throttled.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.resolve(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Version endpoint.
pub async fn version(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        version: state.version.resolve(),
        agent_name: state.config.agent_name.clone(),
    })
}
