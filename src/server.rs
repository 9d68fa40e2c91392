use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum::{middleware, Router};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers::{self, AppState};
use crate::middleware::{logging_middleware, rate_limit};
use crate::rate_limiter::RateLimiter;

pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let state = AppState::new(self.config.clone());

        spawn_cleanup_task(
            state.rate_limiter.clone(),
            Duration::from_secs(self.config.cleanup_interval_secs),
        );

        let app = router(state);
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Greeter server listening on {}", addr);
        tracing::info!("Health check available at /health");

        // Run server with graceful shutdown
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        Ok(())
    }
}

/// Build the application router. Exposed separately so tests can drive the
/// full middleware stack in-process.
pub fn create_app(config: Config) -> Router {
    router(AppState::new(config))
}

fn router(state: AppState) -> Router {
    // Rate limiting covers / and /version only; /health stays open so
    // infrastructure probes are never throttled.
    let limited = Router::new()
        .route("/", get(handlers::hello))
        .route("/version", get(handlers::version))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .merge(limited)
        .route("/health", get(handlers::health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

fn spawn_cleanup_task(rate_limiter: RateLimiter, interval: Duration) {
    if interval.is_zero() {
        return;
    }
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match rate_limiter.purge_expired() {
                Ok(0) => {}
                Ok(purged) => {
                    tracing::debug!(purged, "dropped expired rate limit buckets");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "rate limit bucket cleanup failed");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
