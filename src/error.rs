use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        description: String,
        retry_after: Option<u64>,
    },
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn rate_limited(description: impl Into<String>, retry_after: u64) -> Self {
        ApiError::RateLimitExceeded {
            description: description.into(),
            retry_after: Some(retry_after),
        }
    }
}

/// Wire format for error responses. `retry_after` serializes as `null`
/// rather than being omitted when no hint is available.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub description: String,
    pub retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimitExceeded {
                description,
                retry_after,
            } => {
                let body = ErrorResponse {
                    error: "Rate limit exceeded".to_string(),
                    description,
                    retry_after,
                };
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                if let Some(secs) = retry_after {
                    response
                        .headers_mut()
                        .insert("retry-after", HeaderValue::from(secs));
                }
                response
            }
            ApiError::Internal(message) => {
                let body = ErrorResponse {
                    error: "Internal server error".to_string(),
                    description: message,
                    retry_after: None,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}
