pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limiter;
pub mod server;
pub mod version;

pub use config::Config;
pub use error::{ApiError, Result};
pub use server::{create_app, Server};
