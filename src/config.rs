use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_AGENT_NAME: &str = "DefaultAgent";
const DEFAULT_VERSION_FILE: &str = "version.info";
const DEFAULT_MAX_REQUESTS: u32 = 100;
const DEFAULT_WINDOW_SECS: u64 = 60;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: String, value: String },
}

/// Service configuration, resolved from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Display name used in the greeting
    pub agent_name: String,
    /// Path of the version file, read on every request
    pub version_file: PathBuf,
    /// Requests allowed per client per window on rate-limited routes
    pub max_requests: u32,
    /// Rate limit window length in seconds
    pub window_secs: u64,
    /// Interval between expired-bucket cleanup passes
    pub cleanup_interval_secs: u64,
    /// Default log level when RUST_LOG is not set
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parsed_env("PORT", DEFAULT_PORT)?,
            agent_name: resolve_agent_name(env_var("AGENT_NAME")),
            version_file: env_var("VERSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VERSION_FILE)),
            max_requests: parsed_env("RATE_LIMIT_MAX_REQUESTS", DEFAULT_MAX_REQUESTS)?,
            window_secs: parsed_env("RATE_LIMIT_WINDOW_SECS", DEFAULT_WINDOW_SECS)?,
            cleanup_interval_secs: parsed_env("CLEANUP_INTERVAL", DEFAULT_CLEANUP_INTERVAL_SECS)?,
            log_level: env_var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            agent_name: DEFAULT_AGENT_NAME.to_string(),
            version_file: PathBuf::from(DEFAULT_VERSION_FILE),
            max_requests: DEFAULT_MAX_REQUESTS,
            window_secs: DEFAULT_WINDOW_SECS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Resolve the agent display name; an unset or empty variable falls back to
/// the default.
pub fn resolve_agent_name(raw: Option<String>) -> String {
    raw.filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string())
}

/// A set-but-empty variable counts as unset.
fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn parsed_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env_var(name) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
