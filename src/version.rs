use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Returned when the version file does not exist.
pub const FALLBACK_VERSION: &str = "dev";
/// Returned when the version file exists but cannot be read.
pub const UNREADABLE_VERSION: &str = "unknown";

/// Resolves the deployed version from a colocated `version.info` file.
///
/// The file is read on every call so a deploy that swaps the file takes
/// effect without a restart.
#[derive(Debug, Clone)]
pub struct VersionResolver {
    path: PathBuf,
}

impl VersionResolver {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Every failure path maps to a defined string, never an error.
    pub fn resolve(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => contents.trim().to_string(),
            Err(err) if err.kind() == ErrorKind::NotFound => FALLBACK_VERSION.to_string(),
            Err(_) => UNREADABLE_VERSION.to_string(),
        }
    }
}
