use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::ResourceName;

/// Lease authority failures (acquire or release).
///
/// "No dirty resource left" is not an error: acquire returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("lease authority request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("lease authority returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode lease authority response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown resource {0}")]
    UnknownResource(ResourceName),

    #[error("resource {name} is owned by {actual:?}, not {expected}")]
    OwnerMismatch {
        name: ResourceName,
        expected: String,
        actual: Option<String>,
    },

    #[error("lease authority {op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },
}

/// Cleanup operation failures. Any of these sends the resource back to dirty.
#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cleanup exited with {code:?}: {stderr}")]
    ExitStatus { code: Option<i32>, stderr: String },

    #[error("cleanup timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// Startup configuration errors. The only fatal errors in the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum JanitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lease(#[from] LeaseError),
}
