use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Super binary not found at {}", path.display())]
    BinaryNotFound { path: PathBuf },

    #[error("Super binary not executable at {}", path.display())]
    BinaryNotExecutable { path: PathBuf },

    #[error("Super query failed: {stderr}")]
    ExecutionFailed { stderr: String },

    #[error("Query timeout after {} seconds", timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("Invalid S3 path: {0}")]
    InvalidLocator(String),

    #[error("Access denied: {0}")]
    UpstreamAccessDenied(String),

    #[error("Not found: {0}")]
    UpstreamNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
