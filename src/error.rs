// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Maps remote, codec, and snapshot failures to specific exit codes

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited on {endpoint}")]
    RateLimited {
        endpoint: String,
        retry_after: Option<u64>,
    },

    #[error("Transient API error {status} on {endpoint}: {message}")]
    Transient {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Corrupt snapshot {}: {reason}", path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Unsupported locator: {0}")]
    UnsupportedLocator(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Auth(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Filesystem(_) => 6,
            Error::NotFound(_) => 7,
            Error::RateLimited { .. } => 8,
            Error::Transient { .. } => 9,
            Error::Decode(_) => 10,
            Error::CorruptSnapshot { .. } => 11,
            Error::UnsupportedLocator(_) => 12,
            Error::Render(_) => 13,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
