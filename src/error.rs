//! Error types for openclaw-gate

use std::path::{Path, PathBuf};

/// Main error type for the policy core and its adapters
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load allow-list from '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn load(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        Error::Load {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    pub fn pattern(msg: impl Into<String>) -> Self {
        Error::Pattern(msg.into())
    }

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Error::InvalidUrl(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
