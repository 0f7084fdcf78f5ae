// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LastframeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    PatternError(#[from] globset::Error),

    #[error("File watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Upload failed after {attempts} attempts: {last_error}")]
    UploadExhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LastframeError>;
