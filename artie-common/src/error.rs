//! Common error types for artie

use thiserror::Error;

use crate::makemkv::{DecodeError, InfoError};

/// Common result type for artie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across artie crates
#[derive(Error, Debug)]
pub enum Error {
    /// Robot-mode line could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Decoded message was rejected by the disc information tree
    #[error("Disc info error: {0}")]
    Info(#[from] InfoError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for the expected schema
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
