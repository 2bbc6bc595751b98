//! Error types for Tessera

use thiserror::Error;

/// Result type alias for Tessera operations
pub type TesseraResult<T> = Result<T, TesseraError>;

/// Main error type for Tessera
#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Panel error: {0}")]
    Panel(String),

    #[error("Overlay error: {0}")]
    Overlay(String),

    #[error("Asset error: {0}")]
    Asset(String),

    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesseraError {
    /// Create a new template error
    pub fn template(msg: impl Into<String>) -> Self {
        Self::Template(msg.into())
    }

    /// Create a new panel error
    pub fn panel(msg: impl Into<String>) -> Self {
        Self::Panel(msg.into())
    }

    /// Create a new overlay error
    pub fn overlay(msg: impl Into<String>) -> Self {
        Self::Overlay(msg.into())
    }

    /// Create a new asset error
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Create a new layer error
    pub fn layer(msg: impl Into<String>) -> Self {
        Self::Layer(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
