//! # Slate Common
//!
//! Common utilities, error types, and logging configuration for the Slate UI engine.
//!
//! ## Features
//!
//! - Unified error types with per-domain variants
//! - Logging configuration and setup
//! - Result extension traits

use thiserror::Error;

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for Slate.
#[derive(Error, Debug)]
pub enum SlateError {
    /// Element-tree errors.
    #[error("Dom error: {message}")]
    Dom {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Style/selector errors.
    #[error("Style error: {message}")]
    Style {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Layout/measurement errors.
    #[error("Layout error: {message}")]
    Layout {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Delegated-event registry errors.
    #[error("Registry error: {message}")]
    Registry {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Overlay/popup errors.
    #[error("Overlay error: {message}")]
    Overlay {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Animation errors.
    #[error("Animation error: {message}")]
    Animation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error (unexpected).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SlateError {
    /// Create a DOM error.
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a DOM error with source.
    pub fn dom_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Dom {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a style error.
    pub fn style(message: impl Into<String>) -> Self {
        Self::Style {
            message: message.into(),
            source: None,
        }
    }

    /// Create a layout error.
    pub fn layout(message: impl Into<String>) -> Self {
        Self::Layout {
            message: message.into(),
            source: None,
        }
    }

    /// Create a registry error.
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
            source: None,
        }
    }

    /// Create an overlay error.
    pub fn overlay(message: impl Into<String>) -> Self {
        Self::Overlay {
            message: message.into(),
            source: None,
        }
    }

    /// Create an animation error.
    pub fn animation(message: impl Into<String>) -> Self {
        Self::Animation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Get the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            SlateError::Dom { .. } => "dom",
            SlateError::Style { .. } => "style",
            SlateError::Layout { .. } => "layout",
            SlateError::Registry { .. } => "registry",
            SlateError::Overlay { .. } => "overlay",
            SlateError::Animation { .. } => "animation",
            SlateError::Config { .. } => "config",
            SlateError::Io(_) => "io",
            SlateError::NotFound(_) => "not_found",
            SlateError::InvalidArgument(_) => "invalid_argument",
            SlateError::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Slate operations.
pub type Result<T> = std::result::Result<T, SlateError>;

/// Extension trait for Result.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Convert to a different error type.
    fn map_err_to<E: Into<SlateError>>(self, f: impl FnOnce() -> E) -> Result<T>;
}

impl<T, E: std::error::Error + Send + Sync + 'static> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| SlateError::Internal(format!("{}: {}", message.into(), e)))
    }

    fn map_err_to<E2: Into<SlateError>>(self, f: impl FnOnce() -> E2) -> Result<T> {
        self.map_err(|_| f().into())
    }
}

/// Extension trait for Option.
pub trait OptionExt<T> {
    /// Convert None to a NotFound error.
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, resource: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| SlateError::NotFound(resource.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(SlateError::dom("test").category(), "dom");
        assert_eq!(SlateError::overlay("test").category(), "overlay");
        assert_eq!(SlateError::NotFound("x".into()).category(), "not_found");
    }

    #[test]
    fn test_option_ext() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.ok_or_not_found("test").unwrap(), 42);

        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_not_found("test"),
            Err(SlateError::NotFound(_))
        ));
    }

    #[test]
    fn test_context() {
        let err: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        ));
        let wrapped = err.context("saving panel layout");
        assert!(matches!(wrapped, Err(SlateError::Internal(_))));
    }
}
