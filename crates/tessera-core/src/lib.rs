//! Tessera Core Library
//!
//! This crate provides shared types, errors, and configuration for the
//! Tessera level editor.

pub mod config;
pub mod error;
pub mod types;

pub use config::EditorConfig;
pub use error::{TesseraError, TesseraResult};
