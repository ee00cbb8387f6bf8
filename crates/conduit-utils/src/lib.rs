//! # Conduit Utilities
//!
//! Shared utilities, logging, config, and helpers for Conduit.
//!
//! This crate provides common functionality used across the Conduit workspace:
//! logging built on `tracing` and the environment-driven [`Settings`].

pub mod config;
pub mod logging;

pub use config::{ConfigError, Settings};
// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
