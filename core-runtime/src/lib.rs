//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the resolve bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate holds what every other crate in the workspace shares but that
//! is not part of the bridge itself: how logs are emitted and how the
//! bridge's settings are assembled and validated before anything starts.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
