//! Shared utilities for coursegen
//!
//! This crate provides common functionality used across the coursegen workspace:
//! tracing setup and the application configuration loaded from the environment.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{init_tracing, init_tracing_with};
