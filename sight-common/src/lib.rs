//! Sight Common - Shared configuration, logging and error types for StockSight services.
//!
//! This crate provides:
//! - Configuration types and loading
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    Config, ConfigSource, IpoCacheConfig, IpoConfig, IpoFilterConfig, IpoSourcesConfig,
    ObservabilityConfig, ServerConfig,
};
pub use error::{Error, Result};
