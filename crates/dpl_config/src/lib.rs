//! Parsing and validation of `dpl.toml` legalizer configuration files.
//!
//! This crate reads the configuration file and produces a strongly-typed
//! [`LegalizerConfig`] covering the technology grid, cell padding, supply net
//! names, search window, and refinement settings.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, validate_config};
pub use types::*;
