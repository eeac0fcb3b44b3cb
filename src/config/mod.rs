//! Configuration module for plover
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use plover::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Quota: {} requests per {}s", config.quota.max_requests, config.quota.window_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, NetworkConfig, OutputConfig, QuotaConfig, SearchConfig, SessionConfig,
    StreamConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
