//! Configuration module for Sumi-Scribe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! All keys are optional; `Config::default()` reproduces the command-line defaults.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scribe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scribe.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, UserAgentConfig,
    DEFAULT_IGNORED_EXTENSIONS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, hash_config_content, load_config, load_config_with_hash};
pub use validation::validate;
