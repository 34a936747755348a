//! Configuration module for Snippet-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Command-line flags are layered on top by the binary before
//! validation runs.
//!
//! # Example
//!
//! ```no_run
//! use snippet_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Wrapping documentation at {} columns", config.extract.wrap_width);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, ExtractConfig, GithubConfig, OutputConfig, SearchConfig,
};

// Re-export parser and validation functions
pub use parser::{credential_fingerprint, load_config, parse_config};
pub use validation::{validate, validate_credentials};
