//! Configuration module for Club-Harvest
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file. The resulting [`Config`] is built once at startup and handed to every
//! component; nothing downstream reads the environment.
//!
//! # Example
//!
//! ```no_run
//! use club_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Partial snapshot every {} clubs", config.output.partial_save_every);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserSettings, Config, DelayRange, HttpConfig, ListingConfig, Locator, OutputConfig,
    SelectorConfig, SiteConfig, StaticPageConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
