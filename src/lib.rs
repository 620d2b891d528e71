//! Club-Harvest: a two-stage sports-club directory extractor
//!
//! This crate drives a club search page through a headless browser to build a
//! seed list of clubs, then visits every club's detail page (static HTML plus a
//! few interactive tabs) and writes the enriched records to delimited tables,
//! checkpointing progress along the way.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod logging;
pub mod output;
pub mod record;

use thiserror::Error;

/// Main error type for Club-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Driver(#[from] browser::DriverError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: String },

    #[error("Extraction error: {0}")]
    Extract(#[from] crawler::ExtractError),

    #[error("Processing panicked for {url}")]
    Panicked { url: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Club-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use record::{Entity, EntityDetail, PostalCode, SENTINEL};
