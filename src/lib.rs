//! Listing-Harvest: paginated listing scrapers
//!
//! This crate implements a family of site scrapers (e-commerce prices, job
//! listings, news headlines, real-estate listings) that all share one
//! procedure: fetch a page, extract records with a declarative rule table,
//! merge them into a de-duplicated result set, decide whether another page
//! should be fetched, and finally write CSV and/or JSON output.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod logging;
pub mod output;
pub mod records;
pub mod sites;
pub mod state;

use thiserror::Error;

/// Main error type for Listing-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PaginatorState,
        to: state::PaginatorState,
    },

    #[error("No page could be fetched for target '{target}'")]
    NothingFetched { target: String },

    #[error("Collected {collected} records for '{target}' but could not write them: {source}")]
    Write {
        target: String,
        collected: usize,
        source: output::WriteError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),
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

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Unknown placeholder '{{{name}}}' in template '{template}'")]
    UnknownPlaceholder { name: String, template: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{RunConfig, Settings};
pub use crawler::{Fetcher, HttpFetcher, PageResult};
pub use extract::{Extractor, SiteRules};
pub use records::{Record, ResultSet};
pub use sites::Target;
pub use state::PaginatorState;
