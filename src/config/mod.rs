//! Configuration module for Listing-Harvest
//!
//! Run settings come from three layers: explicit command-line flags, the
//! environment (optionally seeded from a `.env` file), and built-in
//! defaults. Custom targets are loaded from TOML files.
//!
//! # Example
//!
//! ```no_run
//! use listing_harvest::config::{Overrides, RunConfig, Settings};
//! use listing_harvest::extract::SearchParams;
//!
//! let settings = Settings::from_env().unwrap();
//! let run = RunConfig::resolve(&settings, &Overrides::default(), SearchParams::new()).unwrap();
//! println!("Up to {} pages per site", run.limits.max_pages);
//! ```

mod env;
mod parser;
mod types;
mod validation;

// Re-export types
pub use env::Settings;
pub use types::{
    FetchOptions, OutputConfig, OutputFormat, Overrides, PaginationLimits, RunConfig,
    DEFAULT_USER_AGENT, MAX_RETRIES_LIMIT, TIMESTAMP_FORMAT,
};

// Re-export parser and validation functions
pub use parser::{load_target, parse_target};
pub use validation::{validate_site, validate_target};
