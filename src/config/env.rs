//! Settings read from the process environment
//!
//! `main` loads an optional `.env` file with `dotenvy` before calling
//! [`Settings::from_env`]. Parsing goes through a lookup closure so tests
//! never touch the real environment.

use crate::config::types::{invalid, seconds, OutputFormat, MAX_RETRIES_LIMIT};
use crate::ConfigResult;
use std::path::PathBuf;
use std::time::Duration;

/// Environment-level defaults for a run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub headless: bool,
    pub max_pages: u32,
    pub request_timeout: Duration,
    pub block_images: bool,
    pub request_delay: Duration,
    pub max_retries: u32,
    pub output_format: OutputFormat,
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            headless: true,
            max_pages: 3,
            request_timeout: Duration::from_secs(60),
            block_images: true,
            request_delay: Duration::from_secs(2),
            max_retries: 0,
            output_format: OutputFormat::Both,
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
            debug: false,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through an arbitrary key lookup
    ///
    /// Unset or blank keys keep their default.
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - Every set key parsed
    /// * `Err(ConfigError::InvalidSetting)` - A key holds a value of the wrong
    ///   type or out of range
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(v) = get("HEADLESS") {
            settings.headless = parse_bool("HEADLESS", &v)?;
        }
        if let Some(v) = get("MAX_PAGES") {
            settings.max_pages = match v.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(invalid("MAX_PAGES", &v, "must be an integer >= 1")),
            };
        }
        if let Some(v) = get("REQUEST_TIMEOUT") {
            settings.request_timeout = seconds("REQUEST_TIMEOUT", &v, false)?;
        }
        if let Some(v) = get("BLOCK_IMAGES") {
            settings.block_images = parse_bool("BLOCK_IMAGES", &v)?;
        }
        if let Some(v) = get("REQUEST_DELAY") {
            settings.request_delay = seconds("REQUEST_DELAY", &v, true)?;
        }
        if let Some(v) = get("MAX_RETRIES") {
            settings.max_retries = match v.parse::<u32>() {
                Ok(n) if n <= MAX_RETRIES_LIMIT => n,
                _ => {
                    return Err(invalid(
                        "MAX_RETRIES",
                        &v,
                        &format!("must be an integer between 0 and {}", MAX_RETRIES_LIMIT),
                    ))
                }
            };
        }
        if let Some(v) = get("OUTPUT_FORMAT") {
            settings.output_format = v.parse()?;
        }
        if let Some(v) = get("DATA_DIR") {
            settings.data_dir = PathBuf::from(v);
        }
        if let Some(v) = get("LOGS_DIR") {
            settings.logs_dir = PathBuf::from(v);
        }
        if let Some(v) = get("DEBUG") {
            settings.debug = parse_bool("DEBUG", &v)?;
        }

        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value, "expected true/false, 1/0, yes/no or on/off")),
    }
}
