use crate::config::env::Settings;
use crate::extract::SearchParams;
use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// User agent sent by the HTTP fetcher
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Upper bound for retries per page
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Format of the run timestamp used in output file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Options handed to the fetcher for every page
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Run without a visible window
    pub headless: bool,

    /// Per-request timeout, body read included
    pub timeout: Duration,

    /// Skip image sub-resources
    pub block_images: bool,

    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            timeout: Duration::from_secs(60),
            block_images: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Bounds on one site's pagination loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaginationLimits {
    /// Maximum pages fetched per site (at least 1)
    pub max_pages: u32,

    /// Fixed pause between consecutive fetches
    pub page_delay: Duration,

    /// Extra attempts after a failed fetch
    pub max_retries: u32,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            max_pages: 3,
            page_delay: Duration::from_secs(2),
            max_retries: 0,
        }
    }
}

/// Which files the writer produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
    #[default]
    Both,
}

impl OutputFormat {
    pub fn includes_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Both => "both",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "both" => Ok(OutputFormat::Both),
            _ => Err(ConfigError::InvalidSetting {
                key: "OUTPUT_FORMAT".to_string(),
                value: s.to_string(),
                reason: "expected csv, json or both".to_string(),
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how results are written
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            format: OutputFormat::Both,
        }
    }
}

/// Values given explicitly on the command line
///
/// Every field is optional; a `None` falls back to the environment and then
/// to the built-in default.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub headless: Option<bool>,
    pub max_pages: Option<u32>,
    pub timeout_secs: Option<f64>,
    pub delay_secs: Option<f64>,
    pub retries: Option<u32>,
    pub format: Option<OutputFormat>,
    pub output_dir: Option<PathBuf>,
}

/// Immutable configuration for one run
///
/// Built once at start-up and shared read-only by every pagination loop.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Search parameters given on the command line (targets add defaults)
    pub params: SearchParams,

    pub limits: PaginationLimits,

    pub fetch: FetchOptions,

    pub output: OutputConfig,

    /// Run start; every output file of the run shares its timestamp
    pub started_at: DateTime<Utc>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            params: SearchParams::new(),
            limits: PaginationLimits::default(),
            fetch: FetchOptions::default(),
            output: OutputConfig::default(),
            started_at: Utc::now(),
        }
    }
}

impl RunConfig {
    /// Resolves the run configuration: CLI flag, then environment, then default
    ///
    /// # Arguments
    ///
    /// * `settings` - Values loaded from the environment
    /// * `overrides` - Values given explicitly on the command line
    /// * `params` - Search parameters for this run
    ///
    /// # Returns
    ///
    /// * `Ok(RunConfig)` - The resolved configuration
    /// * `Err(ConfigError)` - A command-line value is out of range
    pub fn resolve(
        settings: &Settings,
        overrides: &Overrides,
        params: SearchParams,
    ) -> ConfigResult<Self> {
        let max_pages = match overrides.max_pages {
            Some(0) => return Err(invalid("--pages", "0", "must be at least 1")),
            Some(n) => n,
            None => settings.max_pages,
        };

        let timeout = match overrides.timeout_secs {
            Some(secs) => seconds("--timeout", &secs.to_string(), false)?,
            None => settings.request_timeout,
        };

        let page_delay = match overrides.delay_secs {
            Some(secs) => seconds("--delay", &secs.to_string(), true)?,
            None => settings.request_delay,
        };

        let max_retries = match overrides.retries {
            Some(n) if n > MAX_RETRIES_LIMIT => {
                return Err(invalid(
                    "--retries",
                    &n.to_string(),
                    &format!("must be at most {}", MAX_RETRIES_LIMIT),
                ))
            }
            Some(n) => n,
            None => settings.max_retries,
        };

        Ok(Self {
            params,
            limits: PaginationLimits {
                max_pages,
                page_delay,
                max_retries,
            },
            fetch: FetchOptions {
                headless: overrides.headless.unwrap_or(settings.headless),
                timeout,
                block_images: settings.block_images,
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            output: OutputConfig {
                dir: overrides
                    .output_dir
                    .clone()
                    .unwrap_or_else(|| settings.data_dir.clone()),
                format: overrides.format.unwrap_or(settings.output_format),
            },
            started_at: Utc::now(),
        })
    }

    /// Run timestamp as used in output file names
    pub fn timestamp(&self) -> String {
        self.started_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Parses a number of seconds into a Duration
///
/// Rejects values that are not numbers, negative (or zero unless
/// `allow_zero`), NaN, infinite, or too large for a Duration.
pub(crate) fn seconds(key: &str, raw: &str, allow_zero: bool) -> ConfigResult<Duration> {
    let reason = if allow_zero {
        "must be a number of seconds >= 0"
    } else {
        "must be a number of seconds > 0"
    };
    let secs: f64 = raw.trim().parse().map_err(|_| invalid(key, raw, reason))?;
    if secs == 0.0 && !allow_zero {
        return Err(invalid(key, raw, reason));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| invalid(key, raw, reason))
}

pub(crate) fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
