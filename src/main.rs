//! Listing-Harvest main entry point
//!
//! This is the command-line interface for the listing scrapers.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use listing_harvest::config::{load_target, OutputFormat, Overrides, RunConfig, Settings};
use listing_harvest::crawler::harvest;
use listing_harvest::extract::SearchParams;
use listing_harvest::logging::setup_logging;
use listing_harvest::output::print_summary;
use listing_harvest::sites::{builtin, builtin_targets, Target};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Listing-Harvest: paginated listing scrapers
///
/// Scrapes e-commerce prices, job listings, news headlines and real-estate
/// listings page by page, de-duplicates them, and writes CSV and/or JSON.
#[derive(Parser, Debug)]
#[command(name = "listing-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Paginated listing scrapers with de-duplication", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    /// Directory for CSV/JSON output [env: DATA_DIR]
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Output format: csv, json or both [env: OUTPUT_FORMAT]
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Run headless [env: HEADLESS]
    #[arg(long, overrides_with = "no_headless", global = true)]
    headless: bool,

    /// Run with a visible browser window
    #[arg(long, overrides_with = "headless", global = true)]
    no_headless: bool,

    /// Per-request timeout in seconds [env: REQUEST_TIMEOUT]
    #[arg(long, value_name = "SECS", global = true)]
    timeout: Option<f64>,

    /// Delay between page fetches in seconds [env: REQUEST_DELAY]
    #[arg(long, value_name = "SECS", global = true)]
    delay: Option<f64>,

    /// Extra attempts per failed page [env: MAX_RETRIES]
    #[arg(long, value_name = "N", global = true)]
    retries: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Product prices from Amazon India and Flipkart
    Ecommerce {
        /// Search query [default: "gaming laptops"]
        #[arg(long)]
        query: Option<String>,

        /// Maximum pages per site [env: MAX_PAGES]
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Job listings from Naukri
    Jobs {
        /// Job role [default: "python developer"]
        #[arg(long)]
        role: Option<String>,

        /// Job location [default: "remote"]
        #[arg(long)]
        location: Option<String>,

        /// Maximum pages [env: MAX_PAGES]
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Headlines from Times of India, The Hindu and NDTV
    News,

    /// Property listings from 99acres
    Realestate {
        /// City to search [default: "pune"]
        #[arg(long)]
        city: Option<String>,

        /// Maximum pages [env: MAX_PAGES]
        #[arg(long)]
        pages: Option<u32>,
    },

    /// Every built-in target with default parameters
    All {
        /// Maximum pages per site [env: MAX_PAGES]
        #[arg(long)]
        pages: Option<u32>,
    },

    /// A target described by a TOML file
    Custom {
        /// Path to the TOML target file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Search parameter, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Maximum pages per site [env: MAX_PAGES]
        #[arg(long)]
        pages: Option<u32>,
    },

    /// List targets and their sites, then exit
    Sites {
        /// Also validate and list a custom target file
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
}

impl Command {
    /// Name used as the log file prefix
    fn name(&self) -> &'static str {
        match self {
            Command::Ecommerce { .. } => "ecommerce",
            Command::Jobs { .. } => "jobs",
            Command::News => "news",
            Command::Realestate { .. } => "realestate",
            Command::All { .. } => "all",
            Command::Custom { .. } => "custom",
            Command::Sites { .. } => "sites",
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command; `Ok(false)` means some target failed
async fn run(cli: Cli) -> anyhow::Result<bool> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();
    let settings = Settings::from_env().context("Invalid environment settings")?;

    if let Command::Sites { file } = &cli.command {
        setup_logging(cli.verbose, cli.quiet, settings.debug, None)?;
        handle_sites(file.as_deref())?;
        return Ok(true);
    }

    let _guard = setup_logging(
        cli.verbose,
        cli.quiet,
        settings.debug,
        Some((settings.logs_dir.as_path(), cli.command.name())),
    )?;

    let (targets, params, pages) = select_targets(&cli.command)?;

    let overrides = Overrides {
        headless: headless_flag(cli.headless, cli.no_headless),
        max_pages: pages,
        timeout_secs: cli.timeout,
        delay_secs: cli.delay,
        retries: cli.retries,
        format: cli.format,
        output_dir: cli.output_dir.clone(),
    };
    let run = RunConfig::resolve(&settings, &overrides, params).context("Invalid command-line options")?;

    tracing::info!(
        "Output: {} ({}), run timestamp {}",
        run.output.dir.display(),
        run.output.format,
        run.timestamp()
    );

    let reports = harvest(&targets, &run).await.context("Run aborted")?;
    print_summary(&reports);

    let mut success = true;
    for report in reports {
        if let Err(e) = report.into_result() {
            tracing::error!("{}", e);
            success = false;
        }
    }

    tracing::info!("Run complete");
    Ok(success)
}

/// Resolves a command into the targets to run, their parameters and page limit
fn select_targets(command: &Command) -> anyhow::Result<(Vec<Target>, SearchParams, Option<u32>)> {
    let mut params = SearchParams::new();

    let (targets, pages) = match command {
        Command::Ecommerce { query, pages } => {
            set_opt(&mut params, "query", query);
            (vec![builtin_target("ecommerce")?], *pages)
        }
        Command::Jobs {
            role,
            location,
            pages,
        } => {
            set_opt(&mut params, "role", role);
            set_opt(&mut params, "location", location);
            (vec![builtin_target("jobs")?], *pages)
        }
        Command::News => (vec![builtin_target("news")?], None),
        Command::Realestate { city, pages } => {
            set_opt(&mut params, "city", city);
            (vec![builtin_target("realestate")?], *pages)
        }
        Command::All { pages } => (builtin_targets(), *pages),
        Command::Custom {
            file,
            params: given,
            pages,
        } => {
            let target = load_target(file)
                .with_context(|| format!("Failed to load target file {}", file.display()))?;
            for (key, value) in given {
                params.set(key.as_str(), value.as_str());
            }
            (vec![target], *pages)
        }
        Command::Sites { .. } => bail!("'sites' does not run targets"),
    };

    Ok((targets, params, pages))
}

fn builtin_target(name: &str) -> anyhow::Result<Target> {
    builtin(name).with_context(|| format!("Unknown built-in target '{}'", name))
}

fn set_opt(params: &mut SearchParams, name: &str, value: &Option<String>) {
    if let Some(value) = value {
        params.set(name, value.as_str());
    }
}

/// `--headless` / `--no-headless`, whichever came last; None when neither
fn headless_flag(headless: bool, no_headless: bool) -> Option<bool> {
    match (headless, no_headless) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Handles the `sites` command: lists targets and exits
fn handle_sites(file: Option<&Path>) -> anyhow::Result<()> {
    println!("=== Built-in Targets ===\n");
    for target in builtin_targets() {
        print_target(&target);
    }

    if let Some(file) = file {
        let target = load_target(file)
            .with_context(|| format!("Failed to load target file {}", file.display()))?;
        println!("=== {} ===\n", file.display());
        print_target(&target);
        println!("✓ Target file is valid");
    }

    Ok(())
}

fn print_target(target: &Target) {
    let mode = if target.concurrent {
        "concurrent"
    } else {
        "sequential"
    };
    println!("{} ({}, key: {})", target.name, mode, target.key_field());
    for (name, value) in &target.params {
        println!("  param {} = \"{}\"", name, value);
    }
    for site in &target.sites {
        println!("  - {}: {}", site.name, site.search_url);
    }
    println!("  columns: {}", target.columns().join(", "));
    println!();
}
