//! Crawler module for paginated listing extraction
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with failure classification
//! - The per-site pagination state machine
//! - Target coordination (sequential or concurrent sites, final write)

mod coordinator;
mod fetcher;
mod paginator;

pub use coordinator::{run_target, run_target_with, RunStatus, TargetReport};
pub use fetcher::{
    build_http_client, FailureReason, FetchFailure, Fetcher, HttpFetcher, Page, PageResult,
};
pub use paginator::{decide, Decision, Paginator, SiteOutcome, StopReason};

use crate::config::RunConfig;
use crate::sites::Target;
use crate::HarvestError;

/// Runs several targets one after another
///
/// Setup errors (bad rules, client construction) abort the whole run;
/// fetch and write outcomes are reported per target.
///
/// # Arguments
///
/// * `targets` - Targets to run, in order
/// * `run` - The run configuration shared by every target
///
/// # Returns
///
/// * `Ok(Vec<TargetReport>)` - One report per target
/// * `Err(HarvestError)` - A target could not be set up
pub async fn harvest(targets: &[Target], run: &RunConfig) -> Result<Vec<TargetReport>, HarvestError> {
    let mut reports = Vec::with_capacity(targets.len());
    for target in targets {
        reports.push(run_target(target, run).await?);
    }
    Ok(reports)
}
