//! Target coordinator - runs every site of a target and writes the result
//!
//! This module ties the pieces together for one target:
//! - Compiling each site's rules against the run's search parameters
//! - Opening one fetch session per site loop
//! - Running site loops one after another, or all at once for concurrent
//!   targets (each into its own result set, absorbed in declaration order)
//! - Writing the collected records once at the end

use crate::config::{FetchOptions, RunConfig};
use crate::crawler::fetcher::{Fetcher, HttpFetcher};
use crate::crawler::paginator::{Paginator, SiteOutcome};
use crate::extract::Extractor;
use crate::output::{file_stem, write_results, WriteError};
use crate::records::ResultSet;
use crate::sites::Target;
use crate::HarvestError;
use futures::future::join_all;
use std::path::PathBuf;

/// How a target's run ended
#[derive(Debug)]
pub enum RunStatus {
    /// Records were collected and written
    Written { files: Vec<PathBuf> },
    /// Pages were fetched but no record was collected; nothing was written
    NoRecords,
    /// No site managed to fetch a single page
    NothingFetched,
    /// Records were collected but could not be persisted
    WriteFailed(WriteError),
}

/// Everything that happened while running one target
#[derive(Debug)]
pub struct TargetReport {
    pub target: String,

    /// Expanded output slug
    pub slug: String,

    /// One outcome per site, in declaration order
    pub sites: Vec<SiteOutcome>,

    /// Records in the final result set
    pub collected: usize,

    pub status: RunStatus,
}

impl TargetReport {
    /// True unless nothing was fetched or the write failed
    pub fn is_success(&self) -> bool {
        matches!(self.status, RunStatus::Written { .. } | RunStatus::NoRecords)
    }

    /// Files written for this target
    pub fn files(&self) -> &[PathBuf] {
        match &self.status {
            RunStatus::Written { files } => files,
            _ => &[],
        }
    }

    /// Converts a failed run into the matching error
    pub fn into_result(self) -> Result<Self, HarvestError> {
        match self.status {
            RunStatus::NothingFetched => Err(HarvestError::NothingFetched {
                target: self.target,
            }),
            RunStatus::WriteFailed(source) => Err(HarvestError::Write {
                target: self.target,
                collected: self.collected,
                source,
            }),
            _ => Ok(self),
        }
    }
}

/// Runs a target with a fresh HTTP session per site loop
///
/// # Arguments
///
/// * `target` - The target to run
/// * `run` - The run configuration
///
/// # Returns
///
/// * `Ok(TargetReport)` - The target ran (check `status` for the outcome)
/// * `Err(HarvestError)` - Rules failed to compile or a session could not
///   be opened
pub async fn run_target(target: &Target, run: &RunConfig) -> Result<TargetReport, HarvestError> {
    run_target_with(target, run, |options: &FetchOptions, site: &str| {
        HttpFetcher::open(options, site).map_err(HarvestError::from)
    })
    .await
}

/// Runs a target, opening each site's session with `open`
pub async fn run_target_with<F, O>(
    target: &Target,
    run: &RunConfig,
    open: O,
) -> Result<TargetReport, HarvestError>
where
    F: Fetcher,
    O: Fn(&FetchOptions, &str) -> Result<F, HarvestError>,
{
    let params = target.effective_params(&run.params);
    let slug = target.slug_for(&params)?;
    let extractors = target
        .sites
        .iter()
        .map(|site| Extractor::compile(site, &params))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::info!(
        "Running target '{}' ({} site(s), up to {} page(s) each)",
        target.name,
        extractors.len(),
        run.limits.max_pages
    );

    let mut results = ResultSet::new(target.key_field(), target.columns());
    let mut outcomes = Vec::with_capacity(extractors.len());

    if target.concurrent && extractors.len() > 1 {
        let open = &open;
        let loops = extractors.iter().map(|extractor| async move {
            let fetcher = open(&run.fetch, extractor.site())?;
            let mut own = ResultSet::new(target.key_field(), target.columns());
            let mut paginator = Paginator::new(run.limits);
            let outcome = paginator
                .run(&fetcher, extractor, &run.fetch, &mut own)
                .await?;
            Ok::<_, HarvestError>((outcome, own))
        });

        for joined in join_all(loops).await {
            let (outcome, own) = joined?;
            let stats = results.absorb(own);
            if stats.duplicates > 0 {
                tracing::debug!(
                    "[{}] {} record(s) already collected from another site",
                    outcome.site,
                    stats.duplicates
                );
            }
            outcomes.push(outcome);
        }
    } else {
        for extractor in &extractors {
            let fetcher = open(&run.fetch, extractor.site())?;
            let mut paginator = Paginator::new(run.limits);
            let outcome = paginator
                .run(&fetcher, extractor, &run.fetch, &mut results)
                .await?;
            drop(fetcher);
            outcomes.push(outcome);
        }
    }

    let collected = results.len();
    let fetched_any = outcomes.iter().any(|o| o.pages_fetched > 0);

    let status = if !fetched_any {
        tracing::error!("Target '{}': no page could be fetched", target.name);
        RunStatus::NothingFetched
    } else if results.is_empty() {
        tracing::warn!("Target '{}': no records collected", target.name);
        RunStatus::NoRecords
    } else {
        let stem = file_stem(&slug, &run.timestamp());
        match write_results(&results, run.output.format, &run.output.dir, &stem) {
            Ok(files) => RunStatus::Written { files },
            Err(e) => {
                tracing::error!("Target '{}': {}", target.name, e);
                RunStatus::WriteFailed(e)
            }
        }
    };

    Ok(TargetReport {
        target: target.name.clone(),
        slug,
        sites: outcomes,
        collected,
        status,
    })
}
