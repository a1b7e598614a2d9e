//! Pagination state machine
//!
//! One [`Paginator`] drives one site: fetch a page, extract it, merge the
//! batch, then [`decide`] whether another page is worth fetching. Every
//! state change goes through [`Paginator::transition`], which rejects moves
//! the state table does not allow.

use crate::config::{FetchOptions, PaginationLimits};
use crate::crawler::fetcher::{FailureReason, FetchFailure, Fetcher, Page, PageResult};
use crate::extract::Extractor;
use crate::records::{Record, ResultSet};
use crate::sites::SCRAPED_AT_FIELD;
use crate::state::PaginatorState;
use crate::HarvestError;
use chrono::{SecondsFormat, Utc};
use std::fmt;
use url::Url;

/// Why a pagination loop ended in `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page limit was reached
    MaxPages,
    /// The last page added nothing new
    NoNewRecords,
    /// The last page had no next-page link
    NoNextPage,
    /// A later page could not be fetched
    FetchFailed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::MaxPages => "max-pages",
            StopReason::NoNewRecords => "no-new-records",
            StopReason::NoNextPage => "no-next-page",
            StopReason::FetchFailed => "fetch-failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the `Deciding` state chose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    FetchNext,
    Stop(StopReason),
}

/// Decides whether to fetch another page
///
/// Another page is fetched only while the page limit has not been reached,
/// the last batch added at least one record, and a next page exists.
///
/// # Arguments
///
/// * `pages_fetched` - Pages loaded so far by this loop
/// * `max_pages` - Page limit
/// * `added` - Records the last page added to the result set
/// * `has_next` - Whether the last page pointed to a next page
pub fn decide(pages_fetched: u32, max_pages: u32, added: usize, has_next: bool) -> Decision {
    if pages_fetched >= max_pages {
        Decision::Stop(StopReason::MaxPages)
    } else if added == 0 {
        Decision::Stop(StopReason::NoNewRecords)
    } else if !has_next {
        Decision::Stop(StopReason::NoNextPage)
    } else {
        Decision::FetchNext
    }
}

/// Summary of one site's pagination loop
#[derive(Debug, Clone, PartialEq)]
pub struct SiteOutcome {
    pub site: String,

    /// Pages that loaded successfully
    pub pages_fetched: u32,

    /// Records appended to the result set
    pub added: usize,

    /// Records discarded as already present
    pub duplicates: usize,

    /// Records discarded for a blank key
    pub keyless: usize,

    /// Listing blocks dropped for a missing required field
    pub dropped: usize,

    /// `Done` or `Failed`
    pub final_state: PaginatorState,

    /// Set when the loop ended in `Done`
    pub stop_reason: Option<StopReason>,

    /// The fetch failure that ended the loop, if any
    pub failure: Option<FetchFailure>,
}

impl SiteOutcome {
    fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            pages_fetched: 0,
            added: 0,
            duplicates: 0,
            keyless: 0,
            dropped: 0,
            final_state: PaginatorState::Idle,
            stop_reason: None,
            failure: None,
        }
    }

    /// Short human-readable reason the loop ended
    pub fn ending(&self) -> String {
        match (&self.stop_reason, &self.failure) {
            (Some(StopReason::FetchFailed), Some(f)) => format!("fetch-failed ({})", f.reason),
            (Some(reason), _) => reason.to_string(),
            (None, Some(f)) => format!("failed ({}: {})", f.reason, f.detail),
            (None, None) => self.final_state.to_string(),
        }
    }
}

/// Drives one site's fetch → extract → merge → decide loop
#[derive(Debug)]
pub struct Paginator {
    state: PaginatorState,
    limits: PaginationLimits,
}

impl Paginator {
    pub fn new(limits: PaginationLimits) -> Self {
        Self {
            state: PaginatorState::Idle,
            limits,
        }
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    /// Moves to `to`, rejecting transitions the state table forbids
    pub fn transition(&mut self, to: PaginatorState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        tracing::trace!("Paginator {} -> {}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Runs the loop to completion, merging every page into `results`
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Session owned by this loop
    /// * `extractor` - Compiled rules of the site
    /// * `options` - Fetch options passed to every request
    /// * `results` - Result set the batches are merged into
    ///
    /// # Returns
    ///
    /// * `Ok(SiteOutcome)` - The loop reached `Done` or `Failed`
    /// * `Err(HarvestError)` - The paginator was not idle
    pub async fn run<F>(
        &mut self,
        fetcher: &F,
        extractor: &Extractor,
        options: &FetchOptions,
        results: &mut ResultSet,
    ) -> Result<SiteOutcome, HarvestError>
    where
        F: Fetcher + ?Sized,
    {
        let site = extractor.site();
        let mut outcome = SiteOutcome::new(site);
        let mut url = extractor.start_url().clone();

        self.transition(PaginatorState::Fetching)?;
        tracing::info!("[{}] Starting at {}", site, url);

        loop {
            let page_number = outcome.pages_fetched + 1;

            let page = match self.fetch_page(fetcher, extractor, &url, options).await {
                Ok(page) => page,
                Err(failure) => {
                    tracing::warn!(
                        "[{}] Page {} failed ({}): {}",
                        site,
                        page_number,
                        failure.reason,
                        failure.detail
                    );
                    outcome.failure = Some(failure);

                    if outcome.pages_fetched == 0 {
                        self.transition(PaginatorState::Failed)?;
                    } else {
                        self.transition(PaginatorState::Deciding)?;
                        self.transition(PaginatorState::Done)?;
                        outcome.stop_reason = Some(StopReason::FetchFailed);
                    }
                    break;
                }
            };

            outcome.pages_fetched += 1;
            tracing::info!("[{}] Page {} fetched: {}", site, page_number, page.url);

            self.transition(PaginatorState::Extracting)?;
            let scan = extractor.scan(&page.body, &page.url, page_number);
            if !scan.layout_matched {
                tracing::warn!(
                    "[{}] No listing blocks matched on page {}; the layout may have changed",
                    site,
                    page_number
                );
            }

            let scraped_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            let extracted = scan.records.len();
            let batch = scan
                .records
                .into_iter()
                .map(|record: Record| record.with(SCRAPED_AT_FIELD, scraped_at.as_str()));
            let stats = results.merge(batch);

            outcome.added += stats.added;
            outcome.duplicates += stats.duplicates;
            outcome.keyless += stats.keyless;
            outcome.dropped += scan.dropped;

            tracing::info!(
                "[{}] Page {}: {} extracted, {} new, {} duplicate",
                site,
                page_number,
                extracted,
                stats.added,
                stats.duplicates
            );

            self.transition(PaginatorState::Deciding)?;
            match decide(
                outcome.pages_fetched,
                self.limits.max_pages,
                stats.added,
                scan.next_page.is_some(),
            ) {
                Decision::FetchNext => {
                    self.transition(PaginatorState::Fetching)?;
                    if let Some(next) = scan.next_page {
                        url = next;
                    }
                    pause(&self.limits).await;
                }
                Decision::Stop(reason) => {
                    self.transition(PaginatorState::Done)?;
                    outcome.stop_reason = Some(reason);
                    break;
                }
            }
        }

        outcome.final_state = self.state;
        tracing::info!(
            "[{}] Finished after {} page(s): {} ({} records added)",
            site,
            outcome.pages_fetched,
            outcome.ending(),
            outcome.added
        );
        Ok(outcome)
    }

    /// Fetches one page, retrying retryable failures up to `max_retries` times
    ///
    /// A loaded page carrying one of the site's block markers counts as a
    /// `blocked` failure.
    async fn fetch_page<F>(
        &self,
        fetcher: &F,
        extractor: &Extractor,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<Page, FetchFailure>
    where
        F: Fetcher + ?Sized,
    {
        let mut attempt = 0;
        loop {
            let failure = match fetcher.fetch(url, options).await {
                PageResult::Loaded(page) => match extractor.detect_challenge(&page.body) {
                    Some(marker) => FetchFailure::new(
                        url,
                        FailureReason::Blocked,
                        format!("challenge page detected (\"{}\")", marker),
                    ),
                    None => return Ok(page),
                },
                PageResult::Failed(failure) => failure,
            };

            if !failure.reason.is_retryable() || attempt >= self.limits.max_retries {
                return Err(failure);
            }

            attempt += 1;
            tracing::debug!(
                "[{}] Retrying {} after {} (attempt {} of {})",
                extractor.site(),
                url,
                failure.reason,
                attempt,
                self.limits.max_retries
            );
            pause(&self.limits).await;
        }
    }
}

async fn pause(limits: &PaginationLimits) {
    if !limits.page_delay.is_zero() {
        tokio::time::sleep(limits.page_delay).await;
    }
}
