//! Run summary
//!
//! Printed to stdout at the end of every run: per site the pages fetched,
//! why the loop stopped and how many records it added; per target the
//! records collected and the files written.

use crate::crawler::{RunStatus, TargetReport};

/// Totals across every target of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub targets: usize,
    pub sites: usize,
    pub pages_fetched: u64,
    pub records_collected: usize,
    pub files_written: usize,
    pub failed_targets: usize,
}

/// Sums up a run's reports
pub fn run_statistics(reports: &[TargetReport]) -> RunStatistics {
    reports.iter().fold(RunStatistics::default(), |mut stats, report| {
        stats.targets += 1;
        stats.sites += report.sites.len();
        stats.pages_fetched += report
            .sites
            .iter()
            .map(|s| u64::from(s.pages_fetched))
            .sum::<u64>();
        stats.records_collected += report.collected;
        stats.files_written += report.files().len();
        if !report.is_success() {
            stats.failed_targets += 1;
        }
        stats
    })
}

/// Prints the run summary to stdout in a formatted manner
///
/// # Arguments
///
/// * `reports` - One report per target
pub fn print_summary(reports: &[TargetReport]) {
    println!("\n=== Run Summary ===\n");

    for report in reports {
        println!("Target: {} ({})", report.target, report.slug);
        for site in &report.sites {
            println!(
                "  {:<16} {:>2} page(s)  {:>4} added  stopped: {}",
                site.site,
                site.pages_fetched,
                site.added,
                site.ending()
            );
        }

        match &report.status {
            RunStatus::Written { files } => {
                println!("  Collected {} records", report.collected);
                for file in files {
                    println!("    -> {}", file.display());
                }
            }
            RunStatus::NoRecords => println!("  No records collected"),
            RunStatus::NothingFetched => println!("  FAILED: no page could be fetched"),
            RunStatus::WriteFailed(e) => println!(
                "  FAILED: collected {} records but could not write them: {}",
                report.collected, e
            ),
        }
        println!();
    }

    let stats = run_statistics(reports);
    println!(
        "Total: {} target(s), {} page(s), {} record(s), {} file(s) written",
        stats.targets, stats.pages_fetched, stats.records_collected, stats.files_written
    );
    if stats.failed_targets > 0 {
        println!("{} target(s) failed", stats.failed_targets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{SiteOutcome, StopReason};
    use crate::state::PaginatorState;
    use std::path::PathBuf;

    fn outcome(site: &str, pages: u32, added: usize) -> SiteOutcome {
        SiteOutcome {
            site: site.to_string(),
            pages_fetched: pages,
            added,
            duplicates: 0,
            keyless: 0,
            dropped: 0,
            final_state: PaginatorState::Done,
            stop_reason: Some(StopReason::NoNextPage),
            failure: None,
        }
    }

    #[test]
    fn test_run_statistics() {
        let reports = vec![
            TargetReport {
                target: "news".to_string(),
                slug: "headlines".to_string(),
                sites: vec![outcome("A", 1, 10), outcome("B", 1, 5)],
                collected: 15,
                status: RunStatus::Written {
                    files: vec![PathBuf::from("a.csv"), PathBuf::from("a.json")],
                },
            },
            TargetReport {
                target: "jobs".to_string(),
                slug: "jobs".to_string(),
                sites: vec![outcome("C", 0, 0)],
                collected: 0,
                status: RunStatus::NothingFetched,
            },
        ];

        let stats = run_statistics(&reports);
        assert_eq!(stats.targets, 2);
        assert_eq!(stats.sites, 3);
        assert_eq!(stats.pages_fetched, 2);
        assert_eq!(stats.records_collected, 15);
        assert_eq!(stats.files_written, 2);
        assert_eq!(stats.failed_targets, 1);
    }
}
