//! Output module for persisting results and reporting on a run
//!
//! This module handles:
//! - Writing result sets as CSV and/or JSON
//! - Printing the end-of-run summary

pub mod stats;
mod writer;

pub use stats::{print_summary, run_statistics, RunStatistics};
pub use writer::{file_stem, write_results, WriteError};
