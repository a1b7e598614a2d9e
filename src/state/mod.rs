//! State module for tracking pagination progress
//!
//! `PaginatorState` names every step of a site's pagination loop so that
//! stop conditions (empty page, failure, exhaustion) are explicit states with
//! checked transitions rather than implicit control flow.

mod paginator_state;

pub use paginator_state::PaginatorState;
