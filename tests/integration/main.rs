//! Integration tests for listing-harvest
//!
//! These tests use wiremock to serve listing pages and run the full
//! fetch → extract → merge → write cycle end-to-end.

mod common;
mod fetch_tests;
mod scrape_tests;
