//! Built-in scraping targets
//!
//! A [`Target`] groups the sites that share one record schema and one output
//! slug. The built-in catalog covers e-commerce prices, job listings, news
//! headlines and real-estate listings; custom targets are loaded from TOML
//! with the same shape (see `crate::config::load_target`).

mod ecommerce;
mod jobs;
mod news;
mod realestate;

use crate::extract::{SearchParams, SiteRules};
use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column stamped on every record when its page is merged
pub const SCRAPED_AT_FIELD: &str = "scraped_at";

/// Sites sharing a schema, a dedup key and an output file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Target {
    pub name: String,

    /// Output file stem template (may reference parameters)
    pub slug: String,

    /// Run all sites at once instead of one after the other
    #[serde(default)]
    pub concurrent: bool,

    /// Default search parameters
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(rename = "site")]
    pub sites: Vec<SiteRules>,
}

impl Target {
    /// Dedup key shared by every site of the target
    pub fn key_field(&self) -> &str {
        self.sites
            .first()
            .map(|s| s.key_field.as_str())
            .unwrap_or_default()
    }

    /// Output columns: site fields in rule order, then `scraped_at`
    pub fn columns(&self) -> Vec<String> {
        let mut columns = self
            .sites
            .first()
            .map(SiteRules::field_names)
            .unwrap_or_default();
        columns.push(SCRAPED_AT_FIELD.to_string());
        columns
    }

    /// Command-line parameters completed with this target's defaults
    pub fn effective_params(&self, given: &SearchParams) -> SearchParams {
        given.clone().with_defaults(&self.params)
    }

    /// Expanded output slug for a set of parameters
    pub fn slug_for(&self, params: &SearchParams) -> ConfigResult<String> {
        params.expand(&self.slug)
    }
}

/// Every built-in target, in the order `all` runs them
pub fn builtin_targets() -> Vec<Target> {
    vec![
        ecommerce::target(),
        jobs::target(),
        news::target(),
        realestate::target(),
    ]
}

/// Looks up a built-in target by name
pub fn builtin(name: &str) -> Option<Target> {
    builtin_targets().into_iter().find(|t| t.name == name)
}
