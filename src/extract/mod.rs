//! Turning page content into records
//!
//! Site behaviour is data: a [`SiteRules`] table says where listing blocks
//! are, how to read each field, and how to find the next page. One generic
//! [`Extractor`] runs any table.

mod extractor;
pub mod normalize;
mod rules;
mod template;

pub use extractor::{Extractor, PageScan};
pub(crate) use extractor::parse_selector;
pub use rules::{FieldRule, FieldSource, MissingPolicy, Normalizer, Pagination, SiteRules};
pub use template::{placeholder_names, SearchParams, PAGE_PARAM};
