//! Declarative site rule tables
//!
//! A [`SiteRules`] value describes everything site-specific about scraping
//! one website: where the search starts, which elements are listing blocks,
//! how each field is located and normalized, what to do when a field is
//! missing, and how to reach the next page. Built-in sites construct these
//! in code (see `crate::sites`); custom targets load them from TOML.
//!
//! # TOML shape
//!
//! ```toml
//! [[site]]
//! name = "Books"
//! search-url = "https://books.toscrape.com/catalogue/page-1.html"
//! container = ["article.product_pod"]
//! key-field = "link"
//! pagination = { next-link = { selectors = ["li.next a"] } }
//!
//! [[site.field]]
//! name = "link"
//! selectors = ["h3 a"]
//! source = { attr = "href" }
//! normalize = ["absolute-url"]
//! missing = "drop"
//! ```

use serde::{Deserialize, Serialize};

/// Extraction rules for one website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteRules {
    /// Display name, also used as the log target for this site's loop
    pub name: String,

    /// First page URL template (may reference search parameters)
    pub search_url: String,

    /// Listing block selectors, tried in order; the first that matches wins
    pub container: Vec<String>,

    /// Field whose value identifies a listing across pages
    pub key_field: String,

    /// Field rules, in output column order
    #[serde(rename = "field")]
    pub fields: Vec<FieldRule>,

    /// How the next page is found
    #[serde(default)]
    pub pagination: Pagination,

    /// Strings whose presence in a page means a bot challenge was served
    #[serde(default)]
    pub block_markers: Vec<String>,
}

impl SiteRules {
    /// Output field names in rule order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Returns the rule for a field
    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// How one field is located, normalized and defaulted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FieldRule {
    pub name: String,

    /// Selectors relative to the listing block; empty means the block itself
    #[serde(default)]
    pub selectors: Vec<String>,

    #[serde(default)]
    pub source: FieldSource,

    /// Applied in order; a step yielding nothing makes the field missing
    #[serde(default)]
    pub normalize: Vec<Normalizer>,

    #[serde(default)]
    pub missing: MissingPolicy,
}

impl FieldRule {
    /// Text content of the first non-empty match
    pub fn text(name: &str, selectors: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            source: FieldSource::Text,
            normalize: Vec::new(),
            missing: MissingPolicy::Empty,
        }
    }

    /// Attribute value of the first match that carries it
    pub fn attr(name: &str, attr: &str, selectors: &[&str]) -> Self {
        Self {
            source: FieldSource::Attr(attr.to_string()),
            ..Self::text(name, selectors)
        }
    }

    /// Fixed value for every record of the site
    pub fn constant(name: &str, value: &str) -> Self {
        Self {
            source: FieldSource::Constant(value.to_string()),
            ..Self::text(name, &[])
        }
    }

    /// `found` when any located text contains one of `contains`, else `absent`
    pub fn marker(name: &str, selectors: &[&str], contains: &[&str], found: &str, absent: &str) -> Self {
        Self {
            source: FieldSource::Marker {
                contains: contains.iter().map(|s| s.to_string()).collect(),
                found: found.to_string(),
                absent: absent.to_string(),
            },
            ..Self::text(name, selectors)
        }
    }

    /// Appends a normalizer to the pipeline
    pub fn normalized(mut self, step: Normalizer) -> Self {
        self.normalize.push(step);
        self
    }

    /// Items missing this field are dropped
    pub fn required(mut self) -> Self {
        self.missing = MissingPolicy::Drop;
        self
    }

    /// Items missing this field get `value` instead
    pub fn or_sentinel(mut self, value: &str) -> Self {
        self.missing = MissingPolicy::Sentinel(value.to_string());
        self
    }
}

/// Where a field's raw value comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldSource {
    #[default]
    Text,
    Attr(String),
    Constant(String),
    Marker {
        contains: Vec<String>,
        found: String,
        absent: String,
    },
}

/// One normalization step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalizer {
    /// Collapse whitespace runs
    Whitespace,
    /// Keep digits only (`"₹1,299"` → `"1299"`)
    PriceDigits,
    /// First run of digits
    FirstNumber,
    /// First whitespace-separated word
    FirstWord,
    /// Resolve against the page URL; rejects non-http(s) links
    AbsoluteUrl,
    /// Cut to N characters with a `...` suffix
    Truncate(usize),
}

/// What happens when a field cannot be located
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingPolicy {
    /// Discard the whole item
    Drop,
    /// Keep the item with an empty value
    #[default]
    Empty,
    /// Keep the item with this value (may reference search parameters)
    Sentinel(String),
}

/// How the next page URL is determined
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pagination {
    /// Single page only
    #[default]
    None,
    /// Follow the first matching anchor, optionally requiring its text
    NextLink {
        selectors: Vec<String>,
        #[serde(default)]
        text: Option<String>,
    },
    /// URL template with a `{page}` placeholder
    Template(String),
}
