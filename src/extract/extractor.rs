//! Generic rule-driven extractor
//!
//! [`Extractor::compile`] turns a [`SiteRules`] table plus the run's search
//! parameters into parsed selectors and expanded templates. Extraction is a
//! pure function of page content: no network, no filesystem, no state kept
//! between calls.

use crate::extract::normalize::{
    clean_price, extract_number, first_word, normalize_whitespace, resolve_link, sanitize_text,
    truncate_text,
};
use crate::extract::rules::{FieldSource, MissingPolicy, Normalizer, Pagination, SiteRules};
use crate::extract::template::SearchParams;
use crate::records::Record;
use crate::{ConfigError, ConfigResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Everything learned from one page in a single parse
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    /// Records that survived the missing-field policies, in page order
    pub records: Vec<Record>,

    /// Listing blocks discarded because a `drop` field was missing
    pub dropped: usize,

    /// False when no container selector matched (layout mismatch)
    pub layout_matched: bool,

    /// URL of the next page, if one exists
    pub next_page: Option<Url>,
}

/// Compiled, ready-to-run form of a site's rules
#[derive(Debug, Clone)]
pub struct Extractor {
    site: String,
    key_field: String,
    start_url: Url,
    containers: Vec<Selector>,
    fields: Vec<CompiledField>,
    pagination: CompiledPagination,
    block_markers: Vec<String>,
    params: SearchParams,
}

#[derive(Debug, Clone)]
struct CompiledField {
    name: String,
    selectors: Vec<Selector>,
    source: FieldSource,
    normalize: Vec<Normalizer>,
    missing: MissingPolicy,
}

#[derive(Debug, Clone)]
enum CompiledPagination {
    Single,
    NextLink {
        selectors: Vec<Selector>,
        text: Option<String>,
    },
    Template(String),
}

/// Outcome of extracting one listing block
enum Item {
    Kept(Record),
    Dropped,
}

impl Extractor {
    /// Compiles site rules against a set of search parameters
    ///
    /// # Arguments
    ///
    /// * `rules` - The site's rule table
    /// * `params` - Search parameters used to expand templates
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - Every selector parsed and every template expanded
    /// * `Err(ConfigError)` - A selector is invalid, a template references an
    ///   unknown parameter, or the search URL is not an http(s) URL
    pub fn compile(rules: &SiteRules, params: &SearchParams) -> ConfigResult<Self> {
        let start = params.expand(&rules.search_url)?;
        let start_url = parse_http_url(&start)?;

        if rules.container.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' must declare at least one container selector",
                rules.name
            )));
        }
        let containers = rules
            .container
            .iter()
            .map(|s| parse_selector(s))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut fields = Vec::with_capacity(rules.fields.len());
        for rule in &rules.fields {
            let selectors = rule
                .selectors
                .iter()
                .map(|s| parse_selector(s))
                .collect::<ConfigResult<Vec<_>>>()?;

            let missing = match &rule.missing {
                MissingPolicy::Sentinel(template) => MissingPolicy::Sentinel(params.expand(template)?),
                other => other.clone(),
            };

            fields.push(CompiledField {
                name: rule.name.clone(),
                selectors,
                source: rule.source.clone(),
                normalize: rule.normalize.clone(),
                missing,
            });
        }

        let pagination = match &rules.pagination {
            Pagination::None => CompiledPagination::Single,
            Pagination::NextLink { selectors, text } => CompiledPagination::NextLink {
                selectors: selectors
                    .iter()
                    .map(|s| parse_selector(s))
                    .collect::<ConfigResult<Vec<_>>>()?,
                text: text.clone(),
            },
            Pagination::Template(template) => {
                parse_http_url(&params.expand_page(template, 2)?)?;
                CompiledPagination::Template(template.clone())
            }
        };

        Ok(Self {
            site: rules.name.clone(),
            key_field: rules.key_field.clone(),
            start_url,
            containers,
            fields,
            pagination,
            block_markers: rules.block_markers.clone(),
            params: params.clone(),
        })
    }

    /// Site display name
    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// First page of the search
    pub fn start_url(&self) -> &Url {
        &self.start_url
    }

    /// Field names in output order
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Extracts every record from a page
    ///
    /// Items missing a `drop` field are skipped; other missing fields get
    /// their empty or sentinel value.
    pub fn extract(&self, html: &str, page_url: &Url) -> Vec<Record> {
        let document = Html::parse_document(html);
        self.extract_document(&document, page_url).0
    }

    /// Finds the URL of the page after `page_number` (1-based)
    pub fn next_page(&self, html: &str, page_url: &Url, page_number: u32) -> Option<Url> {
        let document = Html::parse_document(html);
        self.find_next_page(&document, page_url, page_number)
    }

    /// Returns the first block marker present in the page, if any
    pub fn detect_challenge(&self, html: &str) -> Option<&str> {
        self.block_markers
            .iter()
            .find(|marker| html.contains(marker.as_str()))
            .map(String::as_str)
    }

    /// Parses a page once and returns its records and next-page link
    pub fn scan(&self, html: &str, page_url: &Url, page_number: u32) -> PageScan {
        let document = Html::parse_document(html);
        let (records, dropped, layout_matched) = self.extract_document(&document, page_url);
        let next_page = self.find_next_page(&document, page_url, page_number);

        PageScan {
            records,
            dropped,
            layout_matched,
            next_page,
        }
    }

    fn extract_document(&self, document: &Html, page_url: &Url) -> (Vec<Record>, usize, bool) {
        let blocks = self
            .containers
            .iter()
            .map(|selector| document.select(selector).collect::<Vec<_>>())
            .find(|matches| !matches.is_empty());

        let Some(blocks) = blocks else {
            return (Vec::new(), 0, false);
        };

        let mut records = Vec::with_capacity(blocks.len());
        let mut dropped = 0;
        for block in blocks {
            match self.extract_item(block, page_url) {
                Item::Kept(record) => records.push(record),
                Item::Dropped => dropped += 1,
            }
        }

        (records, dropped, true)
    }

    fn extract_item(&self, block: ElementRef<'_>, page_url: &Url) -> Item {
        let mut record = Record::new();

        for field in &self.fields {
            let value = locate(block, field).and_then(|raw| {
                field
                    .normalize
                    .iter()
                    .try_fold(raw, |value, step| apply_normalizer(step, &value, page_url))
            });

            match (value, &field.missing) {
                (Some(v), _) => record.insert(field.name.as_str(), v),
                (None, MissingPolicy::Drop) => return Item::Dropped,
                (None, MissingPolicy::Empty) => record.insert(field.name.as_str(), ""),
                (None, MissingPolicy::Sentinel(s)) => record.insert(field.name.as_str(), s.as_str()),
            }
        }

        Item::Kept(record)
    }

    fn find_next_page(&self, document: &Html, page_url: &Url, page_number: u32) -> Option<Url> {
        match &self.pagination {
            CompiledPagination::Single => None,
            CompiledPagination::NextLink { selectors, text } => {
                selectors.iter().find_map(|selector| {
                    document
                        .select(selector)
                        .filter(|a| match text {
                            Some(t) => a.text().collect::<String>().contains(t.as_str()),
                            None => true,
                        })
                        .filter_map(|a| a.value().attr("href"))
                        .find_map(|href| resolve_link(href, page_url))
                        .and_then(|link| Url::parse(&link).ok())
                })
            }
            CompiledPagination::Template(template) => self
                .params
                .expand_page(template, page_number + 1)
                .ok()
                .and_then(|next| Url::parse(&next).ok()),
        }
    }
}

/// Locates a field's raw value inside a block
///
/// Returns None when nothing non-empty was found.
fn locate(block: ElementRef<'_>, field: &CompiledField) -> Option<String> {
    match &field.source {
        FieldSource::Constant(value) => Some(value.clone()),
        FieldSource::Text => first_match(block, &field.selectors)
            .into_iter()
            .find_map(|el| sanitize_text(&el.text().collect::<String>())),
        FieldSource::Attr(attr) => first_match(block, &field.selectors)
            .into_iter()
            .filter_map(|el| el.value().attr(attr))
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string),
        FieldSource::Marker {
            contains,
            found,
            absent,
        } => {
            let hit = all_matches(block, &field.selectors).into_iter().any(|el| {
                let text = el.text().collect::<String>();
                contains.iter().any(|m| text.contains(m.as_str()))
            });
            Some(if hit { found.clone() } else { absent.clone() })
        }
    }
}

/// First match of each selector, in selector order (or the block itself)
fn first_match<'a>(block: ElementRef<'a>, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    if selectors.is_empty() {
        return vec![block];
    }
    selectors
        .iter()
        .filter_map(|s| block.select(s).next())
        .collect()
}

/// Every match of every selector (or the block itself)
fn all_matches<'a>(block: ElementRef<'a>, selectors: &[Selector]) -> Vec<ElementRef<'a>> {
    if selectors.is_empty() {
        return vec![block];
    }
    selectors.iter().flat_map(|s| block.select(s)).collect()
}

fn apply_normalizer(step: &Normalizer, value: &str, page_url: &Url) -> Option<String> {
    match step {
        Normalizer::Whitespace => normalize_whitespace(Some(value)).filter(|v| !v.is_empty()),
        Normalizer::PriceDigits => clean_price(Some(value)),
        Normalizer::FirstNumber => extract_number(Some(value)).map(|n| n.to_string()),
        Normalizer::FirstWord => first_word(value).map(str::to_string),
        Normalizer::AbsoluteUrl => resolve_link(value, page_url),
        Normalizer::Truncate(max) => Some(truncate_text(value, *max, "...")),
    }
}

pub(crate) fn parse_selector(selector: &str) -> ConfigResult<Selector> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn parse_http_url(raw: &str) -> ConfigResult<Url> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            raw
        )));
    }
    Ok(url)
}
