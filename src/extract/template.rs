//! Search parameters and `{placeholder}` template expansion
//!
//! Site rules describe their search URLs, pagination URLs and sentinel values
//! as templates such as `https://www.naukri.com/{role|slug}-jobs-in-{location|slug}`.
//! [`SearchParams::expand`] fills them in from the run's search parameters.

use crate::{ConfigError, ConfigResult};
use std::collections::BTreeMap;

/// Name of the parameter carrying the page number in pagination templates
pub const PAGE_PARAM: &str = "page";

/// Filters that can follow a placeholder name: `{query|plus}`
const FILTERS: &[&str] = &["plus", "encode", "slug", "lower"];

/// Named search parameters for one run (query, role, location, city, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    values: BTreeMap<String, String>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Fills in every default whose name is not already set
    pub fn with_defaults(mut self, defaults: &BTreeMap<String, String>) -> Self {
        for (name, value) in defaults {
            self.values
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Parameter names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expands every `{name}` / `{name|filter}` placeholder of a template
    ///
    /// # Filters
    ///
    /// | Filter   | Effect                                    |
    /// |----------|-------------------------------------------|
    /// | `plus`   | whitespace runs become `+`                |
    /// | `encode` | `application/x-www-form-urlencoded`       |
    /// | `slug`   | lowercase, whitespace runs become `-`     |
    /// | `lower`  | lowercase                                 |
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The expanded template
    /// * `Err(ConfigError)` - A placeholder names an unset parameter, uses an
    ///   unknown filter, or is not closed
    ///
    /// # Example
    ///
    /// ```
    /// use listing_harvest::extract::SearchParams;
    ///
    /// let params = SearchParams::new().with("query", "gaming laptops");
    /// let url = params.expand("https://www.amazon.in/s?k={query|plus}").unwrap();
    /// assert_eq!(url, "https://www.amazon.in/s?k=gaming+laptops");
    /// ```
    pub fn expand(&self, template: &str) -> ConfigResult<String> {
        let mut out = String::with_capacity(template.len());
        for piece in parse_template(template)? {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Placeholder { name, filter } => {
                    let value =
                        self.get(name)
                            .ok_or_else(|| ConfigError::UnknownPlaceholder {
                                name: name.to_string(),
                                template: template.to_string(),
                            })?;
                    out.push_str(&apply_filter(value, filter));
                }
            }
        }
        Ok(out)
    }

    /// Expands a pagination template for a given page number
    pub fn expand_page(&self, template: &str, page: u32) -> ConfigResult<String> {
        self.clone()
            .with(PAGE_PARAM, page.to_string())
            .expand(template)
    }
}

/// Returns the parameter names referenced by a template
///
/// Used by config validation to reject templates that mention parameters a
/// target never defines.
pub fn placeholder_names(template: &str) -> ConfigResult<Vec<String>> {
    Ok(parse_template(template)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Placeholder { name, .. } => Some(name.to_string()),
            Piece::Literal(_) => None,
        })
        .collect())
}

enum Piece<'a> {
    Literal(&'a str),
    Placeholder {
        name: &'a str,
        filter: Option<&'a str>,
    },
}

fn parse_template(template: &str) -> ConfigResult<Vec<Piece<'_>>> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            pieces.push(Piece::Literal(&rest[..open]));
        }
        let after = &rest[open + 1..];
        let close = after.find('}').ok_or_else(|| {
            ConfigError::Validation(format!("Unclosed placeholder in template '{}'", template))
        })?;

        let inner = after[..close].trim();
        let (name, filter) = match inner.split_once('|') {
            Some((n, f)) => (n.trim(), Some(f.trim())),
            None => (inner, None),
        };

        if name.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Empty placeholder in template '{}'",
                template
            )));
        }
        if let Some(f) = filter {
            if !FILTERS.contains(&f) {
                return Err(ConfigError::Validation(format!(
                    "Unknown filter '{}' in template '{}' (expected one of: {})",
                    f,
                    template,
                    FILTERS.join(", ")
                )));
            }
        }

        pieces.push(Piece::Placeholder { name, filter });
        rest = &after[close + 1..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Literal(rest));
    }

    Ok(pieces)
}

fn apply_filter(value: &str, filter: Option<&str>) -> String {
    match filter {
        Some("plus") => value.split_whitespace().collect::<Vec<_>>().join("+"),
        Some("encode") => url::form_urlencoded::byte_serialize(value.as_bytes()).collect(),
        Some("slug") => value
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-"),
        Some("lower") => value.to_lowercase(),
        _ => value.to_string(),
    }
}
