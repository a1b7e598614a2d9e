use crate::extract::{
    parse_selector, placeholder_names, FieldSource, MissingPolicy, Normalizer, Pagination,
    SearchParams, SiteRules, PAGE_PARAM,
};
use crate::sites::{Target, SCRAPED_AT_FIELD};
use crate::ConfigError;
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Validates a whole target: its own fields, then every site against it
pub fn validate_target(target: &Target) -> Result<(), ConfigError> {
    if target.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "Target name cannot be empty".to_string(),
        ));
    }

    if target.sites.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Target '{}' must declare at least one [[site]]",
            target.name
        )));
    }

    let known: HashSet<&str> = target.params.keys().map(String::as_str).collect();
    check_placeholders(&target.slug, &known, false)?;

    let first = &target.sites[0];
    for site in &target.sites {
        validate_site(site, &target.params)?;

        if site.key_field != first.key_field {
            return Err(ConfigError::Validation(format!(
                "Site '{}' uses key field '{}' but '{}' uses '{}'; all sites of a target share one key",
                site.name, site.key_field, first.name, first.key_field
            )));
        }
        if site.field_names() != first.field_names() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' declares fields {:?} but '{}' declares {:?}; all sites of a target share one schema",
                site.name,
                site.field_names(),
                first.name,
                first.field_names()
            )));
        }
    }

    Ok(())
}

/// Validates one site's rules against the parameters a target defines
///
/// # Arguments
///
/// * `site` - The site rule table
/// * `defaults` - Parameters available to templates, with their default values
pub fn validate_site(site: &SiteRules, defaults: &BTreeMap<String, String>) -> Result<(), ConfigError> {
    let known: HashSet<&str> = defaults.keys().map(String::as_str).collect();
    let known = &known;

    if site.name.trim().is_empty() {
        return Err(ConfigError::Validation("Site name cannot be empty".to_string()));
    }

    if site.container.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must declare at least one container selector",
            site.name
        )));
    }
    for selector in &site.container {
        parse_selector(selector)?;
    }

    validate_fields(site)?;

    check_placeholders(&site.search_url, known, false)?;
    validate_search_url(site, defaults)?;

    match &site.pagination {
        Pagination::None => {}
        Pagination::NextLink { selectors, .. } => {
            if selectors.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' next-link pagination needs at least one selector",
                    site.name
                )));
            }
            for selector in selectors {
                parse_selector(selector)?;
            }
        }
        Pagination::Template(template) => {
            check_placeholders(template, known, true)?;
            if !placeholder_names(template)?.iter().any(|n| n == PAGE_PARAM) {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' pagination template '{}' must contain {{{}}}",
                    site.name, template, PAGE_PARAM
                )));
            }
        }
    }

    for marker in &site.block_markers {
        if marker.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' has an empty block marker",
                site.name
            )));
        }
    }

    Ok(())
}

fn validate_fields(site: &SiteRules) -> Result<(), ConfigError> {
    if site.fields.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Site '{}' must declare at least one field",
            site.name
        )));
    }

    let mut names = HashSet::new();
    for field in &site.fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Site '{}' has a field with an empty name",
                site.name
            )));
        }
        if field.name == SCRAPED_AT_FIELD {
            return Err(ConfigError::Validation(format!(
                "Site '{}': field name '{}' is reserved",
                site.name, SCRAPED_AT_FIELD
            )));
        }
        if !names.insert(field.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' declares field '{}' twice",
                site.name, field.name
            )));
        }

        for selector in &field.selectors {
            parse_selector(selector)?;
        }

        if let FieldSource::Marker { contains, .. } = &field.source {
            if contains.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Site '{}' field '{}': marker needs at least one string to look for",
                    site.name, field.name
                )));
            }
        }

        if field.normalize.contains(&Normalizer::Truncate(0)) {
            return Err(ConfigError::Validation(format!(
                "Site '{}' field '{}': truncate length must be > 0",
                site.name, field.name
            )));
        }
    }

    match site.field(&site.key_field) {
        None => Err(ConfigError::Validation(format!(
            "Site '{}' key field '{}' is not a declared field",
            site.name, site.key_field
        ))),
        Some(field) if field.missing != MissingPolicy::Drop => Err(ConfigError::Validation(format!(
            "Site '{}' key field '{}' must use missing = \"drop\"",
            site.name, site.key_field
        ))),
        Some(_) => Ok(()),
    }
}

/// Rejects templates that reference parameters the target never defines
fn check_placeholders(
    template: &str,
    known: &HashSet<&str>,
    allow_page: bool,
) -> Result<(), ConfigError> {
    for name in placeholder_names(template)? {
        let is_page = allow_page && name == PAGE_PARAM;
        if !is_page && !known.contains(name.as_str()) {
            return Err(ConfigError::UnknownPlaceholder {
                name,
                template: template.to_string(),
            });
        }
    }
    Ok(())
}

/// Expands the search URL with the default parameters and checks the result
fn validate_search_url(
    site: &SiteRules,
    defaults: &BTreeMap<String, String>,
) -> Result<(), ConfigError> {
    let expanded = SearchParams::new()
        .with_defaults(defaults)
        .expand(&site.search_url)?;
    let url = Url::parse(&expanded).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Site '{}' search-url '{}': {}",
            site.name, site.search_url, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Site '{}' search-url '{}' must use http or https",
            site.name, site.search_url
        )));
    }

    Ok(())
}
