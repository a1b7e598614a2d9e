//! Shared fixtures for the integration tests

use listing_harvest::config::{OutputConfig, OutputFormat, PaginationLimits, RunConfig};
use listing_harvest::extract::{FieldRule, Normalizer, Pagination, SearchParams, SiteRules};
use listing_harvest::sites::Target;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use wiremock::ResponseTemplate;

/// A 200 response with an HTML body
pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html; charset=utf-8")
}

/// A listing page with one `<li>` per item and an optional next link
pub fn listing_page(items: &[&str], next: Option<&str>) -> String {
    let mut body = String::from("<html><body><ul>");
    for item in items {
        body.push_str(&format!(
            "<li class=\"item\"><a href=\"/item/{id}\">Item {id}</a><span class=\"price\">₹{id},000</span></li>",
            id = item
        ));
    }
    body.push_str("</ul>");
    if let Some(next) = next {
        body.push_str(&format!("<a class=\"next\" href=\"{}\">Next</a>", next));
    }
    body.push_str("</body></html>");
    body
}

/// Site rules for `listing_page` pages served under `{base}`
pub fn listing_site(name: &str, first_page: &str) -> SiteRules {
    SiteRules {
        name: name.to_string(),
        search_url: format!("{{base}}{}", first_page),
        container: vec!["li.item".to_string()],
        key_field: "link".to_string(),
        fields: vec![
            FieldRule::constant("shop", name),
            FieldRule::text("title", &["a"]).required(),
            FieldRule::attr("link", "href", &["a"])
                .normalized(Normalizer::AbsoluteUrl)
                .required(),
            FieldRule::text("price", &["span.price"])
                .normalized(Normalizer::PriceDigits)
                .or_sentinel("unknown"),
        ],
        pagination: Pagination::NextLink {
            selectors: vec!["a.next".to_string()],
            text: None,
        },
        block_markers: vec!["Verify you are human".to_string()],
    }
}

pub fn target(name: &str, concurrent: bool, sites: Vec<SiteRules>) -> Target {
    Target {
        name: name.to_string(),
        slug: name.to_string(),
        concurrent,
        params: BTreeMap::new(),
        sites,
    }
}

/// Run configuration pointing at a mock server and a temporary directory
pub fn run_config(base: &str, out: &Path, max_pages: u32) -> RunConfig {
    let mut run = RunConfig {
        params: SearchParams::new().with("base", base),
        limits: PaginationLimits {
            max_pages,
            page_delay: Duration::ZERO,
            max_retries: 0,
        },
        output: OutputConfig {
            dir: out.to_path_buf(),
            format: OutputFormat::Both,
        },
        ..RunConfig::default()
    };
    run.fetch.timeout = Duration::from_secs(2);
    run
}
