//! Headline pages of three Indian news sites
//!
//! Each listing block is the headline anchor itself, so the field rules
//! carry no selectors.

use super::Target;
use crate::extract::{FieldRule, Normalizer, Pagination, SiteRules};
use std::collections::BTreeMap;

pub(super) fn target() -> Target {
    Target {
        name: "news".to_string(),
        slug: "headlines".to_string(),
        concurrent: true,
        params: BTreeMap::new(),
        sites: vec![
            headline_site(
                "Times of India",
                "https://timesofindia.indiatimes.com/home/headlines",
                &["span.w_tle > a", ".main-content a"],
            ),
            headline_site(
                "The Hindu",
                "https://www.thehindu.com/",
                &["h3.title a", ".story-card-news h3 a"],
            ),
            headline_site(
                "NDTV",
                "https://www.ndtv.com/top-stories",
                &[".news_Itm-cont h2 a"],
            ),
        ],
    }
}

fn headline_site(name: &str, url: &str, anchors: &[&str]) -> SiteRules {
    SiteRules {
        name: name.to_string(),
        search_url: url.to_string(),
        container: anchors.iter().map(|s| s.to_string()).collect(),
        key_field: "link".to_string(),
        fields: vec![
            FieldRule::constant("source", name),
            FieldRule::text("headline", &[]).required(),
            FieldRule::attr("link", "href", &[])
                .normalized(Normalizer::AbsoluteUrl)
                .required(),
        ],
        pagination: Pagination::None,
        block_markers: Vec::new(),
    }
}
