//! Amazon India and Flipkart product search

use super::Target;
use crate::extract::{FieldRule, Normalizer, Pagination, SiteRules};
use std::collections::BTreeMap;

pub(super) fn target() -> Target {
    let mut params = BTreeMap::new();
    params.insert("query".to_string(), "gaming laptops".to_string());

    Target {
        name: "ecommerce".to_string(),
        slug: "{query}".to_string(),
        concurrent: false,
        params,
        sites: vec![amazon(), flipkart()],
    }
}

fn amazon() -> SiteRules {
    SiteRules {
        name: "Amazon".to_string(),
        search_url: "https://www.amazon.in/s?k={query|plus}".to_string(),
        container: vec!["div[data-component-type='s-search-result']".to_string()],
        key_field: "url".to_string(),
        fields: vec![
            FieldRule::constant("platform", "Amazon"),
            FieldRule::text("title", &["h2 a span", "h2", "span.a-text-normal"]).required(),
            FieldRule::text("price", &["span.a-price-whole", "span.a-offscreen"])
                .normalized(Normalizer::PriceDigits)
                .or_sentinel("unknown"),
            FieldRule::text("rating", &["span.a-icon-alt", "i.a-icon-star-small"])
                .normalized(Normalizer::FirstWord),
            FieldRule::text("reviews", &["span.a-size-base.s-underline-text", "span.a-size-base"]),
            FieldRule::attr("url", "href", &["h2 a", "a.a-link-normal"])
                .normalized(Normalizer::AbsoluteUrl)
                .required(),
            FieldRule::attr("image_url", "src", &["img.s-image"]),
            FieldRule::marker(
                "availability",
                &["span.a-color-price"],
                &["Currently unavailable"],
                "Out of Stock",
                "In Stock",
            ),
        ],
        pagination: Pagination::NextLink {
            selectors: vec!["a.s-pagination-next".to_string()],
            text: None,
        },
        block_markers: vec!["Enter the characters you see below".to_string()],
    }
}

fn flipkart() -> SiteRules {
    SiteRules {
        name: "Flipkart".to_string(),
        search_url: "https://www.flipkart.com/search?q={query|encode}&sort=recency_desc".to_string(),
        container: vec!["div._1AtVbE, div._75nlfW, div[data-id]".to_string()],
        key_field: "url".to_string(),
        fields: vec![
            FieldRule::constant("platform", "Flipkart"),
            FieldRule::text(
                "title",
                &["div.KzDlHZ", "div._4rR01T", "a.s1Q9rs", "div.name", "a[href]"],
            )
            .required(),
            FieldRule::text("price", &["div.Nx9bqj", "div._30jeq3", "div._25b18c ._30jeq3"])
                .normalized(Normalizer::PriceDigits)
                .or_sentinel("unknown"),
            FieldRule::text("rating", &["div.XQDdHH", "div._3LWZlK"])
                .normalized(Normalizer::FirstWord),
            FieldRule::text("reviews", &["span.Wphh3N", "span._2_R_DZ"]),
            FieldRule::attr("url", "href", &["a.CGtC98", "a._1fQZEK", "a.s1Q9rs", "a[href]"])
                .normalized(Normalizer::AbsoluteUrl)
                .required(),
            FieldRule::attr("image_url", "src", &["img._396cs4", "img"]),
            FieldRule::marker("availability", &["div._3Owiq"], &["Sold Out"], "Out of Stock", "In Stock"),
        ],
        pagination: Pagination::NextLink {
            selectors: vec!["a._1LKTO3".to_string(), "a".to_string()],
            text: Some("Next".to_string()),
        },
        block_markers: Vec::new(),
    }
}
