//! 99acres property search

use super::Target;
use crate::extract::{FieldRule, Normalizer, Pagination, SiteRules};
use std::collections::BTreeMap;

pub(super) fn target() -> Target {
    let mut params = BTreeMap::new();
    params.insert("city".to_string(), "pune".to_string());

    Target {
        name: "realestate".to_string(),
        slug: "realestate_{city}".to_string(),
        concurrent: false,
        params,
        sites: vec![ninety_nine_acres()],
    }
}

fn ninety_nine_acres() -> SiteRules {
    SiteRules {
        name: "99acres".to_string(),
        search_url: "https://www.99acres.com/search/property/buy/{city|lower}?keyword={city|encode}"
            .to_string(),
        container: vec![
            "div.projectTuple".to_string(),
            "div.srpTuple__tupleTable".to_string(),
            "div[class*='tuple'], div[class*='Tuple']".to_string(),
        ],
        key_field: "link".to_string(),
        fields: vec![
            FieldRule::text("title", &["a.srpTuple__propertyName", "a.projectTuple__projectName"])
                .required(),
            FieldRule::text("price", &["td.srpTuple__price", "div.list_header_semiBold"])
                .or_sentinel("Price on Request"),
            FieldRule::text(
                "location",
                &["a.srpTuple__localityName", "div.projectTuple__subHeadingWithLocality"],
            )
            .or_sentinel("{city}"),
            FieldRule::attr(
                "link",
                "href",
                &["a.srpTuple__propertyName", "a.projectTuple__projectName"],
            )
            .normalized(Normalizer::AbsoluteUrl)
            .required(),
        ],
        pagination: Pagination::Template(
            "https://www.99acres.com/search/property/buy/{city|lower}?keyword={city|encode}&page={page}"
                .to_string(),
        ),
        block_markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extractor, SearchParams};

    #[test]
    fn test_missing_location_falls_back_to_city() {
        let html = r#"
            <div class="projectTuple">
              <a class="projectTuple__projectName" href="/spr-1">Green Acres</a>
              <div class="list_header_semiBold">₹ 85 L</div>
            </div>
            <div class="projectTuple">
              <a class="projectTuple__projectName" href="/spr-2">Blue Heights</a>
              <div class="projectTuple__subHeadingWithLocality">Baner, Pune</div>
            </div>
        "#;
        let params = SearchParams::new().with("city", "Pune");
        let extractor = Extractor::compile(&ninety_nine_acres(), &params).unwrap();
        let page = extractor.start_url().clone();
        let records = extractor.extract(html, &page);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("price"), Some("₹ 85 L"));
        assert_eq!(records[0].get("location"), Some("Pune"));
        assert_eq!(records[1].get("price"), Some("Price on Request"));
        assert_eq!(records[1].get("location"), Some("Baner, Pune"));
        assert_eq!(records[1].get("link"), Some("https://www.99acres.com/spr-2"));
    }
}
