//! Naukri job search

use super::Target;
use crate::extract::{FieldRule, Normalizer, Pagination, SiteRules};
use std::collections::BTreeMap;

pub(super) fn target() -> Target {
    let mut params = BTreeMap::new();
    params.insert("role".to_string(), "python developer".to_string());
    params.insert("location".to_string(), "remote".to_string());

    Target {
        name: "jobs".to_string(),
        slug: "jobs_{role}_{location}".to_string(),
        concurrent: false,
        params,
        sites: vec![naukri()],
    }
}

fn naukri() -> SiteRules {
    SiteRules {
        name: "Naukri".to_string(),
        search_url: "https://www.naukri.com/{role|slug}-jobs-in-{location|slug}".to_string(),
        container: vec![
            "div.srp-jobtuple-wrapper".to_string(),
            "article.jobTuple".to_string(),
            "div.list".to_string(),
        ],
        key_field: "link".to_string(),
        fields: vec![
            FieldRule::text("title", &["a.title"]).required(),
            FieldRule::text("company", &["a.comp-name", "a.subTitle"]).or_sentinel("Confidential"),
            FieldRule::text("experience", &["span.exp-wrap", "span.exp", "li.experience"])
                .or_sentinel("Not specified"),
            FieldRule::text("salary", &["span.sal-wrap", "span.sal", "li.salary"])
                .or_sentinel("Not disclosed"),
            FieldRule::text("location", &["span.loc-wrap", "span.loc", "li.location"])
                .or_sentinel("Not specified"),
            FieldRule::attr("link", "href", &["a.title"])
                .normalized(Normalizer::AbsoluteUrl)
                .required(),
        ],
        pagination: Pagination::Template(
            "https://www.naukri.com/{role|slug}-jobs-in-{location|slug}-{page}".to_string(),
        ),
        block_markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Extractor, SearchParams};
    use url::Url;

    #[test]
    fn test_naukri_sentinels() {
        let html = r#"
            <div class="srp-jobtuple-wrapper">
              <a class="title" href="https://www.naukri.com/job-listings-1">Python Developer</a>
              <a class="comp-name">Acme Corp</a>
              <span class="exp-wrap">2-5 Yrs</span>
              <span class="loc-wrap">Remote</span>
            </div>
            <div class="srp-jobtuple-wrapper">
              <a class="title" href="/job-listings-2">Backend Engineer</a>
            </div>
            <div class="srp-jobtuple-wrapper">
              <span class="sal-wrap">10 LPA</span>
            </div>
        "#;
        let params = SearchParams::new()
            .with("role", "python developer")
            .with("location", "remote");
        let extractor = Extractor::compile(&naukri(), &params).unwrap();
        let page = extractor.start_url().clone();
        let scan = extractor.scan(html, &page, 1);

        assert_eq!(scan.records.len(), 2);
        assert_eq!(scan.dropped, 1);

        let first = &scan.records[0];
        assert_eq!(first.get("company"), Some("Acme Corp"));
        assert_eq!(first.get("salary"), Some("Not disclosed"));

        let second = &scan.records[1];
        assert_eq!(second.get("company"), Some("Confidential"));
        assert_eq!(second.get("experience"), Some("Not specified"));
        assert_eq!(second.get("location"), Some("Not specified"));
        assert_eq!(second.get("link"), Some("https://www.naukri.com/job-listings-2"));

        let next = scan.next_page.unwrap();
        assert_eq!(
            next,
            Url::parse("https://www.naukri.com/python-developer-jobs-in-remote-2").unwrap()
        );
    }
}
