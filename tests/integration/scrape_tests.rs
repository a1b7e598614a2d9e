//! End-to-end target runs against a mock server

use crate::common::{html, listing_page, listing_site, run_config, target};
use listing_harvest::config::{parse_target, OutputFormat};
use listing_harvest::crawler::{run_target, RunStatus, StopReason};
use listing_harvest::records::Record;
use listing_harvest::state::PaginatorState;
use listing_harvest::HarvestError;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn read_json(path: &Path) -> Vec<Record> {
    let json = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&json).unwrap()
}

fn links(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.get("link").unwrap().rsplit('/').next().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_paginated_run_deduplicates_and_writes() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/shop/1", html(listing_page(&["1", "2"], Some("/shop/2"))), 1).await;
    mount(&server, "/shop/2", html(listing_page(&["2", "3"], Some("/shop/3"))), 1).await;
    mount(&server, "/shop/3", html(listing_page(&["3", "4"], Some("/shop/4"))), 1).await;
    mount(&server, "/shop/4", html(listing_page(&["5"], None)), 0).await;

    let target = target("shop", false, vec![listing_site("Shop", "/shop/1")]);
    let run = run_config(&server.uri(), out.path(), 3);
    let report = run_target(&target, &run).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.collected, 4);
    assert_eq!(report.sites[0].pages_fetched, 3);
    assert_eq!(report.sites[0].duplicates, 2);
    assert_eq!(report.sites[0].stop_reason, Some(StopReason::MaxPages));

    let files = report.files().to_vec();
    let stem = format!("shop_{}", run.timestamp());
    assert_eq!(
        files,
        vec![
            out.path().join(format!("{}.csv", stem)),
            out.path().join(format!("{}.json", stem)),
        ]
    );

    let csv = std::fs::read_to_string(&files[0]).unwrap();
    assert_eq!(csv.lines().next(), Some("shop,title,link,price,scraped_at"));
    assert_eq!(csv.lines().count(), 5);

    let records = read_json(&files[1]);
    assert_eq!(links(&records), vec!["1", "2", "3", "4"]);
    assert_eq!(records[2].get("price"), Some("3000"));
    assert_eq!(
        records[0].field_names().collect::<Vec<_>>(),
        vec!["shop", "title", "link", "price", "scraped_at"]
    );
}

#[tokio::test]
async fn test_stops_when_a_page_adds_nothing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/s/1", html(listing_page(&["1", "2"], Some("/s/2"))), 1).await;
    mount(&server, "/s/2", html(listing_page(&["2", "1"], Some("/s/3"))), 1).await;
    mount(&server, "/s/3", html(listing_page(&["3"], None)), 0).await;

    let target = target("repeat", false, vec![listing_site("Repeat", "/s/1")]);
    let report = run_target(&target, &run_config(&server.uri(), out.path(), 10))
        .await
        .unwrap();

    assert_eq!(report.collected, 2);
    assert_eq!(report.sites[0].stop_reason, Some(StopReason::NoNewRecords));
}

#[tokio::test]
async fn test_empty_first_page_fetches_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/x/1", html(listing_page(&[], Some("/x/2"))), 1).await;
    mount(&server, "/x/2", html(listing_page(&["1"], None)), 0).await;

    let target = target("empty", false, vec![listing_site("Empty", "/x/1")]);
    let report = run_target(&target, &run_config(&server.uri(), out.path(), 5))
        .await
        .unwrap();

    assert_eq!(report.sites[0].pages_fetched, 1);
    assert_eq!(report.sites[0].stop_reason, Some(StopReason::NoNewRecords));
    assert!(matches!(report.status, RunStatus::NoRecords));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_single_page_limit_fetches_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/one/1", html(listing_page(&["1"], Some("/one/2"))), 1).await;
    mount(&server, "/one/2", html(listing_page(&["2"], None)), 0).await;

    let target = target("one", false, vec![listing_site("One", "/one/1")]);
    let report = run_target(&target, &run_config(&server.uri(), out.path(), 1))
        .await
        .unwrap();

    assert_eq!(report.sites[0].pages_fetched, 1);
    assert_eq!(report.collected, 1);
}

#[tokio::test]
async fn test_timeout_on_second_page_keeps_first_page() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/t/1", html(listing_page(&["1", "2"], Some("/t/2"))), 1).await;
    mount(
        &server,
        "/t/2",
        html(listing_page(&["3"], None)).set_delay(Duration::from_secs(5)),
        1,
    )
    .await;

    let target = target("slow", false, vec![listing_site("Slow", "/t/1")]);
    let mut run = run_config(&server.uri(), out.path(), 3);
    run.fetch.timeout = Duration::from_millis(500);
    let report = run_target(&target, &run).await.unwrap();

    let site = &report.sites[0];
    assert_eq!(site.final_state, PaginatorState::Done);
    assert_eq!(site.stop_reason, Some(StopReason::FetchFailed));
    assert_eq!(site.pages_fetched, 1);
    assert_eq!(report.collected, 2);
    assert_eq!(report.files().len(), 2);
}

#[tokio::test]
async fn test_first_page_failure_fetches_nothing() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/down/1", ResponseTemplate::new(503), 1).await;

    let target = target("down", false, vec![listing_site("Down", "/down/1")]);
    let report = run_target(&target, &run_config(&server.uri(), out.path(), 3))
        .await
        .unwrap();

    assert_eq!(report.sites[0].final_state, PaginatorState::Failed);
    assert!(matches!(report.status, RunStatus::NothingFetched));
    assert!(matches!(
        report.into_result(),
        Err(HarvestError::NothingFetched { ref target }) if target == "down"
    ));
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_challenge_page_is_blocked() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(&server, "/c/1", html("<h1>Verify you are human</h1>"), 1).await;

    let target = target("challenge", false, vec![listing_site("Guarded", "/c/1")]);
    let mut run = run_config(&server.uri(), out.path(), 3);
    run.limits.max_retries = 3;
    let report = run_target(&target, &run).await.unwrap();

    let failure = report.sites[0].failure.as_ref().unwrap();
    assert_eq!(failure.reason.as_str(), "blocked");
    assert!(!report.is_success());
}

#[tokio::test]
async fn test_concurrent_sites_keep_declaration_order() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    // The first site answers last
    mount(
        &server,
        "/a/1",
        html(listing_page(&["1", "2"], None)).set_delay(Duration::from_millis(300)),
        1,
    )
    .await;
    mount(&server, "/b/1", html(listing_page(&["2", "3"], None)), 1).await;
    mount(&server, "/c/1", html(listing_page(&["4"], None)), 1).await;

    let target = target(
        "feeds",
        true,
        vec![
            listing_site("A", "/a/1"),
            listing_site("B", "/b/1"),
            listing_site("C", "/c/1"),
        ],
    );
    let mut run = run_config(&server.uri(), out.path(), 3);
    run.output.format = OutputFormat::Json;
    let report = run_target(&target, &run).await.unwrap();

    let records = read_json(&report.files()[0]);
    let shops: Vec<&str> = records.iter().filter_map(|r| r.get("shop")).collect();
    assert_eq!(shops, vec!["A", "A", "B", "C"]);
    assert_eq!(links(&records), vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_custom_target_from_toml() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount(
        &server,
        "/catalogue/page-1.html",
        html(
            r#"<article class="product_pod"><h3><a href="b1.html" title="Book One">Book...</a></h3><p class="price_color">£51.77</p></article>
               <article class="product_pod"><h3><a href="b2.html" title="Book Two">Book...</a></h3></article>
               <ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>"#,
        ),
        1,
    )
    .await;
    mount(
        &server,
        "/catalogue/page-2.html",
        html(r#"<article class="product_pod"><h3><a href="b3.html" title="Book Three">Book...</a></h3></article>"#),
        1,
    )
    .await;

    let toml = r#"
name = "books"
slug = "books_{genre}"

[params]
genre = "travel"
base = "http://unused.invalid"

[[site]]
name = "Books"
search-url = "{base}/catalogue/page-1.html"
container = ["article.product_pod"]
key-field = "link"
pagination = { next-link = { selectors = ["li.next a"] } }

[[site.field]]
name = "title"
selectors = ["h3 a"]
source = { attr = "title" }
missing = "drop"

[[site.field]]
name = "link"
selectors = ["h3 a"]
source = { attr = "href" }
normalize = ["absolute-url"]
missing = "drop"

[[site.field]]
name = "price"
selectors = ["p.price_color"]
missing = { sentinel = "unknown" }
"#;
    let target = parse_target(toml).unwrap();
    let mut run = run_config(&server.uri(), out.path(), 5);
    run.output.format = OutputFormat::Csv;
    let report = run_target(&target, &run).await.unwrap();

    assert_eq!(report.slug, "books_travel");
    assert_eq!(report.collected, 3);
    assert_eq!(report.sites[0].stop_reason, Some(StopReason::NoNextPage));

    let csv = std::fs::read_to_string(&report.files()[0]).unwrap();
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows[0], "title,link,price,scraped_at");
    assert!(rows[1].starts_with(&format!("Book One,{}/catalogue/b1.html,£51.77,", server.uri())));
    assert!(rows[2].starts_with("Book Two,"));
    assert!(rows[2].contains(",unknown,"));
}
