//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a mock marketplace and exercise
//! full runs end-to-end: pagination termination, ledger-driven dedup,
//! degraded enrichment and fatal-error paths.

use freshlist::config::{ClientConfig, Config, OutputConfig, SearchConfig};
use freshlist::crawler::Controller;
use freshlist::ledger::{Ledger, LedgerEntry, SqliteLedger};
use std::future::pending;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn test_config(base_url: &str, dir: &TempDir) -> Config {
    Config {
        search: SearchConfig {
            base_url: format!("{}/sch/i.html", base_url),
            query: "rare covers".to_string(),
            min_price: 100,
            page_size: 240,
        },
        client: ClientConfig {
            user_agent: "freshlist-test/1.0".to_string(),
            request_timeout_secs: 5,
            max_concurrent_items: 4,
        },
        output: OutputConfig {
            ledger_path: dir
                .path()
                .join("ledger.db")
                .to_string_lossy()
                .into_owned(),
            export_dir: dir.path().join("out").to_string_lossy().into_owned(),
        },
    }
}

fn fragment_html(href: &str, title: &str, price: &str) -> String {
    format!(
        r#"<div class="s-item__wrapper">
            <a class="s-item__link" href="{href}">{title}Opens in a new window or tab</a>
            <span class="s-item__listingDate">Aug-01 09:30</span>
            <span class="s-item__price">{price}</span>
        </div>"#
    )
}

fn search_html(fragments: &[String], next_href: Option<&str>) -> String {
    let next = match next_href {
        Some(href) => format!(r#"<a class="pagination__next" href="{href}">Next</a>"#),
        None => r#"<span class="pagination__next"></span>"#.to_string(),
    };
    // Two leading promotional slots the harvester must skip
    let promos = r#"<div class="s-item__wrapper">promo</div>
                    <div class="s-item__wrapper">promo</div>"#;

    format!(
        "<html><body><ul>{}{}</ul>{}</body></html>",
        promos,
        fragments.join("\n"),
        next
    )
}

fn detail_html(image: &str, seller: &str, seller_href: &str, desc_src: &str) -> String {
    format!(
        r#"<html><body>
            <div class="ux-image-carousel-item active"><img src="{image}"></div>
            <div class="x-sellercard-atf__info__about-seller">
                <a href="{seller_href}">{seller}</a>
            </div>
            <dl>
                <dt>Condition</dt><dd>Used</dd>
                <dt>Item location</dt><dd>Paris, France</dd>
            </dl>
            <div class="d-item-description"><iframe src="{desc_src}"></iframe></div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts a search page for the given page number
async fn mount_search_page(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .and(query_param("_pgn", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Mounts an item with a working detail page and description document
async fn mount_item(server: &MockServer, base: &str, item: u32) {
    let detail = detail_html(
        &format!("https://i.ebayimg.com/images/{item}.jpg"),
        "coverdealer",
        "https://www.ebay.com/usr/coverdealer",
        &format!("{base}/desc/{item}"),
    );
    mount_html(server, &format!("/itm/{item}"), detail).await;
    mount_html(
        server,
        &format!("/desc/{item}"),
        format!("<html><body>Description of item {item}</body></html>"),
    )
    .await;
}

#[tokio::test]
async fn test_two_page_crawl_stops_on_known_item() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    // Page 1: five new items, forward link present
    let page1: Vec<String> = (101..=105)
        .map(|n| fragment_html(&format!("{base}/itm/{n}?hash=x{n}"), &format!("Cover {n}"), "$150"))
        .collect();
    mount_search_page(&server, 1, search_html(&page1, Some("page2"))).await;

    // Page 2: three items, the second already known
    let page2: Vec<String> = (201..=203)
        .map(|n| fragment_html(&format!("{base}/itm/{n}?hash=x{n}"), &format!("Cover {n}"), "$300"))
        .collect();
    mount_search_page(&server, 2, search_html(&page2, Some("page3"))).await;

    for n in (101..=105).chain(201..=203) {
        mount_item(&server, &base, n).await;
    }

    // Seed the ledger so item 202 counts as already seen
    {
        let mut ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
        ledger
            .commit(&[LedgerEntry {
                identifier: "id-202".to_string(),
                first_seen: "01-07-2026".to_string(),
                url: format!("{base}/itm/202"),
            }])
            .unwrap();
    }

    let mut controller = Controller::new(config.clone(), "test-hash").unwrap();
    let report = controller.run(pending()).await.expect("run failed");

    // 5 from page 1, plus items 201 and 203 from page 2; the crawl must not
    // request page 3
    assert_eq!(report.new_items, 7);
    assert_eq!(report.pages_visited, 2);
    assert!(!report.partial);

    let identifiers: Vec<&str> = report
        .records
        .iter()
        .map(|r| r.identifier.as_str())
        .collect();
    assert_eq!(
        identifiers,
        vec!["id-101", "id-102", "id-103", "id-104", "id-105", "id-201", "id-203"]
    );

    // Enrichment fields came through
    let first = &report.records[0];
    assert_eq!(first.url, format!("{base}/itm/101"));
    assert_eq!(first.name, "Cover 101");
    assert_eq!(first.price, 150);
    assert_eq!(first.image_url, "https://i.ebayimg.com/images/101.jpg");
    assert_eq!(first.seller_name, "coverdealer");
    assert_eq!(first.seller_url, "https://www.ebay.com/usr/coverdealer");
    assert_eq!(first.description, "Description of item 101");
    assert!(first.location_info.contains("Item location: Paris, France"));

    // Every collected identifier is now durable, alongside the seeded one
    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    let seen = ledger.load_seen().unwrap();
    assert_eq!(seen.len(), 8);
    for record in &report.records {
        assert!(seen.contains(&record.identifier));
    }

    // One export artifact with a header and seven rows
    let export_path = report.export_path.expect("expected an export");
    let content = std::fs::read_to_string(export_path).unwrap();
    assert_eq!(content.lines().count(), 8);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    let fragments: Vec<String> = (11..=12)
        .map(|n| fragment_html(&format!("{base}/itm/{n}"), &format!("Cover {n}"), "$120"))
        .collect();
    mount_search_page(&server, 1, search_html(&fragments, None)).await;
    for n in 11..=12 {
        mount_item(&server, &base, n).await;
    }

    let mut first = Controller::new(config.clone(), "test-hash").unwrap();
    let first_report = first.run(pending()).await.expect("first run failed");
    assert_eq!(first_report.new_items, 2);

    let mut second = Controller::new(config.clone(), "test-hash").unwrap();
    let second_report = second.run(pending()).await.expect("second run failed");

    assert_eq!(second_report.new_items, 0);
    assert!(second_report.export_path.is_none());

    // Ledger unchanged by the second run
    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    assert_eq!(ledger.count_seen().unwrap(), 2);

    // Still exactly one export artifact
    let exports = std::fs::read_dir(dir.path().join("out")).unwrap().count();
    assert_eq!(exports, 1);
}

#[tokio::test]
async fn test_degraded_detail_fetch_emits_partial_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    let fragments = vec![fragment_html(
        &format!("{base}/itm/77"),
        "Damaged detail",
        "$400",
    )];
    mount_search_page(&server, 1, search_html(&fragments, None)).await;

    Mock::given(method("GET"))
        .and(path("/itm/77"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut controller = Controller::new(config, "test-hash").unwrap();
    let report = controller.run(pending()).await.expect("run failed");

    assert_eq!(report.new_items, 1);
    let record = &report.records[0];

    // Partial data is acceptable; total loss is not
    assert_eq!(record.name, "Damaged detail");
    assert_eq!(record.price, 400);
    assert_eq!(record.listing_date, "Aug-01 09:30");
    assert!(record.image_url.is_empty());
    assert!(record.seller_name.is_empty());
    assert!(record.seller_url.is_empty());
    assert!(record.description.is_empty());
    assert!(record.location_info.is_empty());
}

#[tokio::test]
async fn test_unparseable_price_skips_only_that_fragment() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    let fragments = vec![
        fragment_html(&format!("{base}/itm/31"), "Grouped price", "$1,250"),
        fragment_html(&format!("{base}/itm/32"), "Clean price", "$300"),
    ];
    mount_search_page(&server, 1, search_html(&fragments, None)).await;
    mount_item(&server, &base, 32).await;

    let mut controller = Controller::new(config.clone(), "test-hash").unwrap();
    let report = controller.run(pending()).await.expect("run failed");

    assert_eq!(report.new_items, 1);
    assert_eq!(report.records[0].identifier, "id-32");

    // The skipped item must not be remembered: a later run can still get it
    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    let seen = ledger.load_seen().unwrap();
    assert!(!seen.contains("id-31"));
    assert_eq!(seen.len(), 1);
}

#[tokio::test]
async fn test_failed_search_fetch_aborts_without_commit() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    Mock::given(method("GET"))
        .and(path("/sch/i.html"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut controller = Controller::new(config.clone(), "test-hash").unwrap();
    let result = controller.run(pending()).await;
    assert!(result.is_err());

    // Nothing reached the ledger
    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    assert_eq!(ledger.count_seen().unwrap(), 0);

    // No export artifact either
    assert!(!dir.path().join("out").exists());
}

#[tokio::test]
async fn test_description_fetch_failure_leaves_description_empty() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    let fragments = vec![fragment_html(
        &format!("{base}/itm/55"),
        "Broken description",
        "$250",
    )];
    mount_search_page(&server, 1, search_html(&fragments, None)).await;

    // Detail page is fine, but its description document 404s
    let detail = detail_html(
        "https://i.ebayimg.com/images/55.jpg",
        "coverdealer",
        "https://www.ebay.com/usr/coverdealer",
        &format!("{base}/desc/55"),
    );
    mount_html(&server, "/itm/55", detail).await;
    Mock::given(method("GET"))
        .and(path("/desc/55"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut controller = Controller::new(config, "test-hash").unwrap();
    let report = controller.run(pending()).await.expect("run failed");

    assert_eq!(report.new_items, 1);
    let record = &report.records[0];

    // A failed description fetch never aborts the record
    assert!(record.description.is_empty());
    assert_eq!(record.image_url, "https://i.ebayimg.com/images/55.jpg");
    assert_eq!(record.seller_name, "coverdealer");
}

#[tokio::test]
async fn test_missing_pagination_control_is_fatal() {
    let server = MockServer::start().await;
    let base = server.uri();
    let dir = TempDir::new().unwrap();
    let config = test_config(&base, &dir);

    // A page that rendered without the expected pagination structure
    mount_html(
        &server,
        "/sch/i.html",
        "<html><body><p>Something went wrong</p></body></html>".to_string(),
    )
    .await;

    let mut controller = Controller::new(config.clone(), "test-hash").unwrap();
    let result = controller.run(pending()).await;

    assert!(matches!(
        result,
        Err(freshlist::FreshlistError::PageStructure { .. })
    ));

    let ledger = SqliteLedger::new(Path::new(&config.output.ledger_path)).unwrap();
    assert_eq!(ledger.count_seen().unwrap(), 0);
}
