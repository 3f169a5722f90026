//! Integration tests for the harvester
//!
//! These tests use wiremock to serve catalog and detail pages and run the
//! full crawl, enrich, reconcile and store cycle end-to-end.

use inventory_harvest::config::{
    Config, DetailLabels, HarvesterConfig, HttpConfig, LocationsConfig, OutputConfig,
    SelectorConfig, SourceConfig, TierConfig,
};
use inventory_harvest::crawler::{harvest_all, Harvester, Termination};
use inventory_harvest::reconcile::{build_report, LocationEntry, LocationTable, TierThresholds};
use inventory_harvest::storage::{SqliteStorage, Storage};
use inventory_harvest::{HarvestError, SourceKind};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> HarvesterConfig {
    HarvesterConfig {
        max_pages: 10,
        page_delay_ms: 0,
        detail_concurrency: 2,
        batch_delay_ms: 0,
        detail_timeout_ms: 2_000,
    }
}

fn source(server: &MockServer, name: &str, kind: SourceKind, page_size: u32) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        kind,
        catalog_url: format!("{}/catalog/{}?page={{page}}&size={{size}}", server.uri(), name),
        page_size,
        first_page: 0,
        max_pages: None,
        enrich: false,
        default_make: None,
        category_segment: None,
        selectors: SelectorConfig {
            tile: ".tile".to_string(),
            name: ".name".to_string(),
            brand: Some(".brand".to_string()),
            price: Some(".price".to_string()),
            location: Some(".store".to_string()),
            ..SelectorConfig::default()
        },
        detail_labels: DetailLabels::default(),
    }
}

/// Renders a listing page with one tile per product id
fn listing(ids: &[u32]) -> String {
    let tiles: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<div class="tile">
                    <a href="/detail/{id}"><span class="name">2024 5095M - {id}</span></a>
                    <span class="brand">John Deere</span>
                    <span class="price">Sale Price: $96,977</span>
                    <span class="store">Gretna, NE</span>
                </div>"#,
                id = id
            )
        })
        .collect();
    format!("<html><body><div class=\"results\">{}</div></body></html>", tiles)
}

fn detail(location: &str, hours: &str) -> String {
    format!(
        "<html><body><table>\
         <tr><th>Location:</th><td>{}</td></tr>\
         <tr><th>Hours</th><td>{}</td></tr>\
         </table></body></html>",
        location, hours
    )
}

async fn mount_page(server: &MockServer, name: &str, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(format!("/catalog/{}", name)))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn locations() -> LocationTable {
    LocationTable::from_entries(vec![
        LocationEntry {
            name: "GRETNA".to_string(),
            label: "Gretna, NE".to_string(),
            lat: 41.14,
            lng: -96.24,
            aliases: vec![],
        },
        LocationEntry {
            name: "OMAHA".to_string(),
            label: "Omaha, NE".to_string(),
            lat: 41.26,
            lng: -95.93,
            aliases: vec![],
        },
    ])
    .unwrap()
}

#[tokio::test]
async fn test_crawl_stops_on_short_page() {
    let server = MockServer::start().await;
    mount_page(&server, "new", "0", listing(&[1, 2])).await;
    mount_page(&server, "new", "1", listing(&[3])).await;

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester
        .crawl(&source(&server, "new", SourceKind::New, 2))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::ShortPage);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 3);

    let ids: Vec<_> = outcome.records.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let first = &outcome.records[0];
    assert_eq!(first.year, "2024");
    assert_eq!(first.make, "JOHN DEERE");
    assert_eq!(first.model, "5095M");
    assert_eq!(first.price, "$96,977");
    assert_eq!(first.location, "GRETNA");
    assert_eq!(first.detail_url, format!("{}/detail/1", server.uri()));
}

#[tokio::test]
async fn test_crawl_stops_on_empty_page() {
    let server = MockServer::start().await;
    mount_page(&server, "new", "0", listing(&[1, 2])).await;
    mount_page(&server, "new", "1", listing(&[])).await;

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester
        .crawl(&source(&server, "new", SourceKind::New, 2))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::EndOfResults);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_listing_failure_keeps_earlier_records() {
    let server = MockServer::start().await;
    mount_page(&server, "used", "0", listing(&[1, 2])).await;
    Mock::given(method("GET"))
        .and(path("/catalog/used"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester
        .crawl(&source(&server, "used", SourceKind::Used, 2))
        .await
        .unwrap();

    assert!(matches!(
        outcome.termination,
        Termination::TransportFailure { page: 1, .. }
    ));
    assert!(outcome.termination.is_anomaly());
    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_page_ceiling_ends_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing(&[1, 2])))
        .mount(&server)
        .await;

    let mut config = source(&server, "new", SourceKind::New, 2);
    config.max_pages = Some(3);

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester.crawl(&config).await.unwrap();

    assert_eq!(outcome.termination, Termination::PageCeiling);
    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.records.len(), 6);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_detail_enrichment_and_fallback() {
    let server = MockServer::start().await;
    mount_page(&server, "used", "0", listing(&[1, 2, 3])).await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail("Omaha, NE", "1,250")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/detail/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail("", "")))
        .mount(&server)
        .await;
    // /detail/2 is not mounted and answers 404

    let mut config = source(&server, "used", SourceKind::Used, 10);
    config.enrich = true;

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester.crawl(&config).await.unwrap();

    assert_eq!(outcome.termination, Termination::ShortPage);
    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.detail_failures, 1);

    let enriched = &outcome.records[0];
    assert_eq!(enriched.location, "OMAHA");
    assert_eq!(enriched.hours.as_deref(), Some("1,250"));

    // Failed and empty detail pages leave the listing guess in place
    assert_eq!(outcome.records[1].location, "GRETNA");
    assert_eq!(outcome.records[1].hours, None);
    assert_eq!(outcome.records[2].location, "GRETNA");
}

#[tokio::test]
async fn test_detail_timeout_counts_as_failure() {
    let server = MockServer::start().await;
    mount_page(&server, "used", "0", listing(&[1])).await;
    Mock::given(method("GET"))
        .and(path("/detail/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(detail("Omaha, NE", "80"))
                .set_delay(Duration::from_millis(1_500)),
        )
        .mount(&server)
        .await;

    let mut config = source(&server, "used", SourceKind::Used, 10);
    config.enrich = true;

    let harvester = Harvester::new(
        &HttpConfig::default(),
        HarvesterConfig {
            detail_timeout_ms: 100,
            ..settings()
        },
    )
    .unwrap();
    let outcome = harvester.crawl(&config).await.unwrap();

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.detail_failures, 1);
    assert_eq!(outcome.records[0].location, "GRETNA");
}

#[tokio::test]
async fn test_invalid_selector_is_an_error() {
    let server = MockServer::start().await;
    let mut config = source(&server, "new", SourceKind::New, 2);
    config.selectors.tile = "div[".to_string();

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let result = harvester.crawl(&config).await;

    assert!(matches!(result, Err(HarvestError::Selector { .. })));
}

fn harvest_config(dir: &TempDir, sources: Vec<SourceConfig>) -> Config {
    Config {
        harvester: settings(),
        http: HttpConfig::default(),
        output: OutputConfig {
            database_path: dir.path().join("harvest.db").display().to_string(),
            summary_path: dir.path().join("summary.md").display().to_string(),
            stats_path: dir.path().join("stats.json").display().to_string(),
        },
        locations: LocationsConfig {
            path: dir.path().join("locations.toml").display().to_string(),
        },
        tiers: TierConfig::default(),
        sources,
    }
}

#[tokio::test]
async fn test_harvest_all_rejects_empty_harvest() {
    let server = MockServer::start().await;
    mount_page(&server, "new", "0", listing(&[])).await;

    let dir = TempDir::new().unwrap();
    let config = harvest_config(
        &dir,
        vec![source(&server, "new", SourceKind::New, 2)],
    );

    let result = harvest_all(&config).await;
    assert!(matches!(result, Err(HarvestError::NoRecords { sources: 1 })));
}

#[tokio::test]
async fn test_harvest_reconcile_and_store() {
    let server = MockServer::start().await;
    mount_page(&server, "new", "0", listing(&[1, 2])).await;
    mount_page(&server, "auction", "0", listing(&[2, 9])).await;

    let dir = TempDir::new().unwrap();
    let config = harvest_config(
        &dir,
        vec![
            source(&server, "new", SourceKind::New, 10),
            source(&server, "auction", SourceKind::Secondary, 10),
        ],
    );

    let outcomes = harvest_all(&config).await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].source_name, "new");
    assert_eq!(outcomes[1].source_kind, SourceKind::Secondary);

    let mut records: Vec<_> = outcomes.into_iter().flat_map(|o| o.records).collect();
    let table = locations();
    let report = build_report(&mut records, &table, TierThresholds::CRAWL);

    // Every tile shares year, make, model and store, so each secondary
    // record matches a primary one regardless of product id
    assert_eq!(report.total_records, 4);
    assert_eq!(report.duplicate_count(), 2);
    assert_eq!(report.overlap_percentage(), 100.0);

    let gretna = &report.aggregation.stats["GRETNA"];
    assert_eq!(gretna.total, 2);
    assert_eq!(gretna.by_source.new, 2);
    assert_eq!(gretna.by_source.secondary, 0);
    assert_eq!(gretna.duplicates, 2);
    assert_eq!(report.aggregation.stats["OMAHA"].total, 0);

    let mut storage = SqliteStorage::new(dir.path().join("harvest.db").as_path()).unwrap();
    let run_id = storage.create_run("test-hash").unwrap();
    assert_eq!(storage.insert_records(run_id, &records).unwrap(), 4);
    storage.complete_run(run_id).unwrap();

    let latest = storage.latest_completed_run().unwrap().unwrap();
    assert_eq!(latest.id, run_id);

    let mut reloaded = storage.load_records(run_id).unwrap();
    assert_eq!(reloaded.len(), 4);

    let replay = build_report(&mut reloaded, &table, TierThresholds::REPORT);
    assert_eq!(replay.duplicate_count(), 2);
    assert_eq!(replay.aggregation.stats["GRETNA"].total, 2);
}

#[tokio::test]
async fn test_nameless_tile_still_counts_toward_page_size() {
    let server = MockServer::start().await;
    let page = listing(&[1, 2]).replace(
        "</div></body>",
        r#"<div class="tile"><span class="name">  </span></div></div></body>"#,
    );
    mount_page(&server, "new", "0", page).await;
    mount_page(&server, "new", "1", listing(&[3])).await;

    let harvester = Harvester::new(&HttpConfig::default(), settings()).unwrap();
    let outcome = harvester
        .crawl(&source(&server, "new", SourceKind::New, 3))
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::ShortPage);
    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 3);
}

#[tokio::test]
async fn test_harvest_all_checks_selectors_before_fetching() {
    let server = MockServer::start().await;
    mount_page(&server, "new", "0", listing(&[1])).await;

    let mut broken = source(&server, "used", SourceKind::Used, 10);
    broken.selectors.name = "span[".to_string();

    let dir = TempDir::new().unwrap();
    let config = harvest_config(
        &dir,
        vec![source(&server, "new", SourceKind::New, 10), broken],
    );

    let result = harvest_all(&config).await;
    assert!(matches!(result, Err(HarvestError::Selector { .. })));
    assert!(server.received_requests().await.unwrap().is_empty());
}
