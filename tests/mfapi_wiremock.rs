#![cfg(feature = "mfapi")]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use fundbook::models::SchemeCode;
use fundbook::navdata::providers::MfapiNavSource;
use fundbook::navdata::{CoverageStatus, MemoryNavStore, NavPoint, NavService, NavSource, NavStore};
use rust_decimal_macros::dec;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HISTORY_BODY: &str = r#"{
    "meta": {
        "fund_house": "Axis Mutual Fund",
        "scheme_type": "Open Ended Schemes",
        "scheme_code": 120503,
        "scheme_name": "Axis Bluechip Fund - Direct Plan - Growth"
    },
    "data": [
        {"date": "07-03-2024", "nav": "59.1000"},
        {"date": "06-03-2024", "nav": "58.7200"},
        {"date": "05-03-2024", "nav": "58.9100"}
    ],
    "status": "SUCCESS"
}"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn mount_history(server: &MockServer, scheme: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/mf/{scheme}")))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetch_history_parses_and_sorts_published_navs() -> Result<()> {
    let server = MockServer::start().await;
    let source = MfapiNavSource::new().with_base_url(server.uri());

    mount_history(&server, "120503", HISTORY_BODY).await;

    let points = source.fetch_history(SchemeCode::new(120503)).await?;

    // API order is newest-first; the source hands back ascending history.
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].date, date(2024, 3, 5));
    assert_eq!(points[2].date, date(2024, 3, 7));
    assert_eq!(points[2].nav, dec!(59.1));
    assert_eq!(points[0].source, "mfapi");
    Ok(())
}

#[tokio::test]
async fn http_error_status_surfaces_as_a_fetch_failure() -> Result<()> {
    let server = MockServer::start().await;
    let source = MfapiNavSource::new().with_base_url(server.uri());

    Mock::given(method("GET"))
        .and(path("/mf/999999"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = source.fetch_history(SchemeCode::new(999999)).await;
    assert!(result.is_err(), "a 404 must not produce an empty history");
    Ok(())
}

#[tokio::test]
async fn refresh_retries_until_the_server_recovers() -> Result<()> {
    let server = MockServer::start().await;

    // Two failures, then the real payload.
    Mock::given(method("GET"))
        .and(path("/mf/120503"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_history(&server, "120503", HISTORY_BODY).await;

    let store = Arc::new(MemoryNavStore::new());
    let service = NavService::new(
        store.clone(),
        Some(Arc::new(MfapiNavSource::new().with_base_url(server.uri()))),
    )
    .with_fetch_attempts(3)
    .with_retry_backoff(Duration::from_millis(1));

    let status = service
        .refresh(SchemeCode::new(120503), date(2024, 3, 7))
        .await?;
    assert_eq!(status, CoverageStatus::Refreshed { added: 3 });

    let cached = store
        .get_nav(SchemeCode::new(120503), date(2024, 3, 6))
        .await?
        .unwrap();
    assert_eq!(cached.nav, dec!(58.72));
    Ok(())
}

#[tokio::test]
async fn empty_history_for_unknown_scheme_adds_nothing() -> Result<()> {
    let server = MockServer::start().await;
    mount_history(
        &server,
        "999999",
        r#"{"meta": {}, "data": [], "status": "SUCCESS"}"#,
    )
    .await;

    let store = Arc::new(MemoryNavStore::new());
    let service = NavService::new(
        store.clone(),
        Some(Arc::new(MfapiNavSource::new().with_base_url(server.uri()))),
    );

    let status = service
        .refresh(SchemeCode::new(999999), date(2024, 3, 7))
        .await?;
    assert_eq!(status, CoverageStatus::Refreshed { added: 0 });
    assert!(store.get_all(SchemeCode::new(999999)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn ensure_coverage_serves_cache_when_the_server_stays_down() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mf/120503"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryNavStore::new());
    store
        .put_navs(&[NavPoint::new(
            SchemeCode::new(120503),
            date(2024, 3, 1),
            dec!(58),
            "test",
            Utc::now(),
        )])
        .await?;

    let service = NavService::new(
        store,
        Some(Arc::new(MfapiNavSource::new().with_base_url(server.uri()))),
    )
    .with_fetch_attempts(2)
    .with_retry_backoff(Duration::from_millis(1));

    let status = service
        .ensure_coverage(SchemeCode::new(120503), date(2024, 3, 7))
        .await?;
    assert_eq!(status, CoverageStatus::Stale);

    // And the stale point still answers date lookups.
    let nav = service
        .nav_on_or_before(SchemeCode::new(120503), date(2024, 3, 7))
        .await?;
    assert_eq!(nav.date, date(2024, 3, 1));
    Ok(())
}
