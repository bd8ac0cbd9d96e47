use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use fundbook::models::{FundIdentity, Isin, SchemeCode};
use fundbook::navdata::{MemoryNavStore, NavPoint, NavService, NavStore};
use fundbook::portfolio::PortfolioService;
use rust_decimal::Decimal;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn fund(scheme: u32, isin: &str, name: &str) -> FundIdentity {
    FundIdentity::new(SchemeCode::new(scheme), Isin::new(isin).unwrap(), name)
}

pub fn nav_point(scheme: u32, d: NaiveDate, nav: Decimal) -> NavPoint {
    NavPoint::new(SchemeCode::new(scheme), d, nav, "test", Utc::now())
}

/// Valuation service over a pre-seeded in-memory NAV cache with no external
/// source: lookups answer from the given points alone.
pub async fn cache_only_portfolio(points: &[NavPoint]) -> PortfolioService {
    let store = Arc::new(MemoryNavStore::new());
    store.put_navs(points).await.unwrap();
    PortfolioService::new(Arc::new(NavService::new(store, None)))
}
