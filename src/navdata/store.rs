use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;

use super::NavPoint;
use crate::models::SchemeCode;

/// Cache of per-scheme daily NAV series.
///
/// Writes are first-write-wins per `(scheme, date)`: a cached date's NAV is
/// a fixed historical record, and later puts for the same date are ignored.
#[async_trait::async_trait]
pub trait NavStore: Send + Sync {
    /// The point cached for exactly this date, if any.
    async fn get_nav(&self, scheme: SchemeCode, date: NaiveDate) -> Result<Option<NavPoint>>;

    /// Most recent cached point with `point.date <= date`, if any. This is
    /// the lookup valuation uses: weekends and holidays carry the last
    /// published NAV forward.
    async fn nav_on_or_before(
        &self,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<Option<NavPoint>>;

    /// Every cached point for the scheme, date-ascending.
    async fn get_all(&self, scheme: SchemeCode) -> Result<Vec<NavPoint>>;

    async fn put_navs(&self, points: &[NavPoint]) -> Result<()>;

    /// Earliest and latest cached dates for the scheme.
    async fn coverage(&self, scheme: SchemeCode) -> Result<Option<(NaiveDate, NaiveDate)>>;
}

#[derive(Default)]
pub struct MemoryNavStore {
    series: tokio::sync::Mutex<BTreeMap<SchemeCode, BTreeMap<NaiveDate, NavPoint>>>,
}

impl MemoryNavStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl NavStore for MemoryNavStore {
    async fn get_nav(&self, scheme: SchemeCode, date: NaiveDate) -> Result<Option<NavPoint>> {
        let series = self.series.lock().await;
        Ok(series.get(&scheme).and_then(|s| s.get(&date)).cloned())
    }

    async fn nav_on_or_before(
        &self,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<Option<NavPoint>> {
        let series = self.series.lock().await;
        Ok(series
            .get(&scheme)
            .and_then(|s| s.range(..=date).next_back())
            .map(|(_, point)| point.clone()))
    }

    async fn get_all(&self, scheme: SchemeCode) -> Result<Vec<NavPoint>> {
        let series = self.series.lock().await;
        Ok(series
            .get(&scheme)
            .map(|s| s.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put_navs(&self, points: &[NavPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }
        let mut series = self.series.lock().await;
        for point in points {
            series
                .entry(point.scheme_code)
                .or_default()
                .entry(point.date)
                .or_insert_with(|| point.clone());
        }
        Ok(())
    }

    async fn coverage(&self, scheme: SchemeCode) -> Result<Option<(NaiveDate, NaiveDate)>> {
        let series = self.series.lock().await;
        Ok(series.get(&scheme).and_then(|s| {
            match (s.first_key_value(), s.last_key_value()) {
                (Some((first, _)), Some((last, _))) => Some((*first, *last)),
                _ => None,
            }
        }))
    }
}
