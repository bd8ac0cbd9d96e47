use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::{NavPoint, NavSource, NavStore};
use crate::error::EngineError;
use crate::models::SchemeCode;

/// What a coverage check did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStatus {
    /// Cache already covered the requested window; nothing fetched.
    Covered,
    /// History was fetched and new points were cached.
    Refreshed { added: usize },
    /// Source unreachable, serving previously cached history.
    Stale,
}

/// Serves per-scheme NAVs from the cache, fetching from the source when a
/// requested window is not covered yet.
///
/// Lookups resolve "the NAV in effect on a date": the exact cached point,
/// or the most recent one before it (non-trading days carry the last
/// published NAV forward). The store is the source of truth for history;
/// the external source only ever tops it up.
pub struct NavService {
    store: Arc<dyn NavStore>,
    source: Option<Arc<dyn NavSource>>,
    fetch_attempts: u32,
    fetch_timeout: Duration,
    retry_backoff: Duration,
}

impl NavService {
    pub fn new(store: Arc<dyn NavStore>, source: Option<Arc<dyn NavSource>>) -> Self {
        Self {
            store,
            source,
            fetch_attempts: 3,
            fetch_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(500),
        }
    }

    pub fn with_fetch_attempts(mut self, attempts: u32) -> Self {
        self.fetch_attempts = attempts.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn store(&self) -> &Arc<dyn NavStore> {
        &self.store
    }

    /// The NAV in effect on `date` from the cache alone.
    pub async fn nav_on_or_before(
        &self,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<NavPoint, EngineError> {
        if let Some(point) = self.store.nav_on_or_before(scheme, date).await? {
            debug!(
                scheme = %scheme,
                date = %date,
                nav_date = %point.date,
                nav = %point.nav,
                "NAV resolved from cache"
            );
            return Ok(point);
        }
        Err(EngineError::NoPriceAvailable { scheme, date })
    }

    /// Make sure the cache reaches `through`, fetching the scheme's full
    /// history if it does not. A source failure here is strict: it surfaces
    /// even when older cached data exists. Use [`Self::ensure_coverage`]
    /// for the tolerant variant valuation paths want.
    pub async fn refresh(
        &self,
        scheme: SchemeCode,
        through: NaiveDate,
    ) -> Result<CoverageStatus, EngineError> {
        let coverage = self.store.coverage(scheme).await?;
        if let Some((first, last)) = coverage {
            if last >= through {
                debug!(
                    scheme = %scheme,
                    first = %first,
                    last = %last,
                    through = %through,
                    "NAV cache already covers window"
                );
                return Ok(CoverageStatus::Covered);
            }
        }

        let Some(source) = &self.source else {
            // Cache-only mode: whatever is cached is all there is.
            return Ok(CoverageStatus::Covered);
        };

        let history = self.fetch_with_retry(source.as_ref(), scheme).await?;
        if history.is_empty() {
            warn!(scheme = %scheme, source = source.name(), "source returned no NAV history");
            return Ok(CoverageStatus::Refreshed { added: 0 });
        }

        // The store ignores dates it already has; count the points past the
        // previous coverage as the new ones.
        let added = match coverage {
            Some((_, last)) => history.iter().filter(|p| p.date > last).count(),
            None => history.len(),
        };
        self.store.put_navs(&history).await?;
        info!(
            scheme = %scheme,
            source = source.name(),
            points = history.len(),
            added,
            "NAV history cached"
        );
        Ok(CoverageStatus::Refreshed { added })
    }

    /// Tolerant coverage check: when the source is unreachable but the
    /// cache has history, log and fall back to it. The failure only
    /// surfaces when there is nothing cached to serve.
    pub async fn ensure_coverage(
        &self,
        scheme: SchemeCode,
        through: NaiveDate,
    ) -> Result<CoverageStatus, EngineError> {
        match self.refresh(scheme, through).await {
            Ok(status) => Ok(status),
            Err(source_err @ EngineError::PriceSourceUnavailable { .. }) => {
                if self.store.coverage(scheme).await?.is_some() {
                    warn!(
                        scheme = %scheme,
                        error = %source_err,
                        "NAV source unavailable, serving cached history"
                    );
                    Ok(CoverageStatus::Stale)
                } else {
                    Err(source_err)
                }
            }
            Err(other) => Err(other),
        }
    }

    /// NAV for `date` with refresh-on-miss: coverage first, then the
    /// on-or-before lookup.
    pub async fn nav_for(
        &self,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<NavPoint, EngineError> {
        self.ensure_coverage(scheme, date).await?;
        self.nav_on_or_before(scheme, date).await
    }

    async fn fetch_with_retry(
        &self,
        source: &dyn NavSource,
        scheme: SchemeCode,
    ) -> Result<Vec<NavPoint>, EngineError> {
        let attempts = self.fetch_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match tokio::time::timeout(self.fetch_timeout, source.fetch_history(scheme)).await {
                Ok(Ok(points)) => return Ok(points),
                Ok(Err(e)) => {
                    last_error = format!("{e:#}");
                }
                Err(_) => {
                    last_error = format!("timed out after {:?}", self.fetch_timeout);
                }
            }
            warn!(
                scheme = %scheme,
                source = source.name(),
                attempt,
                attempts,
                error = %last_error,
                "NAV history fetch failed"
            );
            if attempt < attempts {
                tokio::time::sleep(self.retry_backoff).await;
            }
        }

        Err(EngineError::PriceSourceUnavailable {
            scheme,
            reason: last_error,
        })
    }
}
