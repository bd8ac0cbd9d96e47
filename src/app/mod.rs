mod import;
mod report;
mod types;

use std::sync::Arc;

use crate::config::ResolvedConfig;
use crate::navdata::{JsonlNavStore, NavService, NavSource, NavStore};

pub use import::{import_trades_file, map_fund};
pub use report::{
    history_report, holdings_report, pivot_report, refresh_navs, summary_report,
    HistoryReportRequest, PivotReportRequest,
};
pub use types::{
    HistoryOutput, HistoryPoint, HoldingRow, HoldingsOutput, ImportOutput, MapFundOutput,
    PivotCellOutput, PivotOutput, PivotRowOutput, RefreshOutput, SchemeRefreshOutput, ScopeOutput,
    SummaryOutput, SummaryRow, UnmappedTradeOutput,
};

/// NAV service wired per configuration: JSONL cache in the data directory,
/// mfapi.in as the fetch source when that feature is enabled.
pub fn build_nav_service(config: &ResolvedConfig) -> Arc<NavService> {
    let store: Arc<dyn NavStore> = Arc::new(JsonlNavStore::new(&config.data_dir));
    let service = NavService::new(store, nav_source(config))
        .with_fetch_attempts(config.nav.fetch_attempts)
        .with_fetch_timeout(config.nav.fetch_timeout)
        .with_retry_backoff(config.nav.retry_backoff);
    Arc::new(service)
}

#[cfg(feature = "mfapi")]
fn nav_source(config: &ResolvedConfig) -> Option<Arc<dyn NavSource>> {
    let mut source = crate::navdata::providers::MfapiNavSource::new();
    if let Some(base_url) = &config.nav.base_url {
        source = source.with_base_url(base_url);
    }
    Some(Arc::new(source))
}

#[cfg(not(feature = "mfapi"))]
fn nav_source(_config: &ResolvedConfig) -> Option<Arc<dyn NavSource>> {
    None
}
