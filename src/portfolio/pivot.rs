//! Fund-by-date matrix views of PnL.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use super::models::pnl_percent;
use crate::error::EngineError;
use crate::models::FundIdentity;

/// Which number fills the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotMetric {
    PnlAbs,
    PnlPct,
}

impl PivotMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PivotMetric::PnlAbs => "pnl",
            PivotMetric::PnlPct => "pnl-pct",
        }
    }
}

impl FromStr for PivotMetric {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "pnl" | "pnl-abs" => Ok(PivotMetric::PnlAbs),
            "pnl-pct" | "pnl_pct" => Ok(PivotMetric::PnlPct),
            other => Err(EngineError::invalid_request(format!(
                "unknown pivot metric {other:?}: expected pnl or pnl-pct"
            ))),
        }
    }
}

/// Whether cells are reported as-is or rebased against a reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotMode {
    Absolute,
    /// Each cell becomes the change in current value since the reference
    /// date (typically the latest), exposing the recent move instead of
    /// the since-inception totals that dominate long-held funds.
    RelativeTo(NaiveDate),
}

/// A fund-by-date matrix request.
#[derive(Debug, Clone)]
pub struct PivotRequest {
    /// Valuation dates for the columns; deduplicated and sorted ascending
    /// before use.
    pub dates: Vec<NaiveDate>,
    pub metric: PivotMetric,
    pub mode: PivotMode,
}

/// One matrix cell. `NotYetInvested` marks fund/date pairs before the
/// fund's first purchase; it is deliberately distinct from a computed zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PivotCell {
    Value { value: Decimal },
    NotYetInvested,
}

impl PivotCell {
    pub fn value(value: Decimal) -> Self {
        PivotCell::Value { value }
    }
}

/// One fund's row, cells aligned with the table's date columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub fund: FundIdentity,
    pub cells: Vec<PivotCell>,
}

/// The assembled matrix. Columns ascend by date; rows descend by invested
/// capital at the latest column so the heaviest positions come first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub metric: PivotMetric,
    /// Set when cells are rebased against a reference date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<NaiveDate>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<PivotRow>,
}

/// Last `count` entries of an ascending date list, still ascending. This
/// is how "the most recent N days" of a series become pivot columns.
pub fn select_recent_dates(dates: &[NaiveDate], count: usize) -> Vec<NaiveDate> {
    let start = dates.len().saturating_sub(count);
    dates[start..].to_vec()
}

/// Change in current value since the reference observation.
pub(crate) fn relative_pnl_abs(current_value: Decimal, reference_value: Decimal) -> Decimal {
    current_value - reference_value
}

/// Change since the reference observation as a percentage of it. Falls
/// back to zero when the reference value is not positive (the fund had no
/// position to measure against).
pub(crate) fn relative_pnl_pct(current_value: Decimal, reference_value: Decimal) -> Decimal {
    pnl_percent(current_value - reference_value, reference_value)
}
