use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{FundIdentity, SchemeCode};

/// What a valuation request ranges over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuationScope {
    Portfolio,
    Fund(SchemeCode),
}

/// Point-in-time view of one fund's position, derived purely from the
/// ledger (no prices involved).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundHoldings {
    pub fund: FundIdentity,
    pub units_held: Decimal,
    pub invested: Decimal,
}

/// Holdings across the portfolio at one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingsReport {
    pub date: NaiveDate,
    pub funds: Vec<FundHoldings>,
    /// Sum of per-fund invested capital. Unit counts are deliberately not
    /// summed: units of different funds are not comparable.
    pub total_invested: Decimal,
}

/// Valuation of one fund at one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundValuation {
    pub fund: FundIdentity,
    pub date: NaiveDate,
    pub units_held: Decimal,
    pub invested: Decimal,
    /// NAV applied. `None` when no units were held, in which case no
    /// lookup was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav: Option<Decimal>,
    /// Publication date of that NAV; earlier than `date` across weekends
    /// and holidays.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_date: Option<NaiveDate>,
    pub current_value: Decimal,
    pub pnl_abs: Decimal,
    pub pnl_pct: Decimal,
}

/// Valuation of the whole portfolio at one date, with the per-fund rows it
/// was summed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioValuation {
    pub date: NaiveDate,
    pub invested: Decimal,
    pub current_value: Decimal,
    pub pnl_abs: Decimal,
    pub pnl_pct: Decimal,
    pub funds: Vec<FundValuation>,
}

/// One day in a valuation time series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub invested: Decimal,
    pub current_value: Decimal,
    pub pnl_abs: Decimal,
    pub pnl_pct: Decimal,
}

/// Change between two valuation dates.
///
/// `delta_pnl_abs` and `delta_pnl_pct` compare cumulative PnL since
/// inception at the two ends; `window_return_pct` is the growth of current
/// value across the window itself. They answer different questions, so both
/// are reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValuationDelta {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub delta_pnl_abs: Decimal,
    pub delta_pnl_pct: Decimal,
    pub window_return_pct: Decimal,
}

/// `pnl / invested` as a percentage, zero whenever invested capital is not
/// positive: a fully recouped position has no meaningful base, and a
/// negative base would flip the ratio's sign.
pub(crate) fn pnl_percent(pnl: Decimal, invested: Decimal) -> Decimal {
    if invested > Decimal::ZERO {
        pnl / invested * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}
