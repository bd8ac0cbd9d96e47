use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate};

use crate::error::EngineError;
use crate::format::{round_money, round_percent};
use crate::models::{PortfolioLedger, SchemeCode};
use crate::navdata::{CoverageStatus, NavService};
use crate::portfolio::{
    pnl_percent, resample, select_recent_dates, Granularity, PivotCell, PivotMetric, PivotMode,
    PivotRequest, PivotTable, PortfolioService, SeriesPoint, ValuationScope,
};
use crate::storage::LedgerStore;

use super::{
    HistoryOutput, HistoryPoint, HoldingRow, HoldingsOutput, PivotCellOutput, PivotOutput,
    PivotRowOutput, RefreshOutput, SchemeRefreshOutput, ScopeOutput, SummaryOutput, SummaryRow,
};

/// Look-back rows every summary carries, beyond any extra windows the
/// caller asks for.
const SUMMARY_OFFSETS: [(&str, i64); 7] = [
    ("T", 0),
    ("T-1", 1),
    ("T-2", 2),
    ("T-3", 3),
    ("Last Week", 7),
    ("Last 15 Days", 15),
    ("Last Month", 30),
];

async fn load_ledger_required(store: &dyn LedgerStore, user: &str) -> Result<PortfolioLedger> {
    let ledger = store.load_ledger(user).await?.unwrap_or_default();
    if ledger.is_empty() {
        bail!("No trades recorded for user {user}: run import first");
    }
    Ok(ledger)
}

/// Units and net invested capital per fund, straight from the ledger. Works
/// without any NAV data.
pub async fn holdings_report(
    store: &dyn LedgerStore,
    portfolio: &PortfolioService,
    user: &str,
    date: NaiveDate,
) -> Result<HoldingsOutput> {
    let ledger = load_ledger_required(store, user).await?;
    let report = portfolio.holdings(&ledger, date);

    Ok(HoldingsOutput {
        user: user.to_string(),
        date: report.date.to_string(),
        funds: report
            .funds
            .iter()
            .map(|row| HoldingRow {
                scheme_code: row.fund.scheme_code.value(),
                isin: row.fund.isin.to_string(),
                name: row.fund.name.clone(),
                units: row.units_held.normalize().to_string(),
                invested: round_money(row.invested).to_string(),
            })
            .collect(),
        total_invested: round_money(report.total_invested).to_string(),
    })
}

/// Portfolio PnL at the latest valued date compared against a ladder of
/// earlier dates: yesterday, last week, last month, and any extra windows.
///
/// `T` is the last date of the valuation series. Each row clamps to the
/// first valued date at or after its target, so a target older than the
/// portfolio lands on its first day.
pub async fn summary_report(
    store: &dyn LedgerStore,
    portfolio: &PortfolioService,
    user: &str,
    today: NaiveDate,
    extra_days: &[i64],
) -> Result<SummaryOutput> {
    let ledger = load_ledger_required(store, user).await?;
    let start = ledger
        .first_activity_date()
        .context("Ledger has funds but no recorded purchases")?;
    let series = portfolio
        .daily_series(&ledger, ValuationScope::Portfolio, start, today.max(start))
        .await?;
    let last = *series.last().context("Valuation series came back empty")?;

    let mut offsets: Vec<(String, i64)> = SUMMARY_OFFSETS
        .iter()
        .map(|(period, days)| (period.to_string(), *days))
        .collect();
    for &days in extra_days {
        if days <= 0 || offsets.iter().any(|(_, existing)| *existing == days) {
            continue;
        }
        offsets.push((format!("Last {days} Days"), days));
    }

    let rows = offsets
        .into_iter()
        .map(|(period, days)| {
            let point = point_on_or_after(&series, last.date - Duration::days(days));
            let pnl_change = last.pnl_abs - point.pnl_abs;
            SummaryRow {
                period,
                date: point.date.to_string(),
                invested: round_money(point.invested).to_string(),
                current_value: round_money(point.current_value).to_string(),
                pnl: round_money(point.pnl_abs).to_string(),
                pnl_pct: round_percent(point.pnl_pct).to_string(),
                pnl_change: round_money(pnl_change).to_string(),
                pnl_change_pct: round_percent(pnl_percent(pnl_change, last.invested)).to_string(),
            }
        })
        .collect();

    Ok(SummaryOutput {
        user: user.to_string(),
        date: last.date.to_string(),
        rows,
    })
}

/// First point dated at or after `target`; the last point when the whole
/// series precedes it. Callers guarantee a non-empty series.
fn point_on_or_after(series: &[SeriesPoint], target: NaiveDate) -> &SeriesPoint {
    let idx = series.partition_point(|p| p.date < target);
    &series[idx.min(series.len() - 1)]
}

/// Inputs for [`history_report`].
pub struct HistoryReportRequest<'a> {
    pub store: &'a dyn LedgerStore,
    pub portfolio: &'a PortfolioService,
    pub user: &'a str,
    pub today: NaiveDate,
    /// Restrict to one fund; the whole portfolio when absent.
    pub fund: Option<u32>,
    pub granularity: Granularity,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Valuation history for the portfolio or a single fund, resampled to the
/// requested granularity.
///
/// `start` defaults to the scope's first purchase date and `end` to today,
/// so the bare command charts the whole life of the position.
pub async fn history_report(request: HistoryReportRequest<'_>) -> Result<HistoryOutput> {
    let HistoryReportRequest {
        store,
        portfolio,
        user,
        today,
        fund,
        granularity,
        start,
        end,
    } = request;

    let ledger = load_ledger_required(store, user).await?;

    let (scope, scope_output, first_activity) = match fund {
        Some(code) => {
            let scheme = SchemeCode::new(code);
            let fund = ledger
                .get(scheme)
                .ok_or(EngineError::UnknownFund { scheme })?;
            (
                ValuationScope::Fund(scheme),
                ScopeOutput::Fund {
                    scheme_code: code,
                    name: fund.fund.name.clone(),
                },
                fund.first_purchase_date(),
            )
        }
        None => (
            ValuationScope::Portfolio,
            ScopeOutput::Portfolio,
            ledger.first_activity_date(),
        ),
    };

    let start = match start {
        Some(start) => start,
        None => first_activity.context("No purchases recorded in the selected scope")?,
    };
    let end = end.unwrap_or_else(|| today.max(start));

    let series = portfolio.daily_series(&ledger, scope, start, end).await?;
    let points = resample(series, granularity);

    Ok(HistoryOutput {
        user: user.to_string(),
        scope: scope_output,
        granularity: granularity.as_str().to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        points: points
            .iter()
            .map(|p| HistoryPoint {
                date: p.date.to_string(),
                invested: round_money(p.invested).to_string(),
                current_value: round_money(p.current_value).to_string(),
                pnl: round_money(p.pnl_abs).to_string(),
                pnl_pct: round_percent(p.pnl_pct).to_string(),
            })
            .collect(),
    })
}

/// Inputs for [`pivot_report`].
pub struct PivotReportRequest<'a> {
    pub store: &'a dyn LedgerStore,
    pub portfolio: &'a PortfolioService,
    pub user: &'a str,
    pub today: NaiveDate,
    /// Column count when neither `days` nor `dates` is given.
    pub default_days: usize,
    pub days: Option<usize>,
    /// Explicit column dates; overrides `days` when non-empty.
    pub dates: Vec<NaiveDate>,
    pub metric: PivotMetric,
    /// Rebase cells against this date instead of reporting raw PnL.
    pub reference: Option<NaiveDate>,
}

/// Fund-by-date PnL matrix. Default columns are the most recent days of
/// the portfolio's valuation series ending today.
pub async fn pivot_report(request: PivotReportRequest<'_>) -> Result<PivotOutput> {
    let PivotReportRequest {
        store,
        portfolio,
        user,
        today,
        default_days,
        days,
        dates,
        metric,
        reference,
    } = request;

    let ledger = load_ledger_required(store, user).await?;

    let dates = if dates.is_empty() {
        let start = ledger
            .first_activity_date()
            .context("Ledger has funds but no recorded purchases")?;
        let series = portfolio
            .daily_series(&ledger, ValuationScope::Portfolio, start, today.max(start))
            .await?;
        let all: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        select_recent_dates(&all, days.unwrap_or(default_days).max(1))
    } else {
        dates
    };

    let mode = match reference {
        Some(date) => PivotMode::RelativeTo(date),
        None => PivotMode::Absolute,
    };
    let table = portfolio
        .pivot(&ledger, &PivotRequest { dates, metric, mode })
        .await?;

    let PivotTable {
        metric,
        reference,
        dates,
        rows,
    } = table;
    let render = |value| match metric {
        PivotMetric::PnlAbs => round_money(value).to_string(),
        PivotMetric::PnlPct => round_percent(value).to_string(),
    };

    Ok(PivotOutput {
        user: user.to_string(),
        metric: metric.as_str().to_string(),
        reference: reference.map(|d| d.to_string()),
        dates: dates.iter().map(|d| d.to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|row| PivotRowOutput {
                scheme_code: row.fund.scheme_code.value(),
                name: row.fund.name,
                cells: row
                    .cells
                    .into_iter()
                    .map(|cell| match cell {
                        PivotCell::Value { value } => PivotCellOutput::Value {
                            value: render(value),
                        },
                        PivotCell::NotYetInvested => PivotCellOutput::NotYetInvested,
                    })
                    .collect(),
            })
            .collect(),
    })
}

/// Top up the NAV cache through today for every fund in the ledger. One
/// scheme failing does not stop the rest; failures are reported per scheme.
pub async fn refresh_navs(
    store: &dyn LedgerStore,
    navs: &NavService,
    user: &str,
    today: NaiveDate,
) -> Result<RefreshOutput> {
    let ledger = load_ledger_required(store, user).await?;

    let mut schemes = Vec::new();
    let mut failed_count = 0;
    for fund in ledger.funds() {
        let scheme = fund.fund.scheme_code;
        let (status, added, error) = match navs.refresh(scheme, today).await {
            Ok(CoverageStatus::Covered) => ("covered", 0, None),
            Ok(CoverageStatus::Refreshed { added }) => ("refreshed", added, None),
            Ok(CoverageStatus::Stale) => ("stale", 0, None),
            Err(e) => {
                failed_count += 1;
                ("failed", 0, Some(e.to_string()))
            }
        };
        schemes.push(SchemeRefreshOutput {
            scheme_code: scheme.value(),
            name: fund.fund.name.clone(),
            status: status.to_string(),
            added,
            error,
        });
    }

    Ok(RefreshOutput {
        user: user.to_string(),
        through: today.to_string(),
        schemes,
        failed_count,
    })
}
