use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use tracing::debug;

use super::models::pnl_percent;
use super::pivot::{relative_pnl_abs, relative_pnl_pct};
use super::{
    FundHoldings, FundValuation, HoldingsReport, PivotCell, PivotMetric, PivotMode, PivotRequest,
    PivotRow, PivotTable, PortfolioValuation, SeriesPoint, ValuationDelta, ValuationScope,
};
use crate::error::EngineError;
use crate::models::{FundLedger, PortfolioLedger, SchemeCode};
use crate::navdata::NavService;

/// Valuation engine: joins ledger-derived positions with cached NAVs.
///
/// Every number it produces is recomputed from lots and prices on request;
/// nothing here is stored, so corrected history flows through on the next
/// call.
pub struct PortfolioService {
    navs: Arc<NavService>,
}

impl PortfolioService {
    pub fn new(navs: Arc<NavService>) -> Self {
        Self { navs }
    }

    /// Units and net capital per fund at `date`, no prices involved.
    ///
    /// Funds whose first purchase is after `date` are omitted; rows order
    /// by descending invested capital.
    pub fn holdings(&self, ledger: &PortfolioLedger, date: NaiveDate) -> HoldingsReport {
        let mut funds: Vec<FundHoldings> = ledger
            .funds()
            .filter(|f| f.first_purchase_date().is_some_and(|d| d <= date))
            .map(|f| FundHoldings {
                fund: f.fund.clone(),
                units_held: f.units_held(date),
                invested: f.invested(date),
            })
            .collect();
        funds.sort_by(|a, b| {
            b.invested
                .cmp(&a.invested)
                .then_with(|| a.fund.scheme_code.cmp(&b.fund.scheme_code))
        });
        let total_invested = funds.iter().map(|f| f.invested).sum();

        HoldingsReport {
            date,
            funds,
            total_invested,
        }
    }

    /// Valuation of one fund at end of day on `date`.
    pub async fn fund_valuation(
        &self,
        ledger: &PortfolioLedger,
        scheme: SchemeCode,
        date: NaiveDate,
    ) -> Result<FundValuation, EngineError> {
        let fund = ledger
            .get(scheme)
            .ok_or(EngineError::UnknownFund { scheme })?;
        let navs = if fund.units_held(date).is_zero() {
            // No units means no price is needed; don't touch the source.
            BTreeMap::new()
        } else {
            self.prepared_navs(scheme, date).await?
        };
        Self::value_fund(fund, date, &navs)
    }

    /// Valuation of the whole portfolio at end of day on `date`. Funds not
    /// yet purchased by `date` are skipped; the rest are summed.
    pub async fn portfolio_valuation(
        &self,
        ledger: &PortfolioLedger,
        date: NaiveDate,
    ) -> Result<PortfolioValuation, EngineError> {
        let mut rows = Vec::new();
        for fund in ledger.funds() {
            let Some(first) = fund.first_purchase_date() else {
                continue;
            };
            if first > date {
                continue;
            }
            let scheme = fund.fund.scheme_code;
            let navs = if fund.units_held(date).is_zero() {
                BTreeMap::new()
            } else {
                self.prepared_navs(scheme, date).await?
            };
            rows.push(Self::value_fund(fund, date, &navs)?);
        }

        let invested: Decimal = rows.iter().map(|r| r.invested).sum();
        let current_value: Decimal = rows.iter().map(|r| r.current_value).sum();
        let pnl_abs = current_value - invested;
        rows.sort_by(|a, b| {
            b.invested
                .cmp(&a.invested)
                .then_with(|| a.fund.scheme_code.cmp(&b.fund.scheme_code))
        });

        Ok(PortfolioValuation {
            date,
            invested,
            current_value,
            pnl_abs,
            pnl_pct: pnl_percent(pnl_abs, invested),
            funds: rows,
        })
    }

    /// Change across `[from, to]` for a fund or the portfolio.
    pub async fn window(
        &self,
        ledger: &PortfolioLedger,
        scope: ValuationScope,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ValuationDelta, EngineError> {
        if from > to {
            return Err(EngineError::invalid_request(format!(
                "window start {from} is after end {to}"
            )));
        }

        let start = self.scoped_point(ledger, scope, from).await?;
        let end = self.scoped_point(ledger, scope, to).await?;

        Ok(ValuationDelta {
            from_date: from,
            to_date: to,
            delta_pnl_abs: end.pnl_abs - start.pnl_abs,
            delta_pnl_pct: end.pnl_pct - start.pnl_pct,
            window_return_pct: pnl_percent(
                end.current_value - start.current_value,
                start.current_value,
            ),
        })
    }

    /// One valuation per calendar day over `[start, end]`, inclusive.
    ///
    /// Days without a published NAV reuse the most recent one before them,
    /// so the series has no holes. Rerunning over unchanged inputs yields
    /// the same rows.
    pub async fn daily_series(
        &self,
        ledger: &PortfolioLedger,
        scope: ValuationScope,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SeriesPoint>, EngineError> {
        if start > end {
            return Err(EngineError::invalid_request(format!(
                "series start {start} is after end {end}"
            )));
        }

        let fund_ledgers: Vec<&FundLedger> = match scope {
            ValuationScope::Portfolio => ledger.funds().collect(),
            ValuationScope::Fund(scheme) => vec![ledger
                .get(scheme)
                .ok_or(EngineError::UnknownFund { scheme })?],
        };

        // One NAV map per fund up front; the day loop below is then pure
        // in-memory lookups.
        let mut prepared: Vec<(&FundLedger, BTreeMap<NaiveDate, Decimal>)> = Vec::new();
        for fund in fund_ledgers {
            let Some(first) = fund.first_purchase_date() else {
                continue;
            };
            if first > end {
                continue;
            }
            let holds_units_in_range = !fund.units_held(start).is_zero()
                || fund
                    .purchases()
                    .iter()
                    .any(|l| l.date > start && l.date <= end);
            let navs = if holds_units_in_range {
                self.prepared_navs(fund.fund.scheme_code, end).await?
            } else {
                BTreeMap::new()
            };
            prepared.push((fund, navs));
        }
        debug!(
            funds = prepared.len(),
            start = %start,
            end = %end,
            "building daily valuation series"
        );

        let mut points = Vec::new();
        let mut date = start;
        while date <= end {
            let mut invested = Decimal::ZERO;
            let mut current_value = Decimal::ZERO;
            for (fund, navs) in &prepared {
                let units = fund.units_held(date);
                invested += fund.invested(date);
                if units.is_zero() {
                    continue;
                }
                let Some((_, nav)) = navs.range(..=date).next_back() else {
                    return Err(EngineError::NoPriceAvailable {
                        scheme: fund.fund.scheme_code,
                        date,
                    });
                };
                current_value += units * *nav;
            }
            let pnl_abs = current_value - invested;
            points.push(SeriesPoint {
                date,
                invested,
                current_value,
                pnl_abs,
                pnl_pct: pnl_percent(pnl_abs, invested),
            });
            date += Duration::days(1);
        }

        Ok(points)
    }

    /// Assemble a fund-by-date matrix per the request.
    pub async fn pivot(
        &self,
        ledger: &PortfolioLedger,
        request: &PivotRequest,
    ) -> Result<PivotTable, EngineError> {
        let mut dates = request.dates.clone();
        dates.sort_unstable();
        dates.dedup();
        let Some(&latest) = dates.last() else {
            return Err(EngineError::invalid_request(
                "pivot needs at least one date",
            ));
        };

        let reference = match request.mode {
            PivotMode::Absolute => None,
            PivotMode::RelativeTo(date) => Some(date),
        };
        let through = reference.map_or(latest, |r| r.max(latest));

        let mut rows: Vec<(Decimal, PivotRow)> = Vec::new();
        for fund in ledger.funds() {
            let Some(first) = fund.first_purchase_date() else {
                continue;
            };
            if first > latest {
                // Every cell would be a marker; the row says nothing.
                continue;
            }
            let scheme = fund.fund.scheme_code;

            let mut value_dates = dates.clone();
            value_dates.extend(reference);
            let needs_navs = value_dates
                .iter()
                .any(|&d| first <= d && !fund.units_held(d).is_zero());
            let navs = if needs_navs {
                self.prepared_navs(scheme, through).await?
            } else {
                BTreeMap::new()
            };

            let value_at = |d: NaiveDate| -> Result<(Decimal, Decimal), EngineError> {
                let units = fund.units_held(d);
                let invested = fund.invested(d);
                if units.is_zero() {
                    return Ok((invested, Decimal::ZERO));
                }
                let Some((_, nav)) = navs.range(..=d).next_back() else {
                    return Err(EngineError::NoPriceAvailable { scheme, date: d });
                };
                Ok((invested, units * *nav))
            };

            let reference_value = match reference {
                // A reference before the fund existed contributes an empty
                // base: absolute cells then show the full current value.
                Some(r) if first <= r => Some(value_at(r)?.1),
                Some(_) => Some(Decimal::ZERO),
                None => None,
            };

            let mut cells = Vec::with_capacity(dates.len());
            for &d in &dates {
                if first > d {
                    cells.push(PivotCell::NotYetInvested);
                    continue;
                }
                let (invested, current_value) = value_at(d)?;
                let pnl_abs = current_value - invested;
                let value = match (request.metric, reference_value) {
                    (PivotMetric::PnlAbs, None) => pnl_abs,
                    (PivotMetric::PnlPct, None) => pnl_percent(pnl_abs, invested),
                    (PivotMetric::PnlAbs, Some(base)) => relative_pnl_abs(current_value, base),
                    (PivotMetric::PnlPct, Some(base)) => relative_pnl_pct(current_value, base),
                };
                cells.push(PivotCell::value(value));
            }

            rows.push((
                fund.invested(latest),
                PivotRow {
                    fund: fund.fund.clone(),
                    cells,
                },
            ));
        }

        rows.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.fund.scheme_code.cmp(&b.1.fund.scheme_code))
        });

        Ok(PivotTable {
            metric: request.metric,
            reference,
            dates,
            rows: rows.into_iter().map(|(_, row)| row).collect(),
        })
    }

    async fn scoped_point(
        &self,
        ledger: &PortfolioLedger,
        scope: ValuationScope,
        date: NaiveDate,
    ) -> Result<SeriesPoint, EngineError> {
        match scope {
            ValuationScope::Portfolio => {
                let v = self.portfolio_valuation(ledger, date).await?;
                Ok(SeriesPoint {
                    date,
                    invested: v.invested,
                    current_value: v.current_value,
                    pnl_abs: v.pnl_abs,
                    pnl_pct: v.pnl_pct,
                })
            }
            ValuationScope::Fund(scheme) => {
                let v = self.fund_valuation(ledger, scheme, date).await?;
                Ok(SeriesPoint {
                    date,
                    invested: v.invested,
                    current_value: v.current_value,
                    pnl_abs: v.pnl_abs,
                    pnl_pct: v.pnl_pct,
                })
            }
        }
    }

    /// Coverage check plus a full in-memory copy of the scheme's series.
    async fn prepared_navs(
        &self,
        scheme: SchemeCode,
        through: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, Decimal>, EngineError> {
        self.navs.ensure_coverage(scheme, through).await?;
        let all = self.navs.store().get_all(scheme).await?;
        Ok(all.into_iter().map(|p| (p.date, p.nav)).collect())
    }

    fn value_fund(
        fund: &FundLedger,
        date: NaiveDate,
        navs: &BTreeMap<NaiveDate, Decimal>,
    ) -> Result<FundValuation, EngineError> {
        let units_held = fund.units_held(date);
        let invested = fund.invested(date);

        let (nav, nav_date, current_value) = if units_held.is_zero() {
            (None, None, Decimal::ZERO)
        } else {
            let Some((found_date, found_nav)) = navs.range(..=date).next_back() else {
                return Err(EngineError::NoPriceAvailable {
                    scheme: fund.fund.scheme_code,
                    date,
                });
            };
            (Some(*found_nav), Some(*found_date), units_held * *found_nav)
        };

        let pnl_abs = current_value - invested;
        Ok(FundValuation {
            fund: fund.fund.clone(),
            date,
            units_held,
            invested,
            nav,
            nav_date,
            current_value,
            pnl_abs,
            pnl_pct: pnl_percent(pnl_abs, invested),
        })
    }
}
