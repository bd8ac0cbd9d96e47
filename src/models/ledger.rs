use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FundIdentity, Lot, SchemeCode, TradeSide};
use crate::error::EngineError;

/// Signed impact of one lot on the running position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEvent {
    pub date: NaiveDate,
    pub units_delta: Decimal,
    pub amount_delta: Decimal,
}

/// All recorded activity for one fund: its identity plus date-ordered
/// purchase and sale lots.
///
/// Holdings are always derived from the lots. Units held at a date is the
/// sum of purchased units minus sold units up to and including that date;
/// invested capital is the same cumulative sum over lot amounts. Sale
/// proceeds reduce invested capital at the realized price, so `invested`
/// tracks net capital deployed rather than a FIFO cost basis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundLedger {
    pub fund: FundIdentity,
    purchases: Vec<Lot>,
    sales: Vec<Lot>,
}

impl FundLedger {
    pub fn new(fund: FundIdentity) -> Self {
        Self {
            fund,
            purchases: Vec::new(),
            sales: Vec::new(),
        }
    }

    pub fn purchases(&self) -> &[Lot] {
        &self.purchases
    }

    pub fn sales(&self) -> &[Lot] {
        &self.sales
    }

    /// Append a purchase lot, keeping the vector date-ordered. Lots sharing
    /// a date keep their recording order.
    pub fn record_purchase(&mut self, lot: Lot) {
        let pos = self.purchases.partition_point(|l| l.date <= lot.date);
        self.purchases.insert(pos, lot);
    }

    /// Append a sale lot, keeping the vector date-ordered.
    pub fn record_sale(&mut self, lot: Lot) {
        let pos = self.sales.partition_point(|l| l.date <= lot.date);
        self.sales.insert(pos, lot);
    }

    /// True if an identical lot (same units, NAV, and date) is already
    /// recorded on the given side.
    pub fn contains(&self, side: TradeSide, lot: &Lot) -> bool {
        let lots = match side {
            TradeSide::Buy => &self.purchases,
            TradeSide::Sell => &self.sales,
        };
        lots.iter().any(|existing| existing == lot)
    }

    /// Units held at end of day on `date`.
    pub fn units_held(&self, date: NaiveDate) -> Decimal {
        let bought: Decimal = self
            .purchases
            .iter()
            .filter(|l| l.date <= date)
            .map(|l| l.units)
            .sum();
        let sold: Decimal = self
            .sales
            .iter()
            .filter(|l| l.date <= date)
            .map(|l| l.units)
            .sum();
        bought - sold
    }

    /// Net capital deployed at end of day on `date`: purchase amounts in,
    /// sale proceeds out.
    pub fn invested(&self, date: NaiveDate) -> Decimal {
        let paid: Decimal = self
            .purchases
            .iter()
            .filter(|l| l.date <= date)
            .map(|l| l.amount())
            .sum();
        let realized: Decimal = self
            .sales
            .iter()
            .filter(|l| l.date <= date)
            .map(|l| l.amount())
            .sum();
        paid - realized
    }

    /// Date of the earliest purchase, if any. Dates before it have no
    /// position to value.
    pub fn first_purchase_date(&self) -> Option<NaiveDate> {
        self.purchases.first().map(|l| l.date)
    }

    /// Date-ordered deltas this ledger applies to the running position.
    /// Within a date, buys come before sells.
    pub fn events(&self) -> Vec<LedgerEvent> {
        let mut events = Vec::with_capacity(self.purchases.len() + self.sales.len());
        for lot in &self.purchases {
            events.push(LedgerEvent {
                date: lot.date,
                units_delta: lot.units,
                amount_delta: lot.amount(),
            });
        }
        for lot in &self.sales {
            events.push(LedgerEvent {
                date: lot.date,
                units_delta: -lot.units,
                amount_delta: -lot.amount(),
            });
        }
        // Stable sort: buys were pushed first, so same-date buys stay ahead
        // of same-date sells.
        events.sort_by_key(|e| e.date);
        events
    }

    /// Verify that no sale ever exceeds the units held at its date.
    pub fn check_consistency(&self) -> Result<(), EngineError> {
        let mut held = Decimal::ZERO;
        for event in self.events() {
            held += event.units_delta;
            if held < Decimal::ZERO {
                return Err(EngineError::InvalidLot {
                    reason: format!(
                        "scheme {} would hold {} units after {}: sells exceed prior buys",
                        self.fund.scheme_code, held, event.date
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The full trade history for one portfolio, keyed by scheme code.
///
/// Serialized as a flat list of fund ledgers; the map shape is an in-memory
/// convenience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<FundLedger>", into = "Vec<FundLedger>")]
pub struct PortfolioLedger {
    funds: BTreeMap<SchemeCode, FundLedger>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn funds(&self) -> impl Iterator<Item = &FundLedger> {
        self.funds.values()
    }

    pub fn get(&self, scheme: SchemeCode) -> Option<&FundLedger> {
        self.funds.get(&scheme)
    }

    /// Fund ledger for `fund`, created empty if not present yet.
    pub fn entry(&mut self, fund: FundIdentity) -> &mut FundLedger {
        self.funds
            .entry(fund.scheme_code)
            .or_insert_with(|| FundLedger::new(fund))
    }

    pub fn schemes(&self) -> impl Iterator<Item = SchemeCode> + '_ {
        self.funds.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.funds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funds.is_empty()
    }

    /// Earliest purchase date across all funds.
    pub fn first_activity_date(&self) -> Option<NaiveDate> {
        self.funds
            .values()
            .filter_map(|f| f.first_purchase_date())
            .min()
    }

    pub fn check_consistency(&self) -> Result<(), EngineError> {
        for fund in self.funds.values() {
            fund.check_consistency()?;
        }
        Ok(())
    }
}

impl From<Vec<FundLedger>> for PortfolioLedger {
    fn from(funds: Vec<FundLedger>) -> Self {
        let mut ledger = Self::default();
        for fund in funds {
            ledger.funds.insert(fund.fund.scheme_code, fund);
        }
        ledger
    }
}

impl From<PortfolioLedger> for Vec<FundLedger> {
    fn from(ledger: PortfolioLedger) -> Self {
        ledger.funds.into_values().collect()
    }
}
