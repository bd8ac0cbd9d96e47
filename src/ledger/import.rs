use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EngineError;
use crate::models::{FundIdentity, Isin, Lot, PortfolioLedger, SchemeCode, TradeSide};

/// One normalized row from a broker trade export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub isin: Isin,
    pub trade_date: NaiveDate,
    pub trade_type: TradeSide,
    pub quantity: Decimal,
    pub price: Decimal,
}

/// Scheme a mapped ISIN resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedScheme {
    pub scheme_code: SchemeCode,
    pub name: String,
}

/// ISIN to scheme-code registry.
///
/// Broker exports speak ISINs, the NAV provider speaks scheme codes, and
/// nothing automates the association: every mapping is registered
/// explicitly and consulted on import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemeMap {
    entries: BTreeMap<Isin, MappedScheme>,
}

impl SchemeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, isin: Isin, scheme_code: SchemeCode, name: impl Into<String>) {
        self.entries.insert(
            isin,
            MappedScheme {
                scheme_code,
                name: name.into(),
            },
        );
    }

    pub fn resolve(&self, isin: &Isin) -> Option<&MappedScheme> {
        self.entries.get(isin)
    }

    /// Like [`Self::resolve`] but an unmapped ISIN is an error.
    pub fn require(&self, isin: &Isin) -> Result<&MappedScheme, EngineError> {
        self.resolve(isin).ok_or_else(|| EngineError::UnmappedFund {
            isin: isin.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Isin, &MappedScheme)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A row skipped because its ISIN has no scheme-code mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmappedTrade {
    pub isin: Isin,
    pub trade_date: NaiveDate,
    pub trade_type: TradeSide,
}

/// Outcome of one import batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Rows applied as new lots.
    pub imported: usize,
    /// Rows skipped as exact duplicates of lots already recorded.
    pub duplicates: usize,
    /// Distinct funds that received new lots.
    pub funds_touched: usize,
    /// Rows skipped for missing ISIN mappings. Reported together so one
    /// pass over the output is enough to fix the registry.
    pub unmapped: Vec<UnmappedTrade>,
}

/// Merge a batch of trade rows into the ledger.
///
/// Mapped rows append as lots. An exact duplicate of a lot already in the
/// ledger, or repeated within the batch, is skipped, so re-importing an
/// overlapping export is a no-op. Rows whose ISIN is unmapped are collected
/// in the report and do not stop the batch.
///
/// Validation is all-or-nothing: a malformed row, or a batch that would
/// drive any fund's held units negative at any date, leaves the ledger
/// untouched and returns `InvalidLot`.
pub fn import_trades(
    ledger: &mut PortfolioLedger,
    map: &SchemeMap,
    rows: &[TradeRow],
) -> Result<ImportReport, EngineError> {
    let mut staged = ledger.clone();
    let mut report = ImportReport::default();
    let mut touched: BTreeSet<SchemeCode> = BTreeSet::new();

    for row in rows {
        let Some(mapped) = map.resolve(&row.isin) else {
            report.unmapped.push(UnmappedTrade {
                isin: row.isin.clone(),
                trade_date: row.trade_date,
                trade_type: row.trade_type,
            });
            continue;
        };

        let lot = Lot::new(row.quantity, row.price, row.trade_date)?;
        let fund = staged.entry(FundIdentity::new(
            mapped.scheme_code,
            row.isin.clone(),
            mapped.name.clone(),
        ));

        if fund.contains(row.trade_type, &lot) {
            report.duplicates += 1;
            continue;
        }

        match row.trade_type {
            TradeSide::Buy => fund.record_purchase(lot),
            TradeSide::Sell => fund.record_sale(lot),
        }
        touched.insert(mapped.scheme_code);
        report.imported += 1;
    }

    // Sales may only consume units bought earlier, checked over the merged
    // history so out-of-order batches cannot sneak an oversell in.
    staged.check_consistency()?;

    report.funds_touched = touched.len();
    *ledger = staged;
    info!(
        imported = report.imported,
        duplicates = report.duplicates,
        unmapped = report.unmapped.len(),
        funds = report.funds_touched,
        "trade batch merged"
    );
    Ok(report)
}
