use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

/// A single buy or sell event: unit count, per-unit NAV at execution, and
/// the trade date.
///
/// Lots are immutable once recorded. Corrections happen by appending new
/// lots, never by editing history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lot {
    pub units: Decimal,
    pub average_nav: Decimal,
    pub date: NaiveDate,
}

impl Lot {
    /// Build a lot, rejecting non-positive units or NAV.
    pub fn new(units: Decimal, average_nav: Decimal, date: NaiveDate) -> Result<Self, EngineError> {
        if units <= Decimal::ZERO {
            return Err(EngineError::InvalidLot {
                reason: format!("units must be positive, got {units} on {date}"),
            });
        }
        if average_nav <= Decimal::ZERO {
            return Err(EngineError::InvalidLot {
                reason: format!("average NAV must be positive, got {average_nav} on {date}"),
            });
        }
        Ok(Self {
            units,
            average_nav,
            date,
        })
    }

    /// Capital moved by this lot: units times per-unit NAV.
    pub fn amount(&self) -> Decimal {
        self.units * self.average_nav
    }
}
