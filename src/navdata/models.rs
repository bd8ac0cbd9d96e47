use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::SchemeCode;

/// One end-of-day NAV observation for a fund scheme.
///
/// A `(scheme_code, date)` pair is a fixed historical record: once a value
/// is cached for it, stores never replace it with a different one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPoint {
    pub scheme_code: SchemeCode,
    pub date: NaiveDate,
    pub nav: Decimal,
    /// Which source produced this point.
    pub source: String,
    /// When the point was fetched from the source.
    pub fetched_at: DateTime<Utc>,
}

impl NavPoint {
    pub fn new(
        scheme_code: SchemeCode,
        date: NaiveDate,
        nav: Decimal,
        source: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scheme_code,
            date,
            nav,
            source: source.into(),
            fetched_at,
        }
    }
}
