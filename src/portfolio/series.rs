//! Calendar resampling for valuation time series.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};

use super::SeriesPoint;
use crate::error::EngineError;

/// Calendar granularity for a resampled valuation series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Keep every day.
    Daily,
    /// One row per ISO week.
    Weekly,
    /// One row per calendar month.
    Monthly,
    /// One row per calendar year.
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
            Granularity::Yearly => "yearly",
        }
    }
}

impl FromStr for Granularity {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "daily" => Ok(Granularity::Daily),
            "weekly" => Ok(Granularity::Weekly),
            "monthly" => Ok(Granularity::Monthly),
            "yearly" | "annual" => Ok(Granularity::Yearly),
            other => Err(EngineError::invalid_request(format!(
                "unknown granularity {other:?}: expected daily, weekly, monthly, or yearly"
            ))),
        }
    }
}

/// Bucket key for calendar granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum BucketKey {
    /// ISO week (iso year, week number). Weeks run Monday through Sunday.
    Week(i32, u32),
    /// Calendar month (year, month).
    Month(i32, u32),
    /// Calendar year.
    Year(i32),
}

fn bucket_key(date: NaiveDate, granularity: Granularity) -> BucketKey {
    match granularity {
        Granularity::Daily => unreachable!("daily series are returned unchanged"),
        Granularity::Weekly => {
            let week = date.iso_week();
            BucketKey::Week(week.year(), week.week())
        }
        Granularity::Monthly => BucketKey::Month(date.year(), date.month()),
        Granularity::Yearly => BucketKey::Year(date.year()),
    }
}

/// Resample a date-ascending daily series by keeping the last row of each
/// calendar bucket.
///
/// Every output row is one of the input rows (period-end semantics); values
/// are never interpolated or averaged, so a monthly row equals the direct
/// valuation at that month's last series date. `Daily` returns the input
/// unchanged.
pub fn resample(series: Vec<SeriesPoint>, granularity: Granularity) -> Vec<SeriesPoint> {
    if matches!(granularity, Granularity::Daily) {
        return series;
    }

    let mut buckets: BTreeMap<BucketKey, SeriesPoint> = BTreeMap::new();
    for point in series {
        // Ascending input: a later insert replaces the earlier row, leaving
        // the bucket's last day.
        buckets.insert(bucket_key(point.date, granularity), point);
    }

    buckets.into_values().collect()
}
