use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Abstraction over "current time" so date-relative reports are
/// deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The valuation date for "today": everything in the engine works at
    /// end-of-day granularity.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Pin the clock to midnight UTC on `date`. Handy for tests that only
    /// care about the valuation date.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            now: date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}
