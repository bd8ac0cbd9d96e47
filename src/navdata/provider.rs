use anyhow::Result;

use super::NavPoint;
use crate::models::SchemeCode;

/// External source of NAV history.
///
/// Mutual fund APIs publish the whole history for a scheme in one response,
/// so the contract is fetch-everything; the store decides which dates are
/// actually new.
#[async_trait::async_trait]
pub trait NavSource: Send + Sync {
    /// Full published NAV history for the scheme, date-ascending. An empty
    /// vector means the source knows nothing about the scheme.
    async fn fetch_history(&self, scheme: SchemeCode) -> Result<Vec<NavPoint>>;

    fn name(&self) -> &str;
}

pub struct NoopNavSource;

#[async_trait::async_trait]
impl NavSource for NoopNavSource {
    async fn fetch_history(&self, _scheme: SchemeCode) -> Result<Vec<NavPoint>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "noop"
    }
}
