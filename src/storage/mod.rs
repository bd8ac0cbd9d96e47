mod json_file;
mod memory;

pub use json_file::JsonFileLedgerStore;
pub use memory::MemoryLedgerStore;

use anyhow::Result;

use crate::ledger::SchemeMap;
use crate::models::PortfolioLedger;

/// Storage trait for persisting ledgers and the ISIN-to-scheme mapping.
///
/// Ledgers are stored whole: they are small (one document per user) and
/// every read recomputes holdings from scratch anyway.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn load_ledger(&self, user: &str) -> Result<Option<PortfolioLedger>>;
    async fn save_ledger(&self, user: &str, ledger: &PortfolioLedger) -> Result<()>;

    // The scheme map is shared across users; broker exports name funds by
    // ISIN no matter whose account they came from.
    async fn load_scheme_map(&self) -> Result<Option<SchemeMap>>;
    async fn save_scheme_map(&self, map: &SchemeMap) -> Result<()>;
}
