// src/storage/memory.rs
//! In-memory storage implementation for testing.

use std::collections::HashMap;

use anyhow::Result;
use tokio::sync::Mutex;

use super::LedgerStore;
use crate::ledger::SchemeMap;
use crate::models::PortfolioLedger;

/// In-memory ledger storage for testing purposes.
pub struct MemoryLedgerStore {
    ledgers: Mutex<HashMap<String, PortfolioLedger>>,
    scheme_map: Mutex<Option<SchemeMap>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            ledgers: Mutex::new(HashMap::new()),
            scheme_map: Mutex::new(None),
        }
    }
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn load_ledger(&self, user: &str) -> Result<Option<PortfolioLedger>> {
        let ledgers = self.ledgers.lock().await;
        Ok(ledgers.get(user).cloned())
    }

    async fn save_ledger(&self, user: &str, ledger: &PortfolioLedger) -> Result<()> {
        let mut ledgers = self.ledgers.lock().await;
        ledgers.insert(user.to_string(), ledger.clone());
        Ok(())
    }

    async fn load_scheme_map(&self) -> Result<Option<SchemeMap>> {
        let map = self.scheme_map.lock().await;
        Ok(map.clone())
    }

    async fn save_scheme_map(&self, map: &SchemeMap) -> Result<()> {
        let mut stored = self.scheme_map.lock().await;
        *stored = Some(map.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundIdentity, Isin, Lot, SchemeCode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_save_then_load_per_user() {
        let store = MemoryLedgerStore::new();
        assert!(store.load_ledger("alice").await.unwrap().is_none());

        let mut ledger = PortfolioLedger::new();
        ledger
            .entry(FundIdentity::new(
                SchemeCode::new(120503),
                Isin::new("INF209K01VD3").unwrap(),
                "Axis Bluechip Fund",
            ))
            .record_purchase(
                Lot::new(
                    dec!(10),
                    dec!(47.5),
                    NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                )
                .unwrap(),
            );
        store.save_ledger("alice", &ledger).await.unwrap();

        assert_eq!(store.load_ledger("alice").await.unwrap(), Some(ledger));
        assert!(store.load_ledger("bob").await.unwrap().is_none());
    }
}
