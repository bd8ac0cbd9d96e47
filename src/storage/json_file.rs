use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tokio::fs;

use super::LedgerStore;
use crate::ledger::SchemeMap;
use crate::models::PortfolioLedger;

/// JSON file-based ledger storage.
///
/// Directory structure:
/// ```text
/// data/
///   scheme_map.json
///   users/
///     {user}/
///       ledger.json
/// ```
///
/// NAV shards live under `data/navs/` and are owned by the NAV store, not
/// this one.
pub struct JsonFileLedgerStore {
    base_path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn scheme_map_file(&self) -> PathBuf {
        self.base_path.join("scheme_map.json")
    }

    fn ledger_file(&self, user: &str) -> Result<PathBuf> {
        if !is_path_safe(user) {
            bail!("user name {user:?} is not usable as a directory name");
        }
        Ok(self.base_path.join("users").join(user).join("ledger.json"))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_json<T: for<'de> serde::Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        match fs::read_to_string(path).await {
            Ok(content) => {
                let value = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse JSON from {:?}", path))?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context("Failed to read file"),
        }
    }

    async fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        self.ensure_dir(path).await?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
        fs::write(path, content)
            .await
            .context("Failed to write file")?;
        Ok(())
    }
}

/// Returns true if the string is safe to use as a single path segment.
fn is_path_safe(value: &str) -> bool {
    if value.is_empty() || value == "." || value == ".." {
        return false;
    }
    !value.chars().any(|c| c == '/' || c == '\\' || c == '\0')
}

#[async_trait::async_trait]
impl LedgerStore for JsonFileLedgerStore {
    async fn load_ledger(&self, user: &str) -> Result<Option<PortfolioLedger>> {
        self.read_json(&self.ledger_file(user)?).await
    }

    async fn save_ledger(&self, user: &str, ledger: &PortfolioLedger) -> Result<()> {
        self.write_json(&self.ledger_file(user)?, ledger).await
    }

    async fn load_scheme_map(&self) -> Result<Option<SchemeMap>> {
        self.read_json(&self.scheme_map_file()).await
    }

    async fn save_scheme_map(&self, map: &SchemeMap) -> Result<()> {
        self.write_json(&self.scheme_map_file(), map).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FundIdentity, Isin, Lot, SchemeCode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_ledger() -> PortfolioLedger {
        let mut ledger = PortfolioLedger::new();
        let fund = FundIdentity::new(
            SchemeCode::new(120503),
            Isin::new("INF209K01VD3").unwrap(),
            "Axis Bluechip Fund",
        );
        ledger.entry(fund).record_purchase(
            Lot::new(
                dec!(104.897),
                dec!(47.6659),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            )
            .unwrap(),
        );
        ledger
    }

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::new(dir.path());

        let ledger = sample_ledger();
        store.save_ledger("alice", &ledger).await.unwrap();

        let loaded = store.load_ledger("alice").await.unwrap().unwrap();
        assert_eq!(loaded, ledger);
    }

    #[tokio::test]
    async fn test_missing_ledger_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::new(dir.path());

        assert!(store.load_ledger("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::new(dir.path());

        store.save_ledger("alice", &sample_ledger()).await.unwrap();
        assert!(store.load_ledger("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsafe_user_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::new(dir.path());

        for user in ["", ".", "..", "a/b", "a\\b"] {
            assert!(
                store.save_ledger(user, &sample_ledger()).await.is_err(),
                "user {user:?} should have been rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_scheme_map_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileLedgerStore::new(dir.path());

        assert!(store.load_scheme_map().await.unwrap().is_none());

        let mut map = SchemeMap::new();
        map.insert(
            Isin::new("INF209K01VD3").unwrap(),
            SchemeCode::new(120503),
            "Axis Bluechip Fund",
        );
        store.save_scheme_map(&map).await.unwrap();

        let loaded = store.load_scheme_map().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded
                .resolve(&Isin::new("INF209K01VD3").unwrap())
                .unwrap()
                .scheme_code,
            SchemeCode::new(120503)
        );
    }
}
