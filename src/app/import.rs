use std::path::Path;

use anyhow::{Context, Result};

use crate::ledger::{import_trades, TradeRow};
use crate::models::{Isin, SchemeCode};
use crate::storage::LedgerStore;

use super::{ImportOutput, MapFundOutput, UnmappedTradeOutput};

/// Parse a broker trade export (a JSON array of trade rows) and merge it
/// into the user's ledger. Re-importing an overlapping export is a no-op.
pub async fn import_trades_file(
    store: &dyn LedgerStore,
    user: &str,
    file: &Path,
) -> Result<ImportOutput> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;
    let rows: Vec<TradeRow> = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse trade export: {}", file.display()))?;

    let map = store.load_scheme_map().await?.unwrap_or_default();
    let mut ledger = store.load_ledger(user).await?.unwrap_or_default();

    let report = import_trades(&mut ledger, &map, &rows)?;
    if report.imported > 0 {
        store.save_ledger(user, &ledger).await?;
    }

    Ok(ImportOutput {
        user: user.to_string(),
        imported: report.imported,
        duplicates: report.duplicates,
        funds_touched: report.funds_touched,
        total_funds: ledger.len(),
        unmapped: report
            .unmapped
            .iter()
            .map(|trade| UnmappedTradeOutput {
                isin: trade.isin.to_string(),
                trade_date: trade.trade_date.to_string(),
                trade_type: trade.trade_type.as_str().to_string(),
            })
            .collect(),
    })
}

/// Register (or overwrite) the scheme mapping for one ISIN. Imports only
/// apply rows whose ISIN is mapped, so this is the first step for a new
/// fund.
pub async fn map_fund(
    store: &dyn LedgerStore,
    isin: &str,
    scheme_code: u32,
    name: &str,
) -> Result<MapFundOutput> {
    let isin = Isin::new(isin)?;
    let mut map = store.load_scheme_map().await?.unwrap_or_default();
    map.insert(isin.clone(), SchemeCode::new(scheme_code), name);
    store.save_scheme_map(&map).await?;

    Ok(MapFundOutput {
        isin: isin.to_string(),
        scheme_code,
        name: name.to_string(),
        total_mappings: map.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLedgerStore;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_export(dir: &TempDir, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join("trades.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    const EXPORT: &str = r#"[
        {
            "isin": "INF209K01VD3",
            "trade_date": "2024-01-01",
            "trade_type": "buy",
            "quantity": "100",
            "price": "10"
        },
        {
            "isin": "INF846K01EW2",
            "trade_date": "2024-01-02",
            "trade_type": "buy",
            "quantity": "50",
            "price": "20"
        }
    ]"#;

    #[tokio::test]
    async fn test_import_applies_mapped_rows_and_reports_unmapped() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, EXPORT);
        let store = MemoryLedgerStore::new();
        map_fund(&store, "INF209K01VD3", 120503, "Growth Fund")
            .await
            .unwrap();

        let output = import_trades_file(&store, "alice", &path).await.unwrap();
        assert_eq!(output.imported, 1);
        assert_eq!(output.duplicates, 0);
        assert_eq!(output.total_funds, 1);
        assert_eq!(output.unmapped.len(), 1);
        assert_eq!(output.unmapped[0].isin, "INF846K01EW2");
        assert_eq!(output.unmapped[0].trade_type, "buy");

        let ledger = store.load_ledger("alice").await.unwrap().unwrap();
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, EXPORT);
        let store = MemoryLedgerStore::new();
        map_fund(&store, "INF209K01VD3", 120503, "Growth Fund")
            .await
            .unwrap();

        import_trades_file(&store, "alice", &path).await.unwrap();
        let second = import_trades_file(&store, "alice", &path).await.unwrap();
        assert_eq!(second.imported, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(second.funds_touched, 0);
    }

    #[tokio::test]
    async fn test_map_fund_overwrites_and_counts() {
        let store = MemoryLedgerStore::new();
        let first = map_fund(&store, "inf209k01vd3", 120503, "Growth Fund")
            .await
            .unwrap();
        assert_eq!(first.isin, "INF209K01VD3");
        assert_eq!(first.total_mappings, 1);

        let second = map_fund(&store, "INF209K01VD3", 120504, "Growth Fund Direct")
            .await
            .unwrap();
        assert_eq!(second.total_mappings, 1);

        let map = store.load_scheme_map().await.unwrap().unwrap();
        let mapped = map.resolve(&Isin::new("INF209K01VD3").unwrap()).unwrap();
        assert_eq!(mapped.scheme_code, SchemeCode::new(120504));
    }

    #[tokio::test]
    async fn test_invalid_isin_is_rejected() {
        let store = MemoryLedgerStore::new();
        assert!(map_fund(&store, "bad isin", 1, "Fund").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_file_errors_with_path() {
        let store = MemoryLedgerStore::new();
        let err = import_trades_file(&store, "alice", Path::new("/no/such/file.json"))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/file.json"));
    }
}
