// tests/cli_json_output.rs
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

const TRADES: &str = r#"[
    {"isin": "INF209K01VD3", "trade_date": "2024-01-01", "trade_type": "buy", "quantity": "100", "price": "10"},
    {"isin": "INF209K01VD3", "trade_date": "2024-01-10", "trade_type": "buy", "quantity": "50", "price": "12"}
]"#;

fn write_config(dir: &Path) -> Result<PathBuf> {
    let config_path = dir.join("fundbook.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
data_dir = "{}"
user = "alice"
"#,
            dir.display()
        ),
    )?;
    Ok(config_path)
}

fn fundbook(config: &Path, args: &[&str]) -> Result<Output> {
    let output = Command::new(env!("CARGO_BIN_EXE_fundbook"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()?;
    Ok(output)
}

fn json_stdout(output: &Output) -> Result<serde_json::Value> {
    assert!(output.status.success(), "Command failed: {output:?}");
    let stdout = String::from_utf8(output.stdout.clone())?;
    Ok(serde_json::from_str(&stdout)?)
}

#[test]
fn map_import_holdings_round_trip() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path())?;

    let mapped = json_stdout(&fundbook(
        &config,
        &["map-fund", "INF209K01VD3", "120503", "Axis Bluechip Fund"],
    )?)?;
    assert_eq!(mapped["scheme_code"], 120503);
    assert_eq!(mapped["total_mappings"], 1);

    let trades = temp.path().join("trades.json");
    std::fs::write(&trades, TRADES)?;
    let imported = json_stdout(&fundbook(&config, &["import", trades.to_str().unwrap()])?)?;
    assert_eq!(imported["user"], "alice");
    assert_eq!(imported["imported"], 2);
    assert_eq!(imported["total_funds"], 1);

    let holdings = json_stdout(&fundbook(&config, &["holdings", "--date", "2024-01-15"])?)?;
    assert_eq!(holdings["user"], "alice");
    assert_eq!(holdings["date"], "2024-01-15");
    assert_eq!(holdings["funds"][0]["scheme_code"], 120503);
    assert_eq!(holdings["funds"][0]["units"], "150");
    assert_eq!(holdings["total_invested"], "1600");
    Ok(())
}

#[test]
fn import_reports_unmapped_rows_without_failing() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path())?;
    let trades = temp.path().join("trades.json");
    std::fs::write(&trades, TRADES)?;

    let imported = json_stdout(&fundbook(&config, &["import", trades.to_str().unwrap()])?)?;
    assert_eq!(imported["imported"], 0);
    assert_eq!(imported["unmapped"][0]["isin"], "INF209K01VD3");
    assert_eq!(imported["unmapped"][0]["trade_type"], "buy");
    Ok(())
}

#[test]
fn user_flag_overrides_the_config_user() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path())?;
    let trades = temp.path().join("trades.json");
    std::fs::write(&trades, TRADES)?;

    fundbook(
        &config,
        &["map-fund", "INF209K01VD3", "120503", "Axis Bluechip Fund"],
    )?;
    let imported = json_stdout(&fundbook(
        &config,
        &["--user", "bob", "import", trades.to_str().unwrap()],
    )?)?;
    assert_eq!(imported["user"], "bob");

    // The config user never saw those trades.
    let holdings = json_stdout(&fundbook(
        &config,
        &["--user", "bob", "holdings", "--date", "2024-01-15"],
    )?)?;
    assert_eq!(holdings["funds"][0]["units"], "150");

    let for_alice = fundbook(&config, &["holdings", "--date", "2024-01-15"])?;
    assert!(!for_alice.status.success());
    Ok(())
}

#[test]
fn holdings_without_any_trades_fails_with_an_explanation() -> Result<()> {
    let temp = TempDir::new()?;
    let config = write_config(temp.path())?;

    let output = fundbook(&config, &["holdings"])?;
    assert!(!output.status.success());

    let stderr = String::from_utf8(output.stderr)?;
    assert!(
        stderr.contains("No trades recorded"),
        "unexpected stderr: {stderr}"
    );
    Ok(())
}
