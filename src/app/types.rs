use serde::Serialize;

/// JSON output for the `import` command.
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub user: String,
    pub imported: usize,
    pub duplicates: usize,
    pub funds_touched: usize,
    pub total_funds: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unmapped: Vec<UnmappedTradeOutput>,
}

/// A trade row skipped for a missing ISIN mapping.
#[derive(Debug, Serialize)]
pub struct UnmappedTradeOutput {
    pub isin: String,
    pub trade_date: String,
    pub trade_type: String,
}

/// JSON output for the `map-fund` command.
#[derive(Serialize)]
pub struct MapFundOutput {
    pub isin: String,
    pub scheme_code: u32,
    pub name: String,
    pub total_mappings: usize,
}

/// One fund position in the holdings table.
#[derive(Debug, Serialize)]
pub struct HoldingRow {
    pub scheme_code: u32,
    pub isin: String,
    pub name: String,
    pub units: String,
    pub invested: String,
}

/// JSON output for the `holdings` command.
#[derive(Debug, Serialize)]
pub struct HoldingsOutput {
    pub user: String,
    pub date: String,
    pub funds: Vec<HoldingRow>,
    pub total_invested: String,
}

/// One look-back row of the summary table.
#[derive(Serialize)]
pub struct SummaryRow {
    pub period: String,
    pub date: String,
    pub invested: String,
    pub current_value: String,
    pub pnl: String,
    pub pnl_pct: String,
    pub pnl_change: String,
    pub pnl_change_pct: String,
}

/// JSON output for the `summary` command.
#[derive(Serialize)]
pub struct SummaryOutput {
    pub user: String,
    pub date: String,
    pub rows: Vec<SummaryRow>,
}

/// Scope a history report ranges over.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScopeOutput {
    Portfolio,
    Fund { scheme_code: u32, name: String },
}

/// A single point in the valuation history.
#[derive(Debug, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    pub invested: String,
    pub current_value: String,
    pub pnl: String,
    pub pnl_pct: String,
}

/// JSON output for the `history` command.
#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    pub user: String,
    pub scope: ScopeOutput,
    pub granularity: String,
    pub start_date: String,
    pub end_date: String,
    pub points: Vec<HistoryPoint>,
}

/// One cell of the pivot matrix. The marker keeps "fund did not exist yet"
/// distinct from a zero.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PivotCellOutput {
    Value { value: String },
    NotYetInvested,
}

/// One fund row of the pivot matrix.
#[derive(Serialize)]
pub struct PivotRowOutput {
    pub scheme_code: u32,
    pub name: String,
    pub cells: Vec<PivotCellOutput>,
}

/// JSON output for the `pivot` command.
#[derive(Serialize)]
pub struct PivotOutput {
    pub user: String,
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub dates: Vec<String>,
    pub rows: Vec<PivotRowOutput>,
}

/// Per-scheme outcome of a NAV refresh.
#[derive(Serialize)]
pub struct SchemeRefreshOutput {
    pub scheme_code: u32,
    pub name: String,
    pub status: String,
    pub added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// JSON output for the `refresh-navs` command.
#[derive(Serialize)]
pub struct RefreshOutput {
    pub user: String,
    pub through: String,
    pub schemes: Vec<SchemeRefreshOutput>,
    pub failed_count: usize,
}
