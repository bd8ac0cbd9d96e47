use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fundbook::app;
use fundbook::clock::{Clock, SystemClock};
use fundbook::config::{default_config_path, ResolvedConfig};
use fundbook::portfolio::{Granularity, PivotMetric, PortfolioService};
use fundbook::storage::JsonFileLedgerStore;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fundbook")]
#[command(about = "Mutual fund portfolio tracker")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Ledger user to act on (defaults to the configured user)
    #[arg(short, long)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a broker trade export (JSON) into the ledger
    Import {
        /// Path to the trade export file
        file: PathBuf,
    },
    /// Register an ISIN to scheme-code mapping used by imports
    MapFund {
        isin: String,
        scheme_code: u32,
        name: String,
    },
    /// Show per-fund units and invested capital
    Holdings {
        /// Valuation date (defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// PnL at the latest valued date against a ladder of earlier dates
    Summary {
        /// Extra look-back windows in days, comma separated
        #[arg(long, value_delimiter = ',')]
        extra_days: Vec<i64>,
    },
    /// Valuation history for the portfolio or one fund
    History {
        /// Scheme code; the whole portfolio when omitted
        #[arg(long)]
        fund: Option<u32>,

        /// daily, weekly, monthly, or yearly
        #[arg(long, default_value = "daily")]
        granularity: String,

        /// First date of the series (defaults to the first purchase)
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last date of the series (defaults to today)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Fund-by-date PnL matrix over recent days
    Pivot {
        /// Number of most recent days to include
        #[arg(long)]
        days: Option<usize>,

        /// Explicit column dates, comma separated (overrides --days)
        #[arg(long, value_delimiter = ',')]
        dates: Vec<NaiveDate>,

        /// pnl or pnl-pct
        #[arg(long, default_value = "pnl")]
        metric: String,

        /// Rebase cells against this date
        #[arg(long)]
        reference: Option<NaiveDate>,
    },
    /// Top up the NAV cache for every fund in the ledger
    RefreshNavs,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries nothing but the JSON document.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    let user = cli.user.unwrap_or_else(|| config.user.clone());

    let store = JsonFileLedgerStore::new(&config.data_dir);
    let navs = app::build_nav_service(&config);
    let portfolio = PortfolioService::new(navs.clone());
    let today = SystemClock.today();

    let output = match cli.command {
        Command::Import { file } => {
            serde_json::to_value(app::import_trades_file(&store, &user, &file).await?)?
        }
        Command::MapFund {
            isin,
            scheme_code,
            name,
        } => serde_json::to_value(app::map_fund(&store, &isin, scheme_code, &name).await?)?,
        Command::Holdings { date } => serde_json::to_value(
            app::holdings_report(&store, &portfolio, &user, date.unwrap_or(today)).await?,
        )?,
        Command::Summary { extra_days } => serde_json::to_value(
            app::summary_report(&store, &portfolio, &user, today, &extra_days).await?,
        )?,
        Command::History {
            fund,
            granularity,
            start,
            end,
        } => {
            let granularity: Granularity = granularity.parse()?;
            serde_json::to_value(
                app::history_report(app::HistoryReportRequest {
                    store: &store,
                    portfolio: &portfolio,
                    user: &user,
                    today,
                    fund,
                    granularity,
                    start,
                    end,
                })
                .await?,
            )?
        }
        Command::Pivot {
            days,
            dates,
            metric,
            reference,
        } => {
            let metric: PivotMetric = metric.parse()?;
            serde_json::to_value(
                app::pivot_report(app::PivotReportRequest {
                    store: &store,
                    portfolio: &portfolio,
                    user: &user,
                    today,
                    default_days: config.pivot.days,
                    days,
                    dates,
                    metric,
                    reference,
                })
                .await?,
            )?
        }
        Command::RefreshNavs => {
            serde_json::to_value(app::refresh_navs(&store, &navs, &user, today).await?)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
