//! # roost-report
//!
//! Prints read-side ledger reports as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # Stock position for today (UTC)
//! roost-report snapshot
//!
//! # Profit for one day, and the seven days ending on it
//! roost-report profit 2026-03-14
//! roost-report weekly 2026-03-14
//!
//! # Profit between two days; either bound may be left open
//! roost-report history --from 2026-03-01 --to 2026-03-31
//!
//! # Waste per chicken type and per day
//! roost-report waste 2026-03-08 2026-03-14
//!
//! # Staff cash on hand
//! roost-report cash 2b0f6c1e-8f3e-4f6a-9f5e-3b8c1d2e4f50
//! ```
//!
//! Logs go to stderr (`RUST_LOG` overrides the default filter); the report
//! goes to stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roost_core::DateRange;
use roost_db::Database;

mod config;
mod error;

use crate::config::ReportConfig;
use crate::error::ReportError;

#[derive(Parser)]
#[command(name = "roost-report")]
#[command(author, version, about = "Roost ledger reports")]
struct Cli {
    /// Configuration file (defaults to ./roost.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stock position of one day
    Snapshot {
        /// Day (YYYY-MM-DD), today when omitted
        date: Option<NaiveDate>,
    },
    /// Persisted stock snapshots of the seven days ending on a day
    StockWeek {
        end: Option<NaiveDate>,
    },
    /// Profit of one day
    Profit {
        date: Option<NaiveDate>,
    },
    /// Profit of the seven days ending on a day
    Weekly {
        end: Option<NaiveDate>,
    },
    /// Profit over a range, day by day
    History {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Waste between two days (the last seven days by default)
    Waste {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
    /// Loading totals, optionally for a range
    Loadings {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// Customers who owe money, largest debt first
    Debtors,
    /// Cash collected per staff member
    Collections,
    /// A staff member's cash on hand
    Cash {
        employee_id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<ReportError>() {
            Some(report) => {
                let body = serde_json::to_string(report).unwrap_or_else(|_| report.to_string());
                eprintln!("{body}");
                ExitCode::from(report.exit_code())
            }
            None => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

/// `RUST_LOG` wins; otherwise info, with debug for the ledger crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roost=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ReportConfig::load(cli.config.as_deref()).context("loading configuration")?;
    info!(
        path = %config.database_path.display(),
        tenant_id = %config.tenant_id,
        "Configuration loaded"
    );

    if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating data directory {}", dir.display()))?;
    }

    let db = Database::new(config.db_config()).await.map_err(ReportError::from)?;

    let result = report(&db, cli.command).await;
    db.close().await;

    let body = result?;
    println!("{body}");
    Ok(())
}

async fn report(db: &Database, command: Command) -> Result<String, ReportError> {
    let today = Utc::now().date_naive();

    match command {
        Command::Snapshot { date } => render(&db.stock().snapshot(date.unwrap_or(today)).await?),
        Command::StockWeek { end } => {
            let week = DateRange::week_ending(end.unwrap_or(today));
            render(&db.stock().list(week).await?)
        }
        Command::Profit { date } => render(&db.reports().daily_profit(date.unwrap_or(today)).await?),
        Command::Weekly { end } => render(&db.reports().weekly_profit(end.unwrap_or(today)).await?),
        Command::History { from, to } => render(&db.reports().profit_history(from, to).await?),
        Command::Waste { start, end } => {
            let end = end.unwrap_or(today);
            let range = match start {
                Some(start) => DateRange::new(start, end)?,
                None => DateRange::week_ending(end),
            };
            render(&db.waste().summary(range).await?)
        }
        Command::Loadings { from, to } => {
            let range = from
                .map(|from| DateRange::new(from, to.unwrap_or(today)))
                .transpose()?;
            render(&db.loadings().stats(range).await?)
        }
        Command::Debtors => render(&db.customers().list_debtors().await?),
        Command::Collections => render(&db.payments().employee_collections().await?),
        Command::Cash { employee_id } => render(&db.transfers().cash_position(&employee_id).await?),
    }
}

fn render<T: Serialize>(value: &T) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(value)?)
}
