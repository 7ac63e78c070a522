//! fee-report CLI - Enterprise fee and tax reports over a SQLite ledger
//!
//! Usage:
//!   fee-report init [--db <path>]
//!   fee-report import [--db <path>] <dataset.json>
//!   fee-report run [--db <path>] [--from <date>] [--to <date>] [filters...]
//!
//! Examples:
//!   fee-report import --db ledger.db march.json
//!   fee-report run --db ledger.db --from 2024-03-01 --to 2024-03-31 --format json
//!   fee-report run --distributor 3 --producer 7 --no-summary

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fee_report::config::Settings;
use fee_report::model::{Dataset, EnterpriseFeeId, EnterpriseId, OrderCycleId};
use fee_report::pipeline::{run_report, ReportOptions};
use fee_report::report::{render, OutputFormat};
use fee_report::store::{AllowAll, ReportFilters, SqliteStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fee-report")]
#[command(about = "fee-report - Enterprise fee and tax reports by producer")]
#[command(version)]
struct Cli {
    /// Path to a config file (overrides the default search)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty ledger database
    Init {
        /// Ledger database path (defaults to the configured ledger)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Load a JSON dataset into the ledger
    Import {
        /// Path to the dataset JSON file
        file: PathBuf,

        /// Ledger database path (defaults to the configured ledger)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Run the enterprise fee report
    Run {
        /// Ledger database path (defaults to the configured ledger)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Earliest completion date (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_start)]
        from: Option<DateTime<Utc>>,

        /// Latest completion date, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long, value_parser = parse_end)]
        to: Option<DateTime<Utc>>,

        /// Distributor enterprise ids
        #[arg(long = "distributor")]
        distributors: Vec<i64>,

        /// Order cycle ids
        #[arg(long = "order-cycle")]
        order_cycles: Vec<i64>,

        /// Producer (supplier) enterprise ids
        #[arg(long = "producer")]
        producers: Vec<i64>,

        /// Enterprise fee ids
        #[arg(long = "fee")]
        fees: Vec<i64>,

        /// Fee owner enterprise ids
        #[arg(long = "fee-owner")]
        fee_owners: Vec<i64>,

        /// Omit distributor, producer and order cycle summary rows
        #[arg(long)]
        no_summary: bool,

        /// Output format (defaults to the configured format)
        #[arg(short, long)]
        format: Option<FormatArg>,
    },
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&settings.logging.filter);

    match cli.command {
        Commands::Init { db } => cmd_init(&settings, db),
        Commands::Import { file, db } => cmd_import(&settings, file, db),
        Commands::Run {
            db,
            from,
            to,
            distributors,
            order_cycles,
            producers,
            fees,
            fee_owners,
            no_summary,
            format,
        } => {
            let filters = ReportFilters {
                start_at: from,
                end_at: to,
                distributor_ids: distributors.into_iter().map(EnterpriseId).collect(),
                order_cycle_ids: order_cycles.into_iter().map(OrderCycleId).collect(),
                producer_ids: producers.into_iter().map(EnterpriseId).collect(),
                enterprise_fee_ids: fees.into_iter().map(EnterpriseFeeId).collect(),
                fee_owner_ids: fee_owners.into_iter().map(EnterpriseId).collect(),
            };
            let options = ReportOptions::default()
                .with_summary_rows(settings.report.summary_rows && !no_summary);
            let format = format.map(Into::into).unwrap_or(settings.report.format);
            cmd_run(&settings, db, &filters, &options, format)
        }
    }
}

/// `FEE_REPORT_LOG` wins over the configured filter. Logs go to stderr so
/// report output on stdout stays clean.
fn init_tracing(configured: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FEE_REPORT_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(configured))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_store(settings: &Settings, db: Option<PathBuf>) -> Result<SqliteStore, String> {
    let path = match db {
        Some(path) => path,
        None => match settings.ledger.resolved_path() {
            Ok(Some(path)) => path,
            Ok(None) => SqliteStore::default_path().map_err(|e| e.to_string())?,
            Err(e) => return Err(e.to_string()),
        },
    };

    SqliteStore::open(&path).map_err(|e| format!("Error opening ledger '{}': {}", path.display(), e))
}

fn cmd_init(settings: &Settings, db: Option<PathBuf>) -> ExitCode {
    match open_store(settings, db) {
        Ok(_) => {
            println!("Ledger ready");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_import(settings: &Settings, file: PathBuf, db: Option<PathBuf>) -> ExitCode {
    let dataset = match Dataset::from_file(&file) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading dataset '{}': {}", file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut store = match open_store(settings, db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match store.import(&dataset) {
        Ok(()) => {
            println!(
                "Imported {} orders ({} adjustments)",
                dataset.orders.len(),
                dataset.adjustment_count()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Import error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(
    settings: &Settings,
    db: Option<PathBuf>,
    filters: &ReportFilters,
    options: &ReportOptions,
    format: OutputFormat,
) -> ExitCode {
    let store = match open_store(settings, db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_report(&store, filters, &AllowAll, options) {
        Ok(output) => {
            println!("{}", render(&output, format));
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Report error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_start(s: &str) -> Result<DateTime<Utc>, String> {
    parse_date(s, NaiveTime::MIN)
}

fn parse_end(s: &str) -> Result<DateTime<Utc>, String> {
    let end_of_day = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
        .ok_or_else(|| "invalid end of day".to_string())?;
    parse_date(s, end_of_day)
}

/// Accept RFC 3339 timestamps or bare dates at the given time of day (UTC).
fn parse_date(s: &str, time: NaiveTime) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(time).and_utc())
        .map_err(|e| format!("invalid date '{}': {}", s, e))
}
