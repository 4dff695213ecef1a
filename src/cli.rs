//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::system_clock::SystemClock;
use crate::domain::config::EngineConfig;
use crate::domain::decision::{combined_pressure, decide, Action, NEUTRAL_PRESSURE};
use crate::domain::engine::{EngineSummary, PositionEngine, TickOutcome};
use crate::domain::error::SpitraderError;
use crate::domain::ledger::{events_after_log, TradeMode};
use crate::domain::manual::ManualTradeLog;
use crate::domain::report::{summarize, DailySummary};
use crate::domain::sentiment::SentimentScorer;
use crate::domain::tick::Tick;
use crate::ports::clock_port::ClockPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::news_port::NewsPort;
use crate::ports::report_port::ReportStore;
use crate::ports::tick_port::TickPort;

#[derive(Parser, Debug)]
#[command(name = "spitrader", about = "Flow/sentiment pressure signal engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate an engine configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the action for a flow pressure and SPI pair
    Decide {
        #[arg(long)]
        flow: Option<f64>,
        #[arg(long)]
        spi: Option<f64>,
    },
    /// Score a symbol's news into an SPI
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
    },
    /// Replay ticks through the position engine
    Run {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Record an operator trade
    Record {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        action: Action,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        flow: Option<f64>,
        #[arg(long)]
        spi: Option<f64>,
    },
    /// Summarize today's trade logs and persist the report
    Report {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Ledger and report store behind one handle.
pub trait Storage: LedgerPort + ReportStore {}

impl<T: LedgerPort + ReportStore> Storage for T {}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Validate { config } => run_validate(&config),
        Command::Decide { flow, spi } => {
            run_decide(flow, spi);
            Ok(())
        }
        Command::Score { config, symbol } => run_score(&config, &symbol),
        Command::Run { config } => run_engine(&config),
        Command::Record {
            config,
            symbol,
            action,
            price,
            flow,
            spi,
        } => run_record(&config, &symbol, action, price, flow, spi),
        Command::Report { config } => run_report(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn data_dir(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        config
            .get_string("data", "dir")
            .unwrap_or_else(|| ".".to_string()),
    )
}

/// Ledger and report store selected by `[report] store`.
pub fn open_storage(config: &dyn ConfigPort) -> Result<Box<dyn Storage>, SpitraderError> {
    let store = config
        .get_string("report", "store")
        .unwrap_or_else(|| "csv".to_string());
    match store.to_lowercase().as_str() {
        "csv" => Ok(Box::new(CsvAdapter::new(data_dir(config)))),
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Box::new(
            crate::adapters::sqlite_adapter::SqliteAdapter::from_config(config)?,
        )),
        other => Err(SpitraderError::ConfigInvalid {
            section: "report".into(),
            key: "store".into(),
            reason: format!("unsupported store '{other}'"),
        }),
    }
}

pub fn run_validate(config_path: &PathBuf) -> Result<(), SpitraderError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let config = EngineConfig::from_config(&adapter)?;
    open_storage(&adapter)?;
    eprintln!("Configuration valid: {}", config_path.display());
    eprintln!(
        "  capital {:.2}, entry > {}, exit < {}, tp {}, sl {}, hold {}s",
        config.capital,
        config.entry_threshold,
        config.exit_threshold,
        config.take_profit_pct,
        config.stop_loss_pct,
        config.hold_time_sec,
    );
    Ok(())
}

fn run_decide(flow: Option<f64>, spi: Option<f64>) {
    let flow = flow.unwrap_or(NEUTRAL_PRESSURE);
    let spi = spi.unwrap_or(NEUTRAL_PRESSURE);
    println!(
        "combined {:.2} -> {}",
        combined_pressure(flow, spi),
        decide(flow, spi)
    );
}

pub fn run_score(config_path: &PathBuf, symbol: &str) -> Result<(), SpitraderError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let news = CsvAdapter::new(data_dir(&adapter));
    let scorer = SentimentScorer::new(Arc::new(SystemClock));
    let record = scorer.score_from(&news, symbol);
    println!("{} spi {:.2} ({})", record.symbol, record.spi, record.label);
    Ok(())
}

/// Feeds `ticks` through `engine` in order. Ticks with malformed prices are
/// skipped; any other error stops the replay.
pub fn replay_ticks(engine: &mut PositionEngine, ticks: &[Tick]) -> Result<usize, SpitraderError> {
    let mut transitions = 0;
    for tick in ticks {
        match engine.apply(tick) {
            Ok(TickOutcome::Opened(_) | TickOutcome::Closed(_)) => transitions += 1,
            Ok(TickOutcome::Held | TickOutcome::Idle) => {}
            Err(SpitraderError::DataFormat { reason }) => {
                warn!(symbol = %tick.symbol, %reason, "skipping tick");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(transitions)
}

/// Per-symbol suggestion from the last flow reading and the symbol's news.
/// `watchlist` symbols without ticks are scored at neutral flow.
pub fn suggestions(
    ticks: &[Tick],
    watchlist: &[String],
    news: &dyn NewsPort,
    scorer: &SentimentScorer,
) -> BTreeMap<String, (f64, Action)> {
    let mut last_flow: BTreeMap<String, Option<f64>> = watchlist
        .iter()
        .map(|symbol| (symbol.clone(), None))
        .collect();
    for tick in ticks {
        last_flow.insert(tick.symbol.clone(), tick.flow_pressure);
    }
    last_flow
        .into_iter()
        .map(|(symbol, flow)| {
            let spi = scorer.score_from(news, &symbol).spi;
            let action = decide(flow.unwrap_or(NEUTRAL_PRESSURE), spi);
            (symbol, (spi, action))
        })
        .collect()
}

pub fn run_engine(config_path: &PathBuf) -> Result<(), SpitraderError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let config = EngineConfig::from_config(&adapter)?;
    let csv = CsvAdapter::new(data_dir(&adapter));
    let storage = open_storage(&adapter)?;

    let ticks = csv.fetch_ticks()?;
    info!(ticks = ticks.len(), "replaying ticks");

    let mut engine = PositionEngine::new(config)?;
    let transitions = replay_ticks(&mut engine, &ticks)?;
    let persisted = storage.load_events(TradeMode::Auto)?;
    let fresh = events_after_log(engine.events(), &persisted);
    info!(
        replayed = engine.events().len(),
        appended = fresh.len(),
        "updating auto trade log"
    );
    storage.append_events(TradeMode::Auto, &fresh)?;

    let scorer = SentimentScorer::new(Arc::new(SystemClock));
    let watchlist = adapter.get_list("data", "symbols");
    let suggestions = suggestions(&ticks, &watchlist, &csv, &scorer);

    eprintln!("\n=== Engine Summary ===");
    eprintln!("Ticks:            {}", ticks.len());
    eprintln!("Transitions:      {}", transitions);
    print_engine_summary(&engine.summary());

    if !suggestions.is_empty() {
        eprintln!("\n=== Suggestions ===");
        for (symbol, (spi, action)) in &suggestions {
            eprintln!("  {}:  spi {:.1}  {}", symbol, spi, action);
        }
    }
    Ok(())
}

pub fn print_engine_summary(summary: &EngineSummary) {
    eprintln!("Capital:          {:.2}", summary.capital);
    eprintln!("Cumulative PnL:   {:.2}", summary.cumulative_pnl);
    eprintln!("Open Positions:   {}", summary.open_positions);
    if !summary.recent_trades.is_empty() {
        eprintln!("\n=== Recent Trades ===");
        for t in &summary.recent_trades {
            let sign = if t.realized_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {:.4} -> {:.4}  {}{:.2}  ({:.0}s, {})",
                t.symbol,
                t.entry_price,
                t.exit_price,
                sign,
                t.realized_pnl,
                t.held_seconds,
                t.reason,
            );
        }
    }
}

pub fn run_record(
    config_path: &PathBuf,
    symbol: &str,
    action: Action,
    price: f64,
    flow: Option<f64>,
    spi: Option<f64>,
) -> Result<(), SpitraderError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let config = EngineConfig::from_config(&adapter)?;
    let storage = open_storage(&adapter)?;

    let log = ManualTradeLog::new(config, Arc::new(SystemClock))?;
    let suggested = log.suggest(symbol, flow, spi);
    if suggested != action {
        eprintln!("note: suggested action for {} is {}", symbol, suggested);
    }
    let record = log.record(symbol, action, price)?;
    storage.append_events(TradeMode::Manual, &[record.to_event()])?;
    eprintln!(
        "Recorded {} {} @ {:.4} (capital {:.2}, fee {})",
        record.action, record.symbol, record.price, record.capital_used, record.fee
    );
    Ok(())
}

/// Loads both logs and the audit stream and summarizes them for `clock.today()`.
pub fn build_daily_summary<L: LedgerPort + ?Sized>(
    ledger: &L,
    clock: &dyn ClockPort,
) -> Result<DailySummary, SpitraderError> {
    let auto_log = ledger.load_events(TradeMode::Auto)?;
    let manual_log = ledger.load_events(TradeMode::Manual)?;
    let audit = match ledger.load_quote_audit() {
        Ok(audit) => audit,
        Err(e) => {
            warn!(error = %e, "quote audit unavailable, treating as empty");
            Vec::new()
        }
    };
    Ok(summarize(clock.today(), &auto_log, &manual_log, &audit))
}

pub fn run_report(config_path: &PathBuf) -> Result<(), SpitraderError> {
    let adapter = FileConfigAdapter::from_file(config_path)?;
    let storage = open_storage(&adapter)?;

    let summary = build_daily_summary(storage.as_ref(), &SystemClock)?;
    storage.save_summary(&summary)?;

    eprintln!("\n=== Daily Summary {} ===", summary.date);
    eprintln!("Total Trades:     {}", summary.total_trades);
    eprintln!("  Auto:           {}", summary.auto_trades);
    eprintln!("  Manual:         {}", summary.manual_trades);
    eprintln!("Total Profit:     {:.2}", summary.total_profit);
    eprintln!("Quote Freshness:  {:.1}%", summary.quote_fresh_ratio * 100.0);
    Ok(())
}
