//! CSV directory adapter.
//!
//! Layout under the base directory:
//!
//! | file                  | contents                                   |
//! |-----------------------|--------------------------------------------|
//! | `<SYMBOL>_news.csv`   | `title,description[,timestamp]`            |
//! | `ticks.csv`           | `timestamp,symbol,flow_pressure,price`     |
//! | `auto_trades.csv`     | `symbol,action,price,timestamp,mode`       |
//! | `manual_trades.csv`   | same as `auto_trades.csv`                  |
//! | `quote_audit.csv`     | `symbol,status,timestamp`                  |
//! | `summaries.csv`       | one [`DailySummary`] row per date          |
//!
//! Timestamps are RFC 3339. A missing log or audit file reads as empty.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::domain::error::SpitraderError;
use crate::domain::ledger::{QuoteAuditEntry, TradeEvent, TradeMode};
use crate::domain::report::DailySummary;
use crate::domain::sentiment::NewsItem;
use crate::domain::tick::Tick;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::news_port::NewsPort;
use crate::ports::report_port::ReportStore;
use crate::ports::tick_port::TickPort;

const TICKS_FILE: &str = "ticks.csv";
const AUDIT_FILE: &str = "quote_audit.csv";
const SUMMARIES_FILE: &str = "summaries.csv";

#[derive(Debug, Deserialize)]
struct NewsRow {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn news_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}_news.csv", symbol))
    }

    fn log_path(&self, mode: TradeMode) -> PathBuf {
        self.base_path.join(format!("{}_trades.csv", mode))
    }

    fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SpitraderError> {
        let content = fs::read_to_string(path).map_err(|e| SpitraderError::Storage {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        rdr.deserialize()
            .enumerate()
            .map(|(i, row)| {
                row.map_err(|e| SpitraderError::DataFormat {
                    reason: format!("{} row {}: {}", path.display(), i + 1, e),
                })
            })
            .collect()
    }

    fn read_rows_or_empty<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SpitraderError> {
        if path.exists() {
            Self::read_rows(path)
        } else {
            Ok(Vec::new())
        }
    }

    fn csv_error(path: &Path, e: csv::Error) -> SpitraderError {
        SpitraderError::Storage {
            reason: format!("failed to write {}: {}", path.display(), e),
        }
    }
}

impl NewsPort for CsvAdapter {
    fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, SpitraderError> {
        let path = self.news_path(symbol);
        let rows: Vec<NewsRow> = Self::read_rows(&path).map_err(|e| SpitraderError::Fetch {
            source_name: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(rows
            .into_iter()
            .map(|row| NewsItem {
                symbol: symbol.to_string(),
                title: row.title,
                body: row.description,
                timestamp: row.timestamp,
            })
            .collect())
    }
}

impl TickPort for CsvAdapter {
    fn fetch_ticks(&self) -> Result<Vec<Tick>, SpitraderError> {
        let mut ticks: Vec<Tick> = Self::read_rows(&self.base_path.join(TICKS_FILE))?;
        ticks.sort_by_key(|t| t.timestamp);
        Ok(ticks)
    }
}

impl LedgerPort for CsvAdapter {
    fn load_events(&self, mode: TradeMode) -> Result<Vec<TradeEvent>, SpitraderError> {
        Self::read_rows_or_empty(&self.log_path(mode))
    }

    fn append_events(&self, mode: TradeMode, events: &[TradeEvent]) -> Result<(), SpitraderError> {
        if events.is_empty() {
            return Ok(());
        }
        let path = self.log_path(mode);
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| SpitraderError::Storage {
                reason: format!("failed to open {}: {}", path.display(), e),
            })?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        for event in events {
            wtr.serialize(event).map_err(|e| Self::csv_error(&path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn load_quote_audit(&self) -> Result<Vec<QuoteAuditEntry>, SpitraderError> {
        Self::read_rows_or_empty(&self.base_path.join(AUDIT_FILE))
    }
}

impl ReportStore for CsvAdapter {
    fn save_summary(&self, summary: &DailySummary) -> Result<(), SpitraderError> {
        let path = self.base_path.join(SUMMARIES_FILE);
        let mut summaries: Vec<DailySummary> = Self::read_rows_or_empty(&path)?;
        summaries.retain(|s| s.date != summary.date);
        summaries.push(summary.clone());
        summaries.sort_by_key(|s| s.date);

        let mut wtr = csv::Writer::from_path(&path).map_err(|e| Self::csv_error(&path, e))?;
        for s in &summaries {
            wtr.serialize(s).map_err(|e| Self::csv_error(&path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn load_summary(&self, date: NaiveDate) -> Result<Option<DailySummary>, SpitraderError> {
        let summaries: Vec<DailySummary> =
            Self::read_rows_or_empty(&self.base_path.join(SUMMARIES_FILE))?;
        Ok(summaries.into_iter().find(|s| s.date == date))
    }
}
