//! SQLite ledger and report store.

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::decision::Action;
use crate::domain::error::SpitraderError;
use crate::domain::ledger::{QuoteAuditEntry, QuoteStatus, TradeEvent, TradeMode};
use crate::domain::report::DailySummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::report_port::ReportStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> SpitraderError {
    SpitraderError::StorageQuery {
        reason: e.to_string(),
    }
}

fn conversion_err(len: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        len,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::other(reason)),
    )
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(raw.len(), e.to_string()))
}

fn mode_str(mode: TradeMode) -> &'static str {
    match mode {
        TradeMode::Auto => "auto",
        TradeMode::Manual => "manual",
    }
}

fn status_str(status: QuoteStatus) -> &'static str {
    match status {
        QuoteStatus::Fresh => "FRESH",
        QuoteStatus::Stale => "STALE",
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SpitraderError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| SpitraderError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size")?.unwrap_or(4).clamp(1, 64) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| SpitraderError::Storage {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, SpitraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SpitraderError::Storage {
                reason: e.to_string(),
            })?;

        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SpitraderError> {
        self.pool.get().map_err(|e: r2d2::Error| SpitraderError::Storage {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), SpitraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS trade_events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    mode TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    action TEXT NOT NULL,
                    price REAL NOT NULL,
                    timestamp TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_trade_events_mode ON trade_events(mode);
                CREATE TABLE IF NOT EXISTS quote_audit (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    symbol TEXT NOT NULL,
                    status TEXT NOT NULL,
                    timestamp TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS daily_summary (
                    date TEXT PRIMARY KEY,
                    total_trades INTEGER NOT NULL,
                    auto_trades INTEGER NOT NULL,
                    manual_trades INTEGER NOT NULL,
                    total_profit REAL NOT NULL,
                    quote_fresh_ratio REAL NOT NULL
                );",
            )
            .map_err(query_err)
    }

    /// Audit rows come from the quote collaborator; exposed for seeding.
    pub fn insert_quote_audit(&self, entries: &[QuoteAuditEntry]) -> Result<(), SpitraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for entry in entries {
            tx.execute(
                "INSERT INTO quote_audit (symbol, status, timestamp) VALUES (?1, ?2, ?3)",
                params![entry.symbol, status_str(entry.status), entry.timestamp.to_rfc3339()],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }
}

impl LedgerPort for SqliteAdapter {
    fn load_events(&self, mode: TradeMode) -> Result<Vec<TradeEvent>, SpitraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT symbol, action, price, timestamp FROM trade_events
                 WHERE mode = ?1 ORDER BY id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![mode_str(mode)], |row| {
                let action: String = row.get(1)?;
                let action = action
                    .parse::<Action>()
                    .map_err(|e| conversion_err(action.len(), e.to_string()))?;
                let timestamp: String = row.get(3)?;
                Ok(TradeEvent {
                    symbol: row.get(0)?,
                    action,
                    price: row.get(2)?,
                    timestamp: parse_timestamp(&timestamp)?,
                    mode,
                })
            })
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }

    fn append_events(&self, mode: TradeMode, events: &[TradeEvent]) -> Result<(), SpitraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;
        for event in events {
            tx.execute(
                "INSERT INTO trade_events (mode, symbol, action, price, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    mode_str(mode),
                    event.symbol,
                    event.action.as_str(),
                    event.price,
                    event.timestamp.to_rfc3339()
                ],
            )
            .map_err(query_err)?;
        }
        tx.commit().map_err(query_err)
    }

    fn load_quote_audit(&self) -> Result<Vec<QuoteAuditEntry>, SpitraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT symbol, status, timestamp FROM quote_audit ORDER BY id ASC")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                let status: String = row.get(1)?;
                let status = match status.as_str() {
                    "FRESH" => QuoteStatus::Fresh,
                    "STALE" => QuoteStatus::Stale,
                    other => {
                        return Err(conversion_err(
                            other.len(),
                            format!("unknown quote status '{other}'"),
                        ));
                    }
                };
                let timestamp: String = row.get(2)?;
                Ok(QuoteAuditEntry {
                    symbol: row.get(0)?,
                    status,
                    timestamp: parse_timestamp(&timestamp)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(query_err)
    }
}

impl ReportStore for SqliteAdapter {
    fn save_summary(&self, summary: &DailySummary) -> Result<(), SpitraderError> {
        self.conn()?
            .execute(
                "INSERT OR REPLACE INTO daily_summary
                 (date, total_trades, auto_trades, manual_trades, total_profit, quote_fresh_ratio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    summary.date.format(DATE_FORMAT).to_string(),
                    summary.total_trades as i64,
                    summary.auto_trades as i64,
                    summary.manual_trades as i64,
                    summary.total_profit,
                    summary.quote_fresh_ratio
                ],
            )
            .map_err(query_err)?;
        Ok(())
    }

    fn load_summary(&self, date: NaiveDate) -> Result<Option<DailySummary>, SpitraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT total_trades, auto_trades, manual_trades, total_profit, quote_fresh_ratio
                 FROM daily_summary WHERE date = ?1",
            )
            .map_err(query_err)?;

        let mut rows = stmt
            .query_map(params![date.format(DATE_FORMAT).to_string()], |row| {
                Ok(DailySummary {
                    date,
                    total_trades: row.get::<_, i64>(0)? as usize,
                    auto_trades: row.get::<_, i64>(1)? as usize,
                    manual_trades: row.get::<_, i64>(2)? as usize,
                    total_profit: row.get(3)?,
                    quote_fresh_ratio: row.get(4)?,
                })
            })
            .map_err(query_err)?;

        rows.next().transpose().map_err(query_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 9, 13, m, 0).unwrap()
    }

    fn event(symbol: &str, action: Action, price: f64, mode: TradeMode) -> TradeEvent {
        TradeEvent {
            symbol: symbol.into(),
            action,
            price,
            timestamp: ts(0),
            mode,
        }
    }

    #[test]
    fn events_are_partitioned_by_mode() {
        let db = SqliteAdapter::in_memory().unwrap();
        db.append_events(
            TradeMode::Auto,
            &[
                event("BTC", Action::Buy, 100.0, TradeMode::Auto),
                event("BTC", Action::Sell, 105.0, TradeMode::Auto),
            ],
        )
        .unwrap();
        db.append_events(
            TradeMode::Manual,
            &[event("ETH", Action::Hold, 3000.0, TradeMode::Manual)],
        )
        .unwrap();

        let auto = db.load_events(TradeMode::Auto).unwrap();
        assert_eq!(auto.len(), 2);
        assert_eq!(auto[0], event("BTC", Action::Buy, 100.0, TradeMode::Auto));
        assert_eq!(auto[1].action, Action::Sell);

        let manual = db.load_events(TradeMode::Manual).unwrap();
        assert_eq!(manual, vec![event("ETH", Action::Hold, 3000.0, TradeMode::Manual)]);
    }

    #[test]
    fn quote_audit_round_trip() {
        let db = SqliteAdapter::in_memory().unwrap();
        let entries = vec![
            QuoteAuditEntry {
                symbol: "BTC".into(),
                status: QuoteStatus::Fresh,
                timestamp: ts(1),
            },
            QuoteAuditEntry {
                symbol: "BTC".into(),
                status: QuoteStatus::Stale,
                timestamp: ts(2),
            },
        ];
        db.insert_quote_audit(&entries).unwrap();
        assert_eq!(db.load_quote_audit().unwrap(), entries);
    }

    #[test]
    fn summary_replaced_by_date() {
        let db = SqliteAdapter::in_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 7, 9).unwrap();
        let mut summary = DailySummary {
            date,
            total_trades: 3,
            auto_trades: 2,
            manual_trades: 1,
            total_profit: -12.5,
            quote_fresh_ratio: 0.75,
        };
        db.save_summary(&summary).unwrap();
        summary.total_profit = 8.0;
        db.save_summary(&summary).unwrap();

        assert_eq!(db.load_summary(date).unwrap(), Some(summary));
        assert_eq!(db.load_summary(date.succ_opt().unwrap()).unwrap(), None);
    }

    #[test]
    fn from_config_requires_path() {
        let config = crate::adapters::file_config_adapter::FileConfigAdapter::from_string(
            "[sqlite]\npool_size = 2\n",
        )
        .unwrap();
        assert!(matches!(
            SqliteAdapter::from_config(&config),
            Err(SpitraderError::ConfigMissing { key, .. }) if key == "path"
        ));
    }

    #[test]
    fn from_config_rejects_non_numeric_pool_size() {
        let config = crate::adapters::file_config_adapter::FileConfigAdapter::from_string(
            "[sqlite]\npath = :memory:\npool_size = many\n",
        )
        .unwrap();
        assert!(matches!(
            SqliteAdapter::from_config(&config),
            Err(SpitraderError::ConfigInvalid { key, .. }) if key == "pool_size"
        ));
    }
}
