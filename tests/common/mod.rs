#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use spitrader::domain::config::EngineConfig;
use spitrader::domain::decision::Action;
use spitrader::domain::error::SpitraderError;
use spitrader::domain::ledger::{QuoteAuditEntry, QuoteStatus, TradeEvent, TradeMode};
use spitrader::domain::sentiment::NewsItem;
use spitrader::domain::tick::Tick;
use spitrader::ports::clock_port::ClockPort;
use spitrader::ports::news_port::NewsPort;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockNewsPort {
    pub data: HashMap<String, Vec<NewsItem>>,
    pub errors: HashMap<String, String>,
}

impl MockNewsPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_titles(mut self, symbol: &str, titles: &[&str]) -> Self {
        let items = titles.iter().map(|t| NewsItem::new(symbol, t, "")).collect();
        self.data.insert(symbol.to_string(), items);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl NewsPort for MockNewsPort {
    fn fetch_news(&self, symbol: &str) -> Result<Vec<NewsItem>, SpitraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SpitraderError::Fetch {
                source_name: "mock".into(),
                reason: reason.clone(),
            });
        }
        Ok(self.data.get(symbol).cloned().unwrap_or_default())
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 9, 30, 0).unwrap()
}

pub fn sample_config() -> EngineConfig {
    EngineConfig {
        capital: 10_000.0,
        entry_threshold: 60.0,
        exit_threshold: 40.0,
        take_profit_pct: 0.05,
        stop_loss_pct: -0.03,
        hold_time_sec: 600.0,
        trade_per_signal: 0.1,
        fee_rate: 0.01,
    }
}

pub fn tick(symbol: &str, secs: i64, flow: Option<f64>, price: f64) -> Tick {
    Tick {
        timestamp: t0() + Duration::seconds(secs),
        symbol: symbol.to_string(),
        flow_pressure: flow,
        price,
    }
}

pub fn event(symbol: &str, action: Action, price: f64, mode: TradeMode) -> TradeEvent {
    TradeEvent {
        symbol: symbol.to_string(),
        action,
        price,
        timestamp: t0(),
        mode,
    }
}

pub fn audit(symbol: &str, status: QuoteStatus) -> QuoteAuditEntry {
    QuoteAuditEntry {
        symbol: symbol.to_string(),
        status,
        timestamp: t0(),
    }
}
