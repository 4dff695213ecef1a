//! Operator-initiated trade log.
//!
//! Suggestions come from the decision function; recording is unconditional.
//! Each record is a standalone ledger entry with no exit tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::append_log::AppendLog;
use super::config::EngineConfig;
use super::decision::{Action, PressureSample};
use super::error::SpitraderError;
use super::ledger::{TradeEvent, TradeMode};
use crate::ports::clock_port::ClockPort;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTradeRecord {
    pub symbol: String,
    pub action: Action,
    pub price: f64,
    pub capital_used: f64,
    /// The configured fee rate at the time of recording.
    pub fee: f64,
    pub timestamp: DateTime<Utc>,
}

impl ManualTradeRecord {
    pub fn to_event(&self) -> TradeEvent {
        TradeEvent {
            symbol: self.symbol.clone(),
            action: self.action,
            price: self.price,
            timestamp: self.timestamp,
            mode: TradeMode::Manual,
        }
    }
}

pub struct ManualTradeLog {
    config: EngineConfig,
    clock: Arc<dyn ClockPort>,
    records: AppendLog<ManualTradeRecord>,
}

impl ManualTradeLog {
    pub fn new(config: EngineConfig, clock: Arc<dyn ClockPort>) -> Result<Self, SpitraderError> {
        config.validate()?;
        Ok(ManualTradeLog {
            config,
            clock,
            records: AppendLog::new(),
        })
    }

    /// Suggested action for operator review. Unknown readings are neutral.
    pub fn suggest(&self, symbol: &str, flow_pressure: Option<f64>, spi: Option<f64>) -> Action {
        PressureSample::new(symbol, flow_pressure, spi).decide()
    }

    pub fn record(
        &self,
        symbol: &str,
        action: Action,
        price: f64,
    ) -> Result<ManualTradeRecord, SpitraderError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(SpitraderError::DataFormat {
                reason: format!("{symbol}: price must be positive, got {price}"),
            });
        }
        let record = ManualTradeRecord {
            symbol: symbol.to_string(),
            action,
            price,
            capital_used: self.config.position_size(),
            fee: self.config.fee_rate,
            timestamp: self.clock.now(),
        };
        info!(symbol, %action, price, "recorded manual trade");
        self.records.append(record.clone());
        Ok(record)
    }

    pub fn records(&self) -> Vec<ManualTradeRecord> {
        self.records.snapshot()
    }

    pub fn events(&self) -> Vec<TradeEvent> {
        self.records.snapshot().iter().map(ManualTradeRecord::to_event).collect()
    }
}
