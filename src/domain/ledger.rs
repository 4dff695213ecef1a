//! Trade log entries and quote audit records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::decision::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeMode {
    Auto,
    Manual,
}

impl fmt::Display for TradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TradeMode::Auto => "auto",
            TradeMode::Manual => "manual",
        })
    }
}

/// One BUY/SELL/HOLD action at a price, as written to a trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub symbol: String,
    pub action: Action,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub mode: TradeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteStatus {
    Fresh,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteAuditEntry {
    pub symbol: String,
    pub status: QuoteStatus,
    pub timestamp: DateTime<Utc>,
}

/// Events newer than everything already in `persisted`.
///
/// Tick replay is deterministic, so replaying the same ticks again yields
/// the persisted events first; only the tail past the newest persisted
/// timestamp is new.
pub fn events_after_log(events: &[TradeEvent], persisted: &[TradeEvent]) -> Vec<TradeEvent> {
    match persisted.iter().map(|e| e.timestamp).max() {
        Some(newest) => events
            .iter()
            .filter(|e| e.timestamp > newest)
            .cloned()
            .collect(),
        None => events.to_vec(),
    }
}
