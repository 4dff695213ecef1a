//! Daily report aggregation over trade logs and the quote audit stream.
//!
//! Profit is a notional-flow proxy: per symbol, SELL prices are added and BUY
//! prices subtracted. It is not inventory-matched and does not use realized
//! PnL from closed trades.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::decision::Action;
use super::ledger::{QuoteAuditEntry, QuoteStatus, TradeEvent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub total_trades: usize,
    pub auto_trades: usize,
    pub manual_trades: usize,
    pub total_profit: f64,
    pub quote_fresh_ratio: f64,
}

/// Notional flow per symbol across both logs, keyed in symbol order.
pub fn profit_by_symbol(
    auto_log: &[TradeEvent],
    manual_log: &[TradeEvent],
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for event in auto_log.iter().chain(manual_log) {
        let total = totals.entry(event.symbol.clone()).or_insert(0.0);
        match event.action {
            Action::Sell => *total += event.price,
            Action::Buy => *total -= event.price,
            Action::Hold => {}
        }
    }
    totals
}

/// Share of audit entries that are fresh; 0 when there are none.
pub fn quote_fresh_ratio(audit: &[QuoteAuditEntry]) -> f64 {
    let fresh = audit.iter().filter(|e| e.status == QuoteStatus::Fresh).count();
    fresh as f64 / audit.len().max(1) as f64
}

pub fn summarize(
    date: NaiveDate,
    auto_log: &[TradeEvent],
    manual_log: &[TradeEvent],
    quote_audit: &[QuoteAuditEntry],
) -> DailySummary {
    DailySummary {
        date,
        total_trades: auto_log.len() + manual_log.len(),
        auto_trades: auto_log.len(),
        manual_trades: manual_log.len(),
        total_profit: profit_by_symbol(auto_log, manual_log).values().sum(),
        quote_fresh_ratio: quote_fresh_ratio(quote_audit),
    }
}
