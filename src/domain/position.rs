//! Open simulated positions and the trades they close into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::config::EngineConfig;
use super::ledger::TradeMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub entry_price: f64,
    pub opened_at: DateTime<Utc>,
    /// Capital allocated to the position.
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    FlowBelowExit,
    TakeProfit,
    StopLoss,
    HoldTimeElapsed,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExitReason::FlowBelowExit => "flow below exit threshold",
            ExitReason::TakeProfit => "take profit",
            ExitReason::StopLoss => "stop loss",
            ExitReason::HoldTimeElapsed => "hold time elapsed",
        })
    }
}

impl Position {
    pub fn pnl_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }

    /// Seconds since the position opened. Never negative, even if the clock
    /// runs backwards.
    pub fn held_seconds(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.opened_at).num_milliseconds();
        (millis as f64 / 1000.0).max(0.0)
    }

    /// Fee-adjusted PnL if closed at `price`.
    pub fn realized_pnl(&self, price: f64, fee_rate: f64) -> f64 {
        self.pnl_pct(price) * self.size * (1.0 - fee_rate)
    }

    /// The first exit condition that holds, checked in the order
    /// flow, take profit, stop loss, hold time.
    pub fn exit_reason(
        &self,
        flow_pressure: f64,
        price: f64,
        now: DateTime<Utc>,
        config: &EngineConfig,
    ) -> Option<ExitReason> {
        let pnl_pct = self.pnl_pct(price);
        if flow_pressure < config.exit_threshold {
            Some(ExitReason::FlowBelowExit)
        } else if pnl_pct > config.take_profit_pct {
            Some(ExitReason::TakeProfit)
        } else if pnl_pct < config.stop_loss_pct {
            Some(ExitReason::StopLoss)
        } else if self.held_seconds(now) >= config.hold_time_sec {
            Some(ExitReason::HoldTimeElapsed)
        } else {
            None
        }
    }

    pub fn close(
        self,
        price: f64,
        now: DateTime<Utc>,
        fee_rate: f64,
        reason: ExitReason,
    ) -> ClosedTrade {
        ClosedTrade {
            realized_pnl: self.realized_pnl(price, fee_rate),
            held_seconds: self.held_seconds(now),
            symbol: self.symbol,
            entry_price: self.entry_price,
            exit_price: price,
            closed_at: now,
            mode: TradeMode::Auto,
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub realized_pnl: f64,
    pub held_seconds: f64,
    pub closed_at: DateTime<Utc>,
    pub mode: TradeMode,
    pub reason: ExitReason,
}
