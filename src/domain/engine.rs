//! Position lifecycle engine.
//!
//! Per symbol the engine is in one of two states: no position, or one open
//! [`Position`]. Each call to [`PositionEngine::tick`] evaluates exactly one of
//! the two transitions, chosen by the state at the start of the tick:
//!
//! - no position: open one when `flow_pressure > entry_threshold`;
//! - open: close it when any exit condition holds, emitting a [`ClosedTrade`].
//!
//! A position opened in a tick is never closed in that same tick, and a
//! position closed in a tick is not reopened until the next one.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::{debug, info};

use super::config::EngineConfig;
use super::decision::Action;
use super::error::SpitraderError;
use super::ledger::{TradeEvent, TradeMode};
use super::position::{ClosedTrade, Position};
use super::tick::Tick;

/// Closed trades included in [`EngineSummary::recent_trades`].
pub const RECENT_TRADES: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Opened(Position),
    Closed(ClosedTrade),
    /// An open position survived the tick.
    Held,
    /// No position before or after the tick.
    Idle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSummary {
    pub capital: f64,
    /// Rounded to cents.
    pub cumulative_pnl: f64,
    pub open_positions: usize,
    /// Oldest first.
    pub recent_trades: Vec<ClosedTrade>,
}

#[derive(Debug)]
pub struct PositionEngine {
    config: EngineConfig,
    positions: HashMap<String, Position>,
    closed_trades: Vec<ClosedTrade>,
    events: Vec<TradeEvent>,
    total_pnl: f64,
}

impl PositionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, SpitraderError> {
        config.validate()?;
        Ok(PositionEngine {
            config,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            events: Vec::new(),
            total_pnl: 0.0,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tick(
        &mut self,
        symbol: &str,
        flow_pressure: f64,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome, SpitraderError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(SpitraderError::DataFormat {
                reason: format!("{symbol}: price must be positive, got {price}"),
            });
        }

        let position = match self.positions.get(symbol) {
            Some(position) => position,
            None => {
                if flow_pressure > self.config.entry_threshold {
                    let opened = self.open(symbol, price, now)?;
                    return Ok(TickOutcome::Opened(opened));
                }
                return Ok(TickOutcome::Idle);
            }
        };

        match position.exit_reason(flow_pressure, price, now, &self.config) {
            Some(reason) => {
                let Some(position) = self.positions.remove(symbol) else {
                    return Ok(TickOutcome::Idle);
                };
                let trade = position.close(price, now, self.config.fee_rate, reason);
                self.total_pnl += trade.realized_pnl;
                self.events.push(TradeEvent {
                    symbol: symbol.to_string(),
                    action: Action::Sell,
                    price,
                    timestamp: now,
                    mode: TradeMode::Auto,
                });
                info!(
                    symbol,
                    entry = trade.entry_price,
                    exit = price,
                    pnl = trade.realized_pnl,
                    held = trade.held_seconds,
                    reason = %reason,
                    "closed position"
                );
                self.closed_trades.push(trade.clone());
                Ok(TickOutcome::Closed(trade))
            }
            None => {
                debug!(symbol, flow_pressure, price, "holding position");
                Ok(TickOutcome::Held)
            }
        }
    }

    /// Convenience for replaying a [`Tick`]; unknown flow pressure is neutral.
    pub fn apply(&mut self, tick: &Tick) -> Result<TickOutcome, SpitraderError> {
        self.tick(
            &tick.symbol,
            tick.flow_pressure_or_neutral(),
            tick.price,
            tick.timestamp,
        )
    }

    /// Opens a position for `symbol`. Refuses to replace an existing one.
    pub fn open(
        &mut self,
        symbol: &str,
        price: f64,
        now: DateTime<Utc>,
    ) -> Result<Position, SpitraderError> {
        let size = self.config.position_size();
        match self.positions.entry(symbol.to_string()) {
            Entry::Occupied(_) => Err(SpitraderError::PositionAlreadyOpen {
                symbol: symbol.to_string(),
            }),
            Entry::Vacant(slot) => {
                let position = Position {
                    symbol: symbol.to_string(),
                    entry_price: price,
                    opened_at: now,
                    size,
                };
                slot.insert(position.clone());
                self.events.push(TradeEvent {
                    symbol: symbol.to_string(),
                    action: Action::Buy,
                    price,
                    timestamp: now,
                    mode: TradeMode::Auto,
                });
                info!(symbol, price, size, "opened position");
                Ok(position)
            }
        }
    }

    pub fn open_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn open_position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    /// BUY/SELL events in the order the transitions happened.
    pub fn events(&self) -> &[TradeEvent] {
        &self.events
    }

    pub fn total_pnl(&self) -> f64 {
        self.total_pnl
    }

    pub fn summary(&self) -> EngineSummary {
        let skip = self.closed_trades.len().saturating_sub(RECENT_TRADES);
        EngineSummary {
            capital: self.config.capital,
            cumulative_pnl: (self.total_pnl * 100.0).round() / 100.0,
            open_positions: self.positions.len(),
            recent_trades: self.closed_trades[skip..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::ExitReason;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            capital: 10_000.0,
            entry_threshold: 60.0,
            exit_threshold: 40.0,
            take_profit_pct: 0.05,
            stop_loss_pct: -0.03,
            hold_time_sec: 300.0,
            trade_per_signal: 0.1,
            fee_rate: 0.01,
        }
    }

    fn engine() -> PositionEngine {
        PositionEngine::new(config()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut bad = config();
        bad.capital = 0.0;
        assert!(matches!(
            PositionEngine::new(bad),
            Err(SpitraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn no_entry_at_or_below_threshold() {
        let mut e = engine();
        assert_eq!(e.tick("BTC", 60.0, 100.0, t0()).unwrap(), TickOutcome::Idle);
        assert_eq!(e.tick("BTC", 10.0, 100.0, t0()).unwrap(), TickOutcome::Idle);
        assert_eq!(e.open_position_count(), 0);
    }

    #[test]
    fn entry_above_threshold_sizes_position() {
        let mut e = engine();
        let outcome = e.tick("BTC", 61.0, 100.0, t0()).unwrap();
        let TickOutcome::Opened(pos) = outcome else {
            panic!("expected Opened, got {outcome:?}");
        };
        assert_relative_eq!(pos.size, 1000.0);
        assert_relative_eq!(pos.entry_price, 100.0);
        assert_eq!(pos.opened_at, t0());
        assert!(e.open_position("BTC").is_some());
    }

    #[test]
    fn entry_tick_does_not_evaluate_exit() {
        let mut cfg = config();
        cfg.hold_time_sec = 0.0;
        let mut e = PositionEngine::new(cfg).unwrap();
        // held >= 0 would close immediately if exit ran on the entry tick
        assert!(matches!(
            e.tick("BTC", 90.0, 100.0, t0()).unwrap(),
            TickOutcome::Opened(_)
        ));
        assert_eq!(e.open_position_count(), 1);
        assert!(e.closed_trades().is_empty());
    }

    #[test]
    fn stays_open_inside_band() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        for i in 1..=5 {
            let outcome = e
                .tick("BTC", 55.0, 101.0, t0() + Duration::seconds(i * 10))
                .unwrap();
            assert_eq!(outcome, TickOutcome::Held);
        }
        assert_eq!(e.open_position_count(), 1);
        assert!(e.closed_trades().is_empty());
    }

    #[test]
    fn take_profit_closes_with_fee_adjusted_pnl() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        let outcome = e
            .tick("BTC", 70.0, 110.0, t0() + Duration::seconds(30))
            .unwrap();
        let TickOutcome::Closed(trade) = outcome else {
            panic!("expected Closed, got {outcome:?}");
        };
        assert_eq!(trade.reason, ExitReason::TakeProfit);
        assert_relative_eq!(trade.realized_pnl, 99.0, epsilon = 1e-9);
        assert_relative_eq!(trade.held_seconds, 30.0);
        assert_relative_eq!(e.total_pnl(), 99.0, epsilon = 1e-9);
        assert_eq!(e.open_position_count(), 0);
    }

    #[test]
    fn closes_exactly_once() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        let later = t0() + Duration::seconds(5);
        assert!(matches!(
            e.tick("BTC", 30.0, 100.0, later).unwrap(),
            TickOutcome::Closed(_)
        ));
        assert_eq!(e.tick("BTC", 30.0, 100.0, later).unwrap(), TickOutcome::Idle);
        assert_eq!(e.closed_trades().len(), 1);
    }

    #[test]
    fn close_tick_does_not_reopen() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        // flow stays above entry, but the stop loss fires
        let outcome = e
            .tick("BTC", 90.0, 90.0, t0() + Duration::seconds(1))
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Closed(_)));
        assert_eq!(e.open_position_count(), 0);
        assert!(matches!(
            e.tick("BTC", 90.0, 90.0, t0() + Duration::seconds(2)).unwrap(),
            TickOutcome::Opened(_)
        ));
    }

    #[test]
    fn hold_time_closes() {
        let mut e = engine();
        e.tick("ETH", 70.0, 100.0, t0()).unwrap();
        let outcome = e
            .tick("ETH", 55.0, 100.0, t0() + Duration::seconds(300))
            .unwrap();
        let TickOutcome::Closed(trade) = outcome else {
            panic!("expected Closed, got {outcome:?}");
        };
        assert_eq!(trade.reason, ExitReason::HoldTimeElapsed);
        assert_relative_eq!(trade.realized_pnl, 0.0);
    }

    #[test]
    fn symbols_are_independent() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        e.tick("ETH", 70.0, 50.0, t0()).unwrap();
        e.tick("BTC", 30.0, 100.0, t0() + Duration::seconds(1)).unwrap();
        assert!(e.open_position("BTC").is_none());
        assert!(e.open_position("ETH").is_some());
    }

    #[test]
    fn open_refuses_second_position() {
        let mut e = engine();
        e.open("BTC", 100.0, t0()).unwrap();
        let err = e.open("BTC", 105.0, t0()).unwrap_err();
        assert!(matches!(err, SpitraderError::PositionAlreadyOpen { symbol } if symbol == "BTC"));
        assert_relative_eq!(e.open_position("BTC").unwrap().entry_price, 100.0);
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut e = engine();
        assert!(matches!(
            e.tick("BTC", 70.0, 0.0, t0()),
            Err(SpitraderError::DataFormat { .. })
        ));
        assert_eq!(e.open_position_count(), 0);
    }

    #[test]
    fn events_record_buy_then_sell() {
        let mut e = engine();
        e.tick("BTC", 70.0, 100.0, t0()).unwrap();
        e.tick("BTC", 30.0, 104.0, t0() + Duration::seconds(1)).unwrap();
        let actions: Vec<(Action, f64)> =
            e.events().iter().map(|ev| (ev.action, ev.price)).collect();
        assert_eq!(actions, vec![(Action::Buy, 100.0), (Action::Sell, 104.0)]);
        assert!(e.events().iter().all(|ev| ev.mode == TradeMode::Auto));
    }

    #[test]
    fn apply_treats_missing_flow_as_neutral() {
        let mut e = engine();
        let tick = Tick {
            timestamp: t0(),
            symbol: "BTC".into(),
            flow_pressure: None,
            price: 100.0,
        };
        assert_eq!(e.apply(&tick).unwrap(), TickOutcome::Idle);
    }

    #[test]
    fn summary_rounds_and_keeps_last_ten() {
        let mut e = engine();
        for i in 0..12 {
            let start = t0() + Duration::minutes(i * 2);
            e.tick("BTC", 70.0, 100.0, start).unwrap();
            e.tick("BTC", 30.0, 100.123, start + Duration::seconds(10)).unwrap();
        }
        let summary = e.summary();
        assert_relative_eq!(summary.capital, 10_000.0);
        assert_eq!(summary.open_positions, 0);
        assert_eq!(summary.recent_trades.len(), RECENT_TRADES);
        assert_eq!(summary.recent_trades[0].closed_at, e.closed_trades()[2].closed_at);
        // 12 * 0.00123 * 1000 * 0.99 = 14.6124
        assert_relative_eq!(summary.cumulative_pnl, 14.61, epsilon = 1e-9);
    }

    #[test]
    fn summary_of_fresh_engine() {
        let summary = engine().summary();
        assert_eq!(summary.cumulative_pnl, 0.0);
        assert!(summary.recent_trades.is_empty());
    }
}
