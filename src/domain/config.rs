//! Engine configuration and validation.
//!
//! Read once at construction and immutable afterwards. Every component that
//! takes an [`EngineConfig`] validates it first so an invalid configuration
//! fails fast instead of producing a stuck engine.

use crate::domain::error::SpitraderError;
use crate::ports::config_port::ConfigPort;

const SECTION: &str = "engine";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub capital: f64,
    /// Flow pressure strictly above this opens a position.
    pub entry_threshold: f64,
    /// Flow pressure strictly below this closes a position.
    pub exit_threshold: f64,
    pub take_profit_pct: f64,
    /// Negative fraction, e.g. -0.03.
    pub stop_loss_pct: f64,
    pub hold_time_sec: f64,
    /// Fraction of capital allocated per position, in (0, 1].
    pub trade_per_signal: f64,
    /// Fraction of gross PnL lost to fees, in [0, 1).
    pub fee_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            capital: 10_000.0,
            entry_threshold: 60.0,
            exit_threshold: 40.0,
            take_profit_pct: 0.05,
            stop_loss_pct: -0.03,
            hold_time_sec: 3600.0,
            trade_per_signal: 0.1,
            fee_rate: 0.001,
        }
    }
}

impl EngineConfig {
    /// Reads the `[engine]` section, filling absent keys from [`Default`],
    /// then validates. A key that is present but not a number is an error.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SpitraderError> {
        let d = EngineConfig::default();
        let read = |key: &str, default: f64| -> Result<f64, SpitraderError> {
            Ok(config.get_double(SECTION, key)?.unwrap_or(default))
        };
        let built = EngineConfig {
            capital: read("capital", d.capital)?,
            entry_threshold: read("entry_threshold", d.entry_threshold)?,
            exit_threshold: read("exit_threshold", d.exit_threshold)?,
            take_profit_pct: read("take_profit_pct", d.take_profit_pct)?,
            stop_loss_pct: read("stop_loss_pct", d.stop_loss_pct)?,
            hold_time_sec: read("hold_time_sec", d.hold_time_sec)?,
            trade_per_signal: read("trade_per_signal", d.trade_per_signal)?,
            fee_rate: read("fee_rate", d.fee_rate)?,
        };
        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), SpitraderError> {
        self.validate_finite()?;

        if self.capital <= 0.0 {
            return Err(SpitraderError::invalid(SECTION, "capital", "capital must be positive"));
        }
        if !(0.0..100.0).contains(&self.entry_threshold) {
            return Err(SpitraderError::invalid(
                SECTION,
                "entry_threshold",
                "entry_threshold must be in [0, 100) or no position can open",
            ));
        }
        if !(0.0..=100.0).contains(&self.exit_threshold) {
            return Err(SpitraderError::invalid(
                SECTION,
                "exit_threshold",
                "exit_threshold must be in [0, 100]",
            ));
        }
        if self.take_profit_pct <= 0.0 {
            return Err(SpitraderError::invalid(
                SECTION,
                "take_profit_pct",
                "take_profit_pct must be positive",
            ));
        }
        if self.stop_loss_pct >= 0.0 {
            return Err(SpitraderError::invalid(
                SECTION,
                "stop_loss_pct",
                "stop_loss_pct must be negative",
            ));
        }
        if self.hold_time_sec < 0.0 {
            return Err(SpitraderError::invalid(
                SECTION,
                "hold_time_sec",
                "hold_time_sec must be non-negative",
            ));
        }
        if self.trade_per_signal <= 0.0 || self.trade_per_signal > 1.0 {
            return Err(SpitraderError::invalid(
                SECTION,
                "trade_per_signal",
                "trade_per_signal must be in (0, 1]",
            ));
        }
        if !(0.0..1.0).contains(&self.fee_rate) {
            return Err(SpitraderError::invalid(
                SECTION,
                "fee_rate",
                "fee_rate must be in [0, 1)",
            ));
        }
        Ok(())
    }

    /// Capital committed to one position or one manual action.
    pub fn position_size(&self) -> f64 {
        self.capital * self.trade_per_signal
    }

    fn validate_finite(&self) -> Result<(), SpitraderError> {
        let fields = [
            ("capital", self.capital),
            ("entry_threshold", self.entry_threshold),
            ("exit_threshold", self.exit_threshold),
            ("take_profit_pct", self.take_profit_pct),
            ("stop_loss_pct", self.stop_loss_pct),
            ("hold_time_sec", self.hold_time_sec),
            ("trade_per_signal", self.trade_per_signal),
            ("fee_rate", self.fee_rate),
        ];
        match fields.iter().find(|(_, v)| !v.is_finite()) {
            Some((key, _)) => Err(SpitraderError::invalid(SECTION, key, "value must be finite")),
            None => Ok(()),
        }
    }
}
