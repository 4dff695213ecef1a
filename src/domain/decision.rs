//! Combined-pressure decision function.
//!
//! Blends flow pressure (70%) with the semantic pressure index (30%) and maps
//! the result onto a BUY/SELL/HOLD action. Pure and deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::SpitraderError;

/// Value substituted for an unknown flow pressure or SPI reading.
pub const NEUTRAL_PRESSURE: f64 = 50.0;

pub const FLOW_WEIGHT: f64 = 0.7;
pub const SPI_WEIGHT: f64 = 0.3;

/// Combined pressure strictly below this is a BUY.
pub const BUY_BELOW: f64 = 45.0;
/// Combined pressure strictly above this is a SELL.
pub const SELL_ABOVE: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = SpitraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Action::Buy),
            "SELL" => Ok(Action::Sell),
            "HOLD" => Ok(Action::Hold),
            other => Err(SpitraderError::DataFormat {
                reason: format!("unknown action '{other}', expected BUY, SELL or HOLD"),
            }),
        }
    }
}

/// Pressure readings for one symbol, either of which may be unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureSample {
    pub symbol: String,
    pub flow_pressure: Option<f64>,
    pub spi: Option<f64>,
}

impl PressureSample {
    pub fn new(symbol: impl Into<String>, flow_pressure: Option<f64>, spi: Option<f64>) -> Self {
        PressureSample {
            symbol: symbol.into(),
            flow_pressure,
            spi,
        }
    }

    /// `(flow_pressure, spi)` with unknown readings replaced by [`NEUTRAL_PRESSURE`].
    pub fn resolved(&self) -> (f64, f64) {
        (
            self.flow_pressure.unwrap_or(NEUTRAL_PRESSURE),
            self.spi.unwrap_or(NEUTRAL_PRESSURE),
        )
    }

    pub fn decide(&self) -> Action {
        let (flow, spi) = self.resolved();
        decide(flow, spi)
    }
}

pub fn combined_pressure(flow_pressure: f64, spi: f64) -> f64 {
    flow_pressure * FLOW_WEIGHT + spi * SPI_WEIGHT
}

pub fn decide(flow_pressure: f64, spi: f64) -> Action {
    let combined = combined_pressure(flow_pressure, spi);
    if combined < BUY_BELOW {
        Action::Buy
    } else if combined > SELL_ABOVE {
        Action::Sell
    } else {
        Action::Hold
    }
}
