//! Per-symbol market observation fed to the engine each cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::NEUTRAL_PRESSURE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub flow_pressure: Option<f64>,
    pub price: f64,
}

impl Tick {
    /// Flow pressure with an unknown reading treated as neutral.
    pub fn flow_pressure_or_neutral(&self) -> f64 {
        self.flow_pressure.unwrap_or(NEUTRAL_PRESSURE)
    }
}
