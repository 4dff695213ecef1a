//! Wall-clock time source.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::ports::clock_port::ClockPort;

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Local calendar date, not the UTC one.
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
