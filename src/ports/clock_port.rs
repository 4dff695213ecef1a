//! Time source port trait.

use chrono::{DateTime, NaiveDate, Utc};

pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used to key daily reports.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}
