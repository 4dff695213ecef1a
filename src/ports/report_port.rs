//! Durable report store port trait.

use crate::domain::error::SpitraderError;
use crate::domain::report::DailySummary;

/// Port for persisting daily summaries. A second save for the same date
/// replaces the first.
pub trait ReportStore {
    fn save_summary(&self, summary: &DailySummary) -> Result<(), SpitraderError>;

    fn load_summary(
        &self,
        date: chrono::NaiveDate,
    ) -> Result<Option<DailySummary>, SpitraderError>;
}
