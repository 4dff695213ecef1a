//! Quote/pressure source port trait.

use crate::domain::error::SpitraderError;
use crate::domain::tick::Tick;

pub trait TickPort {
    /// All ticks available to replay, ordered by timestamp.
    fn fetch_ticks(&self) -> Result<Vec<Tick>, SpitraderError>;
}
