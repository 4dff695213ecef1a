//! Trade log and quote audit storage port trait.

use crate::domain::error::SpitraderError;
use crate::domain::ledger::{QuoteAuditEntry, TradeEvent, TradeMode};

pub trait LedgerPort {
    fn load_events(&self, mode: TradeMode) -> Result<Vec<TradeEvent>, SpitraderError>;

    /// Appends to the log for `mode`. Existing entries are never rewritten.
    fn append_events(&self, mode: TradeMode, events: &[TradeEvent])
        -> Result<(), SpitraderError>;

    fn load_quote_audit(&self) -> Result<Vec<QuoteAuditEntry>, SpitraderError>;
}
