//! Port traits for the collaborators the engine depends on.

pub mod clock_port;
pub mod config_port;
pub mod ledger_port;
pub mod news_port;
pub mod report_port;
pub mod tick_port;
