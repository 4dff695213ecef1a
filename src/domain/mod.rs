//! Core domain types and logic.

pub mod append_log;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod manual;
pub mod position;
pub mod report;
pub mod sentiment;
pub mod tick;
