//! Side-effecting adapters for the macro engine.

pub mod automation;
pub mod config;
pub mod ocr;
pub mod process;
pub mod stats_store;
