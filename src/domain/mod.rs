//! Core domain types and logic.

pub mod ohlcv;
pub mod ledger;
pub mod signal;
pub mod indicator;
pub mod params;
pub mod strategy;
pub mod backtest;
pub mod metrics;
pub mod grid_search;
pub mod config_validation;
pub mod error;
