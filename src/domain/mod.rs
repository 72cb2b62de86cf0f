//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod signal;
pub mod instrument;
pub mod position;
pub mod market_clock;
pub mod backtest;
pub mod metrics;
pub mod scenario;
pub mod config_validation;
pub mod error;
