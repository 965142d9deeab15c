//! Core domain types and the backtest engine.

pub mod reading;
pub mod price;
pub mod signal;
pub mod strategy;
pub mod filter;
pub mod trade;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod settings;
pub mod analyzer;
pub mod config_validation;
pub mod error;
