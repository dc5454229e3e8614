//! WaveTrend crossover scanner with stochastic RSI confirmation and
//! at-most-once alert delivery.

pub mod cache;
pub mod common;
pub mod config;
pub mod core;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod signals;
