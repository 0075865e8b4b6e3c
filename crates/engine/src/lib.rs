//! Realized-volatility percentile-rank engine.
//!
//! Pure, synchronous computation: a chronological daily close series in,
//! a single rank in `[0.0, 100.0]` out. No I/O, no hidden state.

pub mod rank;

pub use rank::{volatility_rank, EngineError, RankConfig, TRADING_DAYS_PER_YEAR};
