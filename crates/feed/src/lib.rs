//! Quote/greek acquisition over an eventually-consistent market-data feed.
//!
//! Subscribes once per symbol set, then polls with a bounded retry budget
//! and a cancellable backoff sleep. Symbols the feed never produces are
//! reported as absent, not as errors.

pub mod acquire;

pub use acquire::{acquire_greeks, acquire_quotes, acquire_underlying};
