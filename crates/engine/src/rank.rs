//! Rolling realized-volatility percentile rank.
//!
//! Given a chronological daily close series, computes where the most recent
//! short-window realized volatility stands relative to its own trailing
//! distribution, expressed 0–100.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trading days per year, used for annualization and the default lookback.
pub const TRADING_DAYS_PER_YEAR: usize = 252;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    /// Not enough prices to produce a single volatility reading. The engine
    /// refuses rather than computing a meaningless rank on a partial window.
    #[error("insufficient price history: need at least {required} samples, got {got}")]
    InsufficientData { required: usize, got: usize },

    /// A non-positive or non-finite price makes the return series undefined.
    #[error("non-positive price {price} at index {index}")]
    NonPositivePrice { index: usize, price: f64 },

    /// `short_window` must cover at least two returns.
    #[error("short_window must be >= 2, got {0}")]
    WindowTooSmall(usize),
}

/// Rank computation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankConfig {
    /// Returns per realized-volatility reading (trading days).
    pub short_window: usize,
    /// Maximum volatility readings the rank is taken over.
    pub lookback: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            short_window: 20,
            lookback: TRADING_DAYS_PER_YEAR,
        }
    }
}

impl RankConfig {
    /// Minimum number of prices required for one volatility reading.
    pub fn min_prices(&self) -> usize {
        self.short_window + 1
    }
}

/// Percentile rank of the latest realized-volatility reading within its
/// trailing distribution, in `[0.0, 100.0]`.
///
/// Realized volatility is the population standard deviation of the trailing
/// `short_window` simple daily returns, annualized by `sqrt(252)`. The rank
/// uses the strict-less convention: ties count against the rank, so a
/// perfectly flat series yields exactly `0.0`.
///
/// Series shorter than a full `lookback` degrade gracefully (the rank is
/// taken over whatever volatility history exists); series too short for a
/// single reading are refused with [`EngineError::InsufficientData`].
///
/// Pure function: identical input always yields the identical rank.
pub fn volatility_rank(prices: &[f64], config: &RankConfig) -> Result<f64, EngineError> {
    if config.short_window < 2 {
        return Err(EngineError::WindowTooSmall(config.short_window));
    }
    if prices.len() < config.min_prices() {
        return Err(EngineError::InsufficientData {
            required: config.min_prices(),
            got: prices.len(),
        });
    }
    if let Some(index) = prices.iter().position(|&p| p <= 0.0 || !p.is_finite()) {
        return Err(EngineError::NonPositivePrice {
            index,
            price: prices[index],
        });
    }

    // Day-over-day simple returns, length N-1.
    let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();

    let annualization = (TRADING_DAYS_PER_YEAR as f64).sqrt();
    let vols: Vec<f64> = returns
        .windows(config.short_window)
        .map(|w| std_dev(w) * annualization)
        .collect();

    let start = vols.len().saturating_sub(config.lookback);
    let window = &vols[start..];
    let latest = match window.last() {
        Some(&v) => v,
        None => {
            // Unreachable given the min_prices check, but refuse explicitly
            // rather than index.
            return Err(EngineError::InsufficientData {
                required: config.min_prices(),
                got: prices.len(),
            });
        }
    };

    let below = window.iter().filter(|&&v| v < latest).count();
    Ok(100.0 * below as f64 / window.len() as f64)
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
