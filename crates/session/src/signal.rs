//! Volatility-regime signal derived from stored price history.

use anyhow::{Context, Result};
use tracing::info;

use volsig_core::traits::PriceHistorySource;
use volsig_engine::{volatility_rank, RankConfig};

/// Compute the current volatility rank for `symbol` from its daily-close
/// history. Requests enough history for a full lookback; a shorter series
/// degrades inside the engine, and one too short for a single volatility
/// reading surfaces as an error.
pub async fn latest_vol_rank(
    history: &dyn PriceHistorySource,
    symbol: &str,
    config: &RankConfig,
) -> Result<f64> {
    let days = (config.lookback + config.short_window) as u32;
    let series = history
        .daily_closes(symbol, days)
        .await
        .context("price-history lookup failed")?;

    let rank = volatility_rank(series.as_slice(), config)?;
    info!(symbol, samples = series.len(), rank, "Volatility rank computed");
    Ok(rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use volsig_core::types::PriceSeries;
    use volsig_engine::EngineError;

    struct FixedHistory {
        series: Vec<f64>,
    }

    #[async_trait]
    impl PriceHistorySource for FixedHistory {
        async fn daily_closes(&self, _symbol: &str, _days: u32) -> anyhow::Result<PriceSeries> {
            Ok(PriceSeries::new(self.series.clone()))
        }
    }

    #[tokio::test]
    async fn flat_history_ranks_zero() {
        let history = FixedHistory {
            series: vec![100.0; 365],
        };
        let rank = latest_vol_rank(&history, "SPX", &RankConfig::default())
            .await
            .unwrap();
        assert_eq!(rank, 0.0);
    }

    #[tokio::test]
    async fn too_short_history_surfaces_engine_error() {
        let history = FixedHistory {
            series: vec![100.0; 5],
        };
        let err = latest_vol_rank(&history, "SPX", &RankConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::InsufficientData { .. })
        ));
    }
}
