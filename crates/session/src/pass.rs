//! A single capture pass: stamp a session, resolve the universe, acquire
//! quotes and greeks, assemble records, and hand them to the sink.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use volsig_core::config::AcquireConfig;
use volsig_core::traits::{ChainProvider, MarketDataFeed, PersistenceSink};
use volsig_core::types::{FetchSession, GreekSet, OptionRecord, Quote, UnderlyingSnapshot};
use volsig_feed::{acquire_greeks, acquire_quotes, acquire_underlying};

use crate::universe::{build_universe, UniverseFilter};

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The chain produced no contracts matching the filter.
    #[error("no options matched the universe filter")]
    EmptyUniverse,

    /// Band-mode universe resolution needs a spot price that never arrived.
    #[error("underlying price unavailable for {0}")]
    UnderlyingUnavailable(String),

    #[error("chain lookup failed: {0}")]
    Chain(anyhow::Error),
}

/// How the pass determines its universe.
#[derive(Debug, Clone)]
pub enum UniverseSpec {
    /// A filter known up front (explicit strike range).
    Fixed(UniverseFilter),
    /// A strike band resolved against the spot price fetched at pass start.
    BandAroundSpot { pct: f64, max_dte: i64 },
}

/// Outcome counters for one pass.
#[derive(Debug, Clone)]
pub struct CaptureSummary {
    pub session: FetchSession,
    pub underlying_mid: Option<Decimal>,
    pub universe_size: usize,
    pub quotes_resolved: usize,
    pub greeks_resolved: usize,
    pub records_stored: usize,
}

/// One full, independent data-capture pass. Holds only collaborator handles
/// and configuration; all per-pass state lives in `run`.
pub struct CapturePass {
    feed: Arc<dyn MarketDataFeed>,
    chain: Arc<dyn ChainProvider>,
    sink: Arc<dyn PersistenceSink>,
    underlying: String,
    universe: UniverseSpec,
    acquire: AcquireConfig,
}

impl CapturePass {
    pub fn new(
        feed: Arc<dyn MarketDataFeed>,
        chain: Arc<dyn ChainProvider>,
        sink: Arc<dyn PersistenceSink>,
        underlying: &str,
        universe: UniverseSpec,
        acquire: AcquireConfig,
    ) -> Self {
        Self {
            feed,
            chain,
            sink,
            underlying: underlying.to_uppercase(),
            universe,
            acquire,
        }
    }

    /// Run the pass for the given trading date. Partial data degrades to
    /// `None` fields in the stored records; only an unresolvable universe
    /// is an error.
    pub async fn run(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<CaptureSummary, CaptureError> {
        let session = FetchSession::start(&self.underlying);
        info!(
            underlying = session.underlying,
            captured_at = %session.captured_at,
            "Capture pass started"
        );

        // Underlying first: band-mode universes depend on spot, and the
        // snapshot is stored even when the options side later comes up short.
        let underlying_quote =
            acquire_underlying(&*self.feed, &self.underlying, &self.acquire, cancel).await;
        let underlying_mid = underlying_quote.as_ref().and_then(Quote::mid);

        let snapshot = UnderlyingSnapshot {
            captured_at: session.captured_at,
            symbol: session.underlying.clone(),
            quote: underlying_quote.unwrap_or_default(),
        };
        if let Err(e) = self.sink.upsert_underlying(&snapshot).await {
            error!(error = %e, "Failed to store underlying snapshot");
        }

        let filter = match &self.universe {
            UniverseSpec::Fixed(filter) => filter.clone(),
            UniverseSpec::BandAroundSpot { pct, max_dte } => {
                let spot = underlying_mid.ok_or_else(|| {
                    CaptureError::UnderlyingUnavailable(session.underlying.clone())
                })?;
                UniverseFilter::band_around(spot, *pct, *max_dte)
            }
        };

        let chain = self
            .chain
            .option_chain(&self.underlying)
            .await
            .map_err(CaptureError::Chain)?;
        let universe = build_universe(&chain, date, &filter);
        if universe.is_empty() {
            warn!(underlying = session.underlying, "No options matched the universe filter");
            return Err(CaptureError::EmptyUniverse);
        }
        info!(count = universe.len(), "Universe resolved");

        let symbols: Vec<String> = universe.iter().map(|c| c.symbol.clone()).collect();
        let quotes = acquire_quotes(&*self.feed, &symbols, &self.acquire, cancel).await;
        let greeks = acquire_greeks(&*self.feed, &symbols, &self.acquire, cancel).await;

        // Every universe entry becomes a record; unresolved quote/greek
        // lookups are stored as absent fields, never dropped rows.
        let records: Vec<OptionRecord> = universe
            .into_iter()
            .map(|contract| OptionRecord {
                captured_at: session.captured_at,
                quote: quotes.get(&contract.symbol).cloned().unwrap_or_default(),
                greeks: greeks.get(&contract.symbol).cloned().unwrap_or(GreekSet::default()),
                contract,
            })
            .collect();

        let records_stored = match self.sink.upsert_records(&records).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "Failed to store option records");
                0
            }
        };

        let summary = CaptureSummary {
            underlying_mid,
            universe_size: records.len(),
            quotes_resolved: quotes.len(),
            greeks_resolved: greeks.len(),
            records_stored,
            session,
        };
        info!(
            universe = summary.universe_size,
            quotes = summary.quotes_resolved,
            greeks = summary.greeks_resolved,
            stored = summary.records_stored,
            "Capture pass complete"
        );
        Ok(summary)
    }
}
