//! Collaborator seams. Implementations live outside this workspace; the
//! capture and scheduling crates only depend on these contracts.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{
    ChainExpiration, GreekSet, OptionRecord, PriceSeries, Quote, UnderlyingSnapshot,
};

/// Real-time market-data feed. Calls are single-shot and non-blocking; the
/// retry/backoff layer lives in `volsig-feed`.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Subscribe to quote events. Re-subscribing an already-subscribed
    /// symbol is a no-op.
    async fn subscribe_quotes(&self, symbols: &[String]) -> Result<()>;

    /// Subscribe to greek events. Idempotent like `subscribe_quotes`.
    async fn subscribe_greeks(&self, symbols: &[String]) -> Result<()>;

    /// Return the quotes currently available for the given symbols. Symbols
    /// the feed has not produced a value for yet are simply not returned.
    async fn poll_quotes(&self, symbols: &[String]) -> Result<Vec<(String, Quote)>>;

    /// Return the greeks currently available for the given symbols.
    async fn poll_greeks(&self, symbols: &[String]) -> Result<Vec<(String, GreekSet)>>;
}

/// Exchange trading calendar.
#[async_trait]
pub trait TradingCalendar: Send + Sync {
    async fn is_trading_day(&self, date: NaiveDate) -> Result<bool>;

    /// Official session close for the given day, `None` on non-trading days.
    async fn session_close(&self, date: NaiveDate) -> Result<Option<DateTime<Utc>>>;
}

/// Resolves an underlying to its listed expirations and strikes as of now.
/// Consulted once per session to build the symbol universe.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn option_chain(&self, underlying: &str) -> Result<Vec<ChainExpiration>>;
}

/// Durable storage for capture output. Writes are keyed by
/// (capture timestamp, symbol) with upsert semantics, so a retried pass is
/// idempotent.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Upsert a batch of option records, best effort per record. Returns the
    /// number of records actually stored.
    async fn upsert_records(&self, records: &[OptionRecord]) -> Result<usize>;

    async fn upsert_underlying(&self, snapshot: &UnderlyingSnapshot) -> Result<()>;
}

/// Supplies the chronological daily-close history the volatility-rank
/// engine consumes.
#[async_trait]
pub trait PriceHistorySource: Send + Sync {
    async fn daily_closes(&self, symbol: &str, days: u32) -> Result<PriceSeries>;
}
