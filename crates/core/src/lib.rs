//! Core types, collaborator traits, and configuration for the volsig
//! capture system.
//!
//! Everything that touches the outside world (market-data feed, trading
//! calendar, chain metadata, persistence, price history) is a trait here;
//! the capture, acquisition, and scheduling crates depend only on these
//! contracts.

pub mod config;
pub mod config_loader;
pub mod traits;
pub mod types;

pub use config::{AcquireConfig, AppConfig, CaptureConfig, SchedulerConfig};
pub use config_loader::ConfigLoader;
pub use traits::{
    ChainProvider, MarketDataFeed, PersistenceSink, PriceHistorySource, TradingCalendar,
};
pub use types::{
    ChainExpiration, ChainStrike, FetchSession, GreekSet, OptionContractSpec, OptionRecord,
    OptionRight, PriceSeries, Quote, UnderlyingSnapshot,
};
