//! Core types for options-chain capture.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// A point-in-time quote for one streamer symbol.
///
/// Both sides are optional: a side the feed has not reported yet is `None`.
/// A quoted price of zero is a real value, never "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
}

impl Quote {
    pub fn new(bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        Self { bid, ask }
    }

    /// Mid price: mean of bid/ask when both sides are present, the single
    /// present side otherwise, `None` when neither side has been observed.
    pub fn mid(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(b), Some(a)) => Some((b + a) / Decimal::from(2)),
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        }
    }
}

/// Analytic greeks for one streamer symbol. Each field is independently
/// optional; theta and rho are routinely negative, so absence must never be
/// encoded as a sentinel number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GreekSet {
    pub delta: Option<f64>,
    pub gamma: Option<f64>,
    pub theta: Option<f64>,
    pub vega: Option<f64>,
    pub rho: Option<f64>,
    /// Implied volatility.
    pub iv: Option<f64>,
}

/// One entry of the resolved option universe for a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionContractSpec {
    /// Streamer symbol used for quote/greek subscriptions.
    pub symbol: String,
    pub expiry: NaiveDate,
    pub strike: Decimal,
    pub right: OptionRight,
    pub days_to_expiration: i64,
}

impl OptionContractSpec {
    /// Human-readable description (e.g., "SPXW 5900P 2026-09-19").
    pub fn display_name(&self) -> String {
        format!("{} {}{} {}", self.symbol, self.strike, self.right, self.expiry)
    }
}

/// A persisted option observation, one per (capture timestamp, symbol).
/// Re-capturing the same key overwrites (upsert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionRecord {
    pub captured_at: DateTime<Utc>,
    pub contract: OptionContractSpec,
    pub quote: Quote,
    pub greeks: GreekSet,
}

impl OptionRecord {
    pub fn mid(&self) -> Option<Decimal> {
        self.quote.mid()
    }
}

/// Underlying price observation taken at the start of a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnderlyingSnapshot {
    pub captured_at: DateTime<Utc>,
    pub symbol: String,
    pub quote: Quote,
}

impl UnderlyingSnapshot {
    pub fn mid(&self) -> Option<Decimal> {
        self.quote.mid()
    }
}

/// One logical data-capture pass. The timestamp is assigned once at the
/// start of the pass and shared by every record the pass produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSession {
    pub captured_at: DateTime<Utc>,
    pub underlying: String,
}

impl FetchSession {
    pub fn start(underlying: &str) -> Self {
        Self {
            captured_at: Utc::now(),
            underlying: underlying.to_uppercase(),
        }
    }
}

/// Chronologically ordered daily closes, one sample per trading day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries(Vec<f64>);

impl PriceSeries {
    pub fn new(prices: Vec<f64>) -> Self {
        Self(prices)
    }

    pub fn push(&mut self, price: f64) {
        self.0.push(price);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn latest(&self) -> Option<f64> {
        self.0.last().copied()
    }
}

impl From<Vec<f64>> for PriceSeries {
    fn from(prices: Vec<f64>) -> Self {
        Self(prices)
    }
}

/// One expiration of an option chain as reported by the chain provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainExpiration {
    pub expiration: NaiveDate,
    pub strikes: Vec<ChainStrike>,
}

/// One strike row of a chain expiration. A side without a listed contract
/// has no streamer symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStrike {
    pub strike: Decimal,
    pub call_symbol: Option<String>,
    pub put_symbol: Option<String>,
}
