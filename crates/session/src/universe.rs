//! Symbol-universe resolution from chain metadata.
//!
//! The chain is consulted once per session; the resulting contract list is
//! the fixed universe every acquisition in that session runs against.

use chrono::NaiveDate;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use volsig_core::types::{ChainExpiration, OptionContractSpec, OptionRight};

/// How strikes are selected from the chain.
#[derive(Debug, Clone)]
pub enum StrikeSelection {
    /// Both rights for every strike in `[min, max]`.
    Range { min: Decimal, max: Decimal },
    /// Puts strictly below spot, calls strictly above, within a ±band.
    /// The at-the-money strike itself is excluded.
    BandAroundSpot { spot: Decimal, band: Decimal },
}

/// Universe filter applied to the raw chain.
#[derive(Debug, Clone)]
pub struct UniverseFilter {
    /// Expirations with DTE in `[0, max_dte]`; already-expired entries are
    /// always excluded.
    pub max_dte: i64,
    pub selection: StrikeSelection,
}

impl UniverseFilter {
    pub fn range(max_dte: i64, min: Decimal, max: Decimal) -> Self {
        Self {
            max_dte,
            selection: StrikeSelection::Range { min, max },
        }
    }

    /// Band selection around spot, `pct` as a fraction (0.02 = ±2%).
    pub fn band_around(spot: Decimal, pct: f64, max_dte: i64) -> Self {
        let pct = Decimal::from_f64(pct).unwrap_or(Decimal::ZERO);
        Self {
            max_dte,
            selection: StrikeSelection::BandAroundSpot {
                spot,
                band: spot * pct,
            },
        }
    }
}

/// Flatten a chain into the contract universe matching `filter`.
pub fn build_universe(
    chain: &[ChainExpiration],
    today: NaiveDate,
    filter: &UniverseFilter,
) -> Vec<OptionContractSpec> {
    let mut universe = Vec::new();

    for expiration in chain {
        let dte = (expiration.expiration - today).num_days();
        if dte < 0 || dte > filter.max_dte {
            debug!(expiry = %expiration.expiration, dte, "Skipping expiration");
            continue;
        }

        for strike in &expiration.strikes {
            let (want_call, want_put) = match &filter.selection {
                StrikeSelection::Range { min, max } => {
                    let within = strike.strike >= *min && strike.strike <= *max;
                    (within, within)
                }
                StrikeSelection::BandAroundSpot { spot, band } => {
                    let within =
                        strike.strike >= *spot - *band && strike.strike <= *spot + *band;
                    (within && strike.strike > *spot, within && strike.strike < *spot)
                }
            };

            if want_call {
                if let Some(symbol) = &strike.call_symbol {
                    universe.push(OptionContractSpec {
                        symbol: symbol.clone(),
                        expiry: expiration.expiration,
                        strike: strike.strike,
                        right: OptionRight::Call,
                        days_to_expiration: dte,
                    });
                }
            }
            if want_put {
                if let Some(symbol) = &strike.put_symbol {
                    universe.push(OptionContractSpec {
                        symbol: symbol.clone(),
                        expiry: expiration.expiration,
                        strike: strike.strike,
                        right: OptionRight::Put,
                        days_to_expiration: dte,
                    });
                }
            }
        }
    }

    universe
}
