//! A single data-capture pass over an options chain.
//!
//! Each pass stamps a session timestamp, resolves its symbol universe from
//! chain metadata, acquires quotes and greeks through the retry layer in
//! `volsig-feed`, and upserts one record per universe entry. Unresolved
//! symbols become absent fields, never dropped rows.

pub mod pass;
pub mod signal;
pub mod universe;

pub use pass::{CaptureError, CapturePass, CaptureSummary, UniverseSpec};
pub use signal::latest_vol_rank;
pub use universe::{build_universe, StrikeSelection, UniverseFilter};
