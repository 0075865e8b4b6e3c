use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Underlying index symbol (e.g., "SPX").
    pub underlying: String,
    pub acquire: AcquireConfig,
    pub capture: CaptureConfig,
    pub scheduler: SchedulerConfig,
}

/// Retry budget for the quote/greek acquisition loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Maximum polling attempts before giving up on unresolved symbols.
    pub max_attempts: u32,
    /// Delay between polling attempts (seconds).
    pub poll_interval_secs: u64,
}

impl AcquireConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Universe selection defaults for a capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Maximum days to expiration for chain entries.
    pub max_dte: i64,
    /// Half-width of the strike band around spot, as a fraction (0.02 = ±2%).
    pub band_pct: f64,
}

/// Session scheduling parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes after the official close at which the session shuts down.
    pub close_grace_mins: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            underlying: "SPX".to_string(),
            acquire: AcquireConfig::default(),
            capture: CaptureConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            poll_interval_secs: 5,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_dte: 7,
            band_pct: 0.02,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { close_grace_mins: 5 }
    }
}
