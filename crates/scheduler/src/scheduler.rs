//! Session scheduler: gates on the trading calendar, fires capture jobs at
//! their scheduled local times, and shuts down after the close.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::US::Eastern;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use volsig_core::config::{AcquireConfig, SchedulerConfig};
use volsig_core::traits::{MarketDataFeed, PersistenceSink, TradingCalendar};
use volsig_core::types::UnderlyingSnapshot;
use volsig_feed::acquire_underlying;
use volsig_session::CapturePass;

use crate::schedule::{JobKind, Schedule, ScheduleEntry};

/// Observable lifecycle of a scheduled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    NotStarted,
    WaitingForOpen,
    Active,
    Shutdown,
}

pub struct SessionScheduler {
    config: SchedulerConfig,
    schedule: Schedule,
    calendar: Arc<dyn TradingCalendar>,
    pass: Arc<CapturePass>,
    feed: Arc<dyn MarketDataFeed>,
    sink: Arc<dyn PersistenceSink>,
    underlying: String,
    acquire: AcquireConfig,
    cancel: CancellationToken,
    /// Non-reentrant guard: at most one invocation in flight.
    guard: Arc<tokio::sync::Mutex<()>>,
    state: Mutex<SchedulerState>,
}

impl SessionScheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SchedulerConfig,
        schedule: Schedule,
        calendar: Arc<dyn TradingCalendar>,
        pass: Arc<CapturePass>,
        feed: Arc<dyn MarketDataFeed>,
        sink: Arc<dyn PersistenceSink>,
        underlying: &str,
        acquire: AcquireConfig,
    ) -> Self {
        Self {
            config,
            schedule,
            calendar,
            pass,
            feed,
            sink,
            underlying: underlying.to_uppercase(),
            acquire,
            cancel: CancellationToken::new(),
            guard: Arc::new(tokio::sync::Mutex::new(())),
            state: Mutex::new(SchedulerState::NotStarted),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.state.lock().expect("scheduler state lock")
    }

    /// Token observed by in-flight acquisition waits; cancelling it halts
    /// future invocations and interrupts pending polls.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Request shutdown: no further invocations are started; an invocation
    /// already in progress drains gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Run one trading session for `date`, in Eastern time.
    ///
    /// Returns without work on non-trading days. Otherwise fires each
    /// schedule entry at its local time until the close-plus-grace deadline
    /// passes, the schedule is exhausted, or shutdown is requested.
    pub async fn run(&self, date: NaiveDate) -> Result<()> {
        let trading = self
            .calendar
            .is_trading_day(date)
            .await
            .context("trading-day lookup failed")?;
        if !trading {
            info!(%date, "Market closed today; exiting");
            self.set_state(SchedulerState::Shutdown);
            return Ok(());
        }

        let close = self
            .calendar
            .session_close(date)
            .await
            .context("session-close lookup failed")?;
        let Some(close) = close else {
            info!(%date, "No session close reported; treating day as non-trading");
            self.set_state(SchedulerState::Shutdown);
            return Ok(());
        };
        let deadline = close + Duration::minutes(self.config.close_grace_mins);
        self.set_state(SchedulerState::WaitingForOpen);
        info!(%date, %deadline, jobs = self.schedule.len(), "Session scheduled");

        let now_local = Utc::now().with_timezone(&Eastern).time();
        let mut cursor = self.schedule.first_index_after(now_local);

        while cursor < self.schedule.len() {
            let entry = self.schedule.entries()[cursor];
            cursor += 1;

            let Some(fire_at) = local_instant(date, entry.at) else {
                warn!(at = %entry.at, "Skipping unrepresentable local time");
                continue;
            };
            if fire_at > deadline {
                info!(at = %entry.at, "Next entry is past the shutdown deadline");
                break;
            }

            let wait = (fire_at - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Shutdown requested; halting scheduled invocations");
                    break;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            if self.state() != SchedulerState::Active {
                self.set_state(SchedulerState::Active);
            }
            self.fire(entry, date);
        }

        // Graceful drain: wait out any invocation still in flight.
        let _drain = self.guard.lock().await;
        self.set_state(SchedulerState::Shutdown);
        info!("Session scheduler stopped");
        Ok(())
    }

    /// Run today's session (Eastern calendar date).
    pub async fn run_today(&self) -> Result<()> {
        let today = Utc::now().with_timezone(&Eastern).date_naive();
        self.run(today).await
    }

    /// Start `entry` unless the previous invocation is still in flight, in
    /// which case the fire is skipped — never queued.
    fn fire(&self, entry: ScheduleEntry, date: NaiveDate) {
        let Ok(permit) = self.guard.clone().try_lock_owned() else {
            warn!(job = ?entry.job, at = %entry.at, "Previous invocation still in flight; skipping");
            return;
        };

        let pass = self.pass.clone();
        let feed = self.feed.clone();
        let sink = self.sink.clone();
        let underlying = self.underlying.clone();
        let acquire = self.acquire.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let _permit = permit;
            match entry.job {
                JobKind::Capture => {
                    // A failed pass must not prevent later fires.
                    if let Err(e) = pass.run(date, &cancel).await {
                        error!(error = %e, at = %entry.at, "Capture pass failed");
                    }
                }
                JobKind::UnderlyingPrice => {
                    capture_underlying(&*feed, &*sink, &underlying, &acquire, &cancel).await;
                }
            }
        });
    }

    fn set_state(&self, state: SchedulerState) {
        *self.state.lock().expect("scheduler state lock") = state;
    }
}

/// Spot-only capture: one underlying quote, stored as a snapshot.
async fn capture_underlying(
    feed: &dyn MarketDataFeed,
    sink: &dyn PersistenceSink,
    underlying: &str,
    acquire: &AcquireConfig,
    cancel: &CancellationToken,
) {
    match acquire_underlying(feed, underlying, acquire, cancel).await {
        Some(quote) => {
            let snapshot = UnderlyingSnapshot {
                captured_at: Utc::now(),
                symbol: underlying.to_string(),
                quote,
            };
            info!(symbol = underlying, mid = ?snapshot.mid(), "Underlying price captured");
            if let Err(e) = sink.upsert_underlying(&snapshot).await {
                error!(error = %e, "Failed to store underlying snapshot");
            }
        }
        None => warn!(symbol = underlying, "No underlying quote within attempt budget"),
    }
}

/// Resolve an Eastern wall-clock time on `date` to a UTC instant. `None`
/// for times that do not exist or are ambiguous on that day (DST edges).
fn local_instant(date: NaiveDate, at: NaiveTime) -> Option<DateTime<Utc>> {
    Eastern
        .from_local_datetime(&date.and_time(at))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
