//! Declarative intraday schedule: a sorted list of (time-of-day, job)
//! entries evaluated against an exchange-local clock. No cron strings.

use chrono::NaiveTime;

/// The two kinds of scheduled work in a trading session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// A full capture pass (universe, quotes, greeks, records).
    Capture,
    /// Spot-only underlying price capture.
    UnderlyingPrice,
}

/// One scheduled invocation. Times are exchange-local (US Eastern).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub at: NaiveTime,
    pub job: JobKind,
}

/// A fixed, enumerable set of times-of-day. Entries are kept sorted; equal
/// times are allowed (a capture and a price job may share a slot).
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn new(mut entries: Vec<ScheduleEntry>) -> Self {
        entries.sort_by_key(|e| e.at);
        Self { entries }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the first entry strictly after `t`; `len()` when none is.
    pub fn first_index_after(&self, t: NaiveTime) -> usize {
        self.entries.partition_point(|e| e.at <= t)
    }

    /// The standard SPX capture day:
    /// - capture passes at 9:40, 9:50, every 10 minutes from 10:00 through
    ///   15:50, and at the 16:00 close;
    /// - underlying price every minute from 9:30 through 16:00.
    pub fn standard_day() -> Self {
        let mut entries = Vec::new();

        let time = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("valid schedule time");

        entries.push(ScheduleEntry { at: time(9, 40), job: JobKind::Capture });
        entries.push(ScheduleEntry { at: time(9, 50), job: JobKind::Capture });
        for hour in 10..16 {
            for minute in (0..60).step_by(10) {
                entries.push(ScheduleEntry {
                    at: time(hour, minute),
                    job: JobKind::Capture,
                });
            }
        }
        entries.push(ScheduleEntry { at: time(16, 0), job: JobKind::Capture });

        for minute in 30..60 {
            entries.push(ScheduleEntry {
                at: time(9, minute),
                job: JobKind::UnderlyingPrice,
            });
        }
        for hour in 10..16 {
            for minute in 0..60 {
                entries.push(ScheduleEntry {
                    at: time(hour, minute),
                    job: JobKind::UnderlyingPrice,
                });
            }
        }
        entries.push(ScheduleEntry {
            at: time(16, 0),
            job: JobKind::UnderlyingPrice,
        });

        Self::new(entries)
    }
}
