//! Run scheduling and retry policy.

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How often a failed stage is re-invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Total attempts a stage gets, first one included.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            delay: Duration::from_secs(180),
        }
    }
}

/// Once-a-day trigger at a fixed UTC wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
}

impl DailySchedule {
    pub fn new(time: NaiveTime) -> Self {
        Self { time }
    }

    /// The first trigger strictly after `now`.
    ///
    /// Triggers that passed while nothing was waiting are never returned.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.time).and_utc();
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self {
            time: NaiveTime::from_hms_opt(23, 30, 0).unwrap_or_default(),
        }
    }
}

impl FromStr for DailySchedule {
    type Err = String;

    /// Parse `HH:MM` (UTC).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|e| format!("invalid schedule time {:?} (expected HH:MM): {}", s, e))
    }
}

impl fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} UTC", self.time.format("%H:%M"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_next_after_before_daily_time() {
        let schedule = DailySchedule::default();

        assert_eq!(
            schedule.next_after(at(2024, 3, 10, 8, 0, 0)),
            at(2024, 3, 10, 23, 30, 0)
        );
    }

    #[test]
    fn test_next_after_at_or_past_daily_time() {
        let schedule = DailySchedule::default();

        assert_eq!(
            schedule.next_after(at(2024, 3, 10, 23, 30, 0)),
            at(2024, 3, 11, 23, 30, 0)
        );
        assert_eq!(
            schedule.next_after(at(2024, 3, 10, 23, 45, 0)),
            at(2024, 3, 11, 23, 30, 0)
        );
    }

    #[test]
    fn test_next_after_crosses_month_end() {
        let schedule: DailySchedule = "06:15".parse().unwrap();

        assert_eq!(
            schedule.next_after(at(2024, 2, 29, 7, 0, 0)),
            at(2024, 3, 1, 6, 15, 0)
        );
    }

    #[test]
    fn test_parse_schedule() {
        let schedule: DailySchedule = "23:30".parse().unwrap();
        assert_eq!(schedule, DailySchedule::default());
        assert_eq!(schedule.to_string(), "23:30 UTC");

        assert!("24:00".parse::<DailySchedule>().is_err());
        assert!("half past eleven".parse::<DailySchedule>().is_err());
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.retries, 1);
        assert_eq!(policy.max_attempts(), 2);
        assert_eq!(policy.delay, Duration::from_secs(180));
    }
}
