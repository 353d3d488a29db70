//! # Time model shared by every scheduler.
//!
//! [`Timestamp`] is an absolute point in time stored as an offset from an
//! epoch: the Unix epoch for real schedulers, an arbitrary zero for virtual
//! ones. A virtual clock may be driven in float "ticks" (seconds) or in
//! timestamps; both go through the same conversions.
//!
//! `Timestamp::now()` reads a monotonic clock anchored to the wall clock at
//! first use, so successive reads never go backwards even if the system clock
//! is adjusted.

use std::ops::{Add, AddAssign, Sub};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// Absolute time as an offset from the epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(Duration);

struct Anchor {
    wall: Duration,
    mono: Instant,
}

static ANCHOR: OnceLock<Anchor> = OnceLock::new();

impl Timestamp {
    /// The epoch itself.
    pub const EPOCH: Timestamp = Timestamp(Duration::ZERO);

    /// Current wall-clock time, monotonic across calls.
    #[must_use]
    pub fn now() -> Self {
        let anchor = ANCHOR.get_or_init(|| Anchor {
            wall: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
            mono: Instant::now(),
        });
        Timestamp(anchor.wall + anchor.mono.elapsed())
    }

    #[must_use]
    pub const fn from_duration(since_epoch: Duration) -> Self {
        Timestamp(since_epoch)
    }

    #[must_use]
    pub const fn as_duration(&self) -> Duration {
        self.0
    }

    /// Builds a timestamp from float seconds (ticks). Negative or NaN clamps to the epoch.
    #[must_use]
    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(to_duration(secs))
    }

    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    /// Converts to a UTC calendar time (Unix epoch assumed).
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let secs = i64::try_from(self.0.as_secs()).unwrap_or(i64::MAX);
        DateTime::<Utc>::from_timestamp(secs, self.0.subsec_nanos())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Converts from a UTC calendar time; instants before 1970 clamp to the epoch.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        match u64::try_from(dt.timestamp()) {
            Ok(secs) => Timestamp(Duration::new(secs, dt.timestamp_subsec_nanos())),
            Err(_) => Timestamp::EPOCH,
        }
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is later.
    #[must_use]
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }

    #[must_use]
    pub fn saturating_sub(&self, d: Duration) -> Timestamp {
        Timestamp(self.0.saturating_sub(d))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs))
    }
}

impl AddAssign<Duration> for Timestamp {
    fn add_assign(&mut self, rhs: Duration) {
        self.0 = self.0.saturating_add(rhs);
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        self.saturating_sub(rhs)
    }
}

/// Duration as float seconds.
#[must_use]
pub fn to_seconds(d: Duration) -> f64 {
    d.as_secs_f64()
}

/// Float seconds as a duration; negative, NaN or overflowing input clamps.
#[must_use]
pub fn to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_monotonic() {
        let a = Timestamp::now();
        let b = Timestamp::now();
        assert!(b >= a);
        assert!(a > Timestamp::EPOCH);
    }

    #[test]
    fn test_tick_conversions() {
        let t = Timestamp::from_secs_f64(10.5);
        assert_eq!(t.as_duration(), Duration::from_millis(10_500));
        assert_eq!(t.as_secs_f64(), 10.5);
        assert_eq!(Timestamp::from_secs_f64(-3.0), Timestamp::EPOCH);
        assert_eq!(to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(to_seconds(Duration::from_millis(250)), 0.25);
    }

    #[test]
    fn test_datetime_round_trip() {
        let t = Timestamp::from_duration(Duration::new(1_700_000_000, 123));
        let dt = t.to_datetime();
        assert_eq!(dt.timestamp(), 1_700_000_000);
        assert_eq!(Timestamp::from_datetime(dt), t);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let t = Timestamp::from_secs_f64(1.0);
        assert_eq!(t - Duration::from_secs(5), Timestamp::EPOCH);
        assert_eq!(
            (t + Duration::from_secs(2)).saturating_duration_since(t),
            Duration::from_secs(2)
        );
        assert_eq!(t.saturating_duration_since(t + Duration::from_secs(1)), Duration::ZERO);
    }
}
