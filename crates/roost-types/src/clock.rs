//! Time source abstraction.
//!
//! Timeouts are enforced by comparing timestamps, never by sleeping, so
//! every component takes "now" from a [`Clock`]. Tests drive time with
//! [`ManualClock`].

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// `true` if strictly more than `window` has passed between `since` and `now`.
///
/// A `now` earlier than `since` (clock skew) counts as no time elapsed.
#[must_use]
pub fn elapsed_exceeds(since: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    (now - since).to_std().is_ok_and(|elapsed| elapsed > window)
}

#[cfg(any(test, feature = "test-helpers"))]
pub use manual::ManualClock;

#[cfg(any(test, feature = "test-helpers"))]
mod manual {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};

    use super::Clock;

    /// A clock that only moves when told to. **Never use in production.**
    #[derive(Debug)]
    pub struct ManualClock {
        millis: AtomicI64,
    }

    impl ManualClock {
        #[must_use]
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                millis: AtomicI64::new(start.timestamp_millis()),
            }
        }

        /// Starts at the current real time.
        #[must_use]
        pub fn starting_now() -> Self {
            Self::new(Utc::now())
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        pub fn advance(&self, by: Duration) {
            self.millis.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(self.millis.load(Ordering::SeqCst))
                .single()
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_exceeds_is_strict() {
        let t0 = Utc::now();
        let window = Duration::from_secs(10);
        assert!(!elapsed_exceeds(t0, t0 + chrono::Duration::seconds(10), window));
        assert!(elapsed_exceeds(
            t0,
            t0 + chrono::Duration::milliseconds(10_001),
            window
        ));
    }

    #[test]
    fn negative_elapsed_never_exceeds() {
        let t0 = Utc::now();
        assert!(!elapsed_exceeds(
            t0,
            t0 - chrono::Duration::hours(1),
            Duration::ZERO
        ));
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_now();
        let before = clock.now();
        clock.advance(Duration::from_secs(301));
        assert_eq!((clock.now() - before).num_seconds(), 301);
    }
}
