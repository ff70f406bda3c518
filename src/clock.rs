//! Time sources for the continuity subsystem
//!
//! Every component that needs time receives a [`SharedClock`] at
//! construction. There is no global clock.
//!
//! - `SystemClock` reads wall-clock time and a process-local monotonic timer
//! - `ManualClock` only moves when `advance` or `set_now` is called, so
//!   planning, execution and verification are reproducible in tests

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Source of wall-clock and monotonic time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;

    /// Monotonic time in seconds from an arbitrary origin.
    ///
    /// Only differences between two readings are meaningful.
    fn monotonic(&self) -> f64;
}

/// Clock shared between planner, executor, verifier and auditor.
pub type SharedClock = Arc<dyn Clock>;

/// Real time.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    /// Create a system clock whose monotonic origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Convenience constructor for the shared form.
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

#[derive(Debug, Clone, Copy)]
struct ManualState {
    now: DateTime<Utc>,
    monotonic: f64,
}

/// Manually advanced clock for deterministic tests.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ManualState>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Self::epoch())
    }
}

impl ManualClock {
    /// Create a manual clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                monotonic: 0.0,
            }),
        }
    }

    /// Fixed starting point used by `Default`: 2024-01-01T00:00:00Z.
    pub fn epoch() -> DateTime<Utc> {
        Utc.timestamp_opt(1_704_067_200, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Shared manual clock starting at the fixed epoch.
    pub fn shared() -> Arc<ManualClock> {
        Arc::new(Self::default())
    }

    /// Move both wall-clock and monotonic time forward.
    ///
    /// Negative or non-finite values are ignored; a manual clock never
    /// runs backwards.
    pub fn advance(&self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let mut state = self.lock();
        state.monotonic += seconds;
        let micros = (seconds * 1_000_000.0).round() as i64;
        state.now += Duration::microseconds(micros);
    }

    /// Jump wall-clock time without touching the monotonic timer.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.lock().now = now;
    }

    fn lock(&self) -> MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn monotonic(&self) -> f64 {
        self.lock().monotonic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_starts_at_epoch() {
        let clock = ManualClock::default();
        assert_eq!(clock.now(), ManualClock::epoch());
        assert_eq!(clock.monotonic(), 0.0);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::default();
        clock.advance(1.5);

        assert_eq!(clock.monotonic(), 1.5);
        assert_eq!(
            clock.now() - ManualClock::epoch(),
            Duration::milliseconds(1500)
        );
    }

    #[test]
    fn test_manual_clock_ignores_negative_advance() {
        let clock = ManualClock::default();
        clock.advance(-3.0);
        clock.advance(f64::NAN);

        assert_eq!(clock.monotonic(), 0.0);
        assert_eq!(clock.now(), ManualClock::epoch());
    }

    #[test]
    fn test_set_now_leaves_monotonic_alone() {
        let clock = ManualClock::default();
        clock.advance(2.0);
        clock.set_now(ManualClock::epoch());

        assert_eq!(clock.now(), ManualClock::epoch());
        assert_eq!(clock.monotonic(), 2.0);
    }

    #[test]
    fn test_system_clock_monotonic_never_decreases() {
        let clock = SystemClock::new();
        let a = clock.monotonic();
        let b = clock.monotonic();
        assert!(b >= a);
    }
}
