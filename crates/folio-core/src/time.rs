//! Time abstraction
//!
//! All timestamps are milliseconds as `f64`, the unit `performance.now()`
//! hands out in the browser. Components read time through an injected
//! [`Clock`] so tests can drive them deterministically.

use std::cell::Cell;
use std::rc::Rc;

/// Milliseconds, either a timestamp or a duration
pub type Millis = f64;

/// Source of the current time
pub trait Clock {
    /// Current time in milliseconds
    fn now(&self) -> Millis;
}

/// A clock that only moves when told to
///
/// Clones share the same underlying time, so a test can keep one handle
/// and give another to the code under test.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Rc<Cell<Millis>>,
}

impl ManualClock {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time. Time never moves backwards.
    pub fn set(&self, t: Millis) {
        if t > self.now.get() {
            self.now.set(t);
        }
    }

    /// Move forward by `dt` milliseconds
    pub fn advance(&self, dt: Millis) {
        if dt > 0.0 {
            self.now.set(self.now.get() + dt);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.now.get()
    }
}

/// Clamp `value` into `[0, max]`, mapping NaN to 0
#[inline]
pub(crate) fn clamp_duration(value: Millis, max: Millis) -> Millis {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// Clamp a fraction into `[0, 1]`, mapping NaN to 0
#[inline]
pub(crate) fn clamp_fraction(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(250.0);
        assert_eq!(other.now(), 250.0);
    }

    #[test]
    fn test_manual_clock_is_monotonic() {
        let clock = ManualClock::new();
        clock.set(100.0);
        clock.set(50.0);
        clock.advance(-10.0);
        assert_eq!(clock.now(), 100.0);
    }

    #[test]
    fn test_clamps() {
        assert_eq!(clamp_duration(-5.0, 100.0), 0.0);
        assert_eq!(clamp_duration(150.0, 100.0), 100.0);
        assert_eq!(clamp_duration(f64::NAN, 100.0), 0.0);
        assert_eq!(clamp_fraction(1.0000001), 1.0);
        assert_eq!(clamp_fraction(f64::NAN), 0.0);
    }
}
