//! Sketch-style time calls
//!
//! `millis()` and `micros()` count from when the [`Timing`] was created and
//! wrap at `u32::MAX` the way the classic counters do, so elapsed times must
//! be taken with `wrapping_sub`.

use picowire_hal::time::Clock;

/// Uptime counters and blocking delays over a [`Clock`]
pub struct Timing<C: Clock> {
    clock: C,
    origin_us: u64,
}

impl<C: Clock> Timing<C> {
    /// Start counting from now
    pub fn new(clock: C) -> Self {
        let origin_us = clock.now_us();
        Self { clock, origin_us }
    }

    fn uptime_us(&self) -> u64 {
        self.clock.now_us().saturating_sub(self.origin_us)
    }

    /// Milliseconds since start, wrapping after about 49.7 days
    pub fn millis(&self) -> u32 {
        (self.uptime_us() / 1000) as u32
    }

    /// Microseconds since start, wrapping after about 71.6 minutes
    pub fn micros(&self) -> u32 {
        self.uptime_us() as u32
    }

    /// Block for `ms` milliseconds
    pub fn delay(&self, ms: u32) {
        let mut remaining = u64::from(ms) * 1000;
        while remaining > 0 {
            let step = remaining.min(u64::from(u32::MAX)) as u32;
            self.clock.delay_us(step);
            remaining -= u64::from(step);
        }
    }

    /// Block for `us` microseconds
    pub fn delay_microseconds(&self, us: u32) {
        if us > 0 {
            self.clock.delay_us(us);
        }
    }

    /// Milliseconds elapsed since an earlier [`Timing::millis`] reading
    pub fn millis_since(&self, start: u32) -> u32 {
        self.millis().wrapping_sub(start)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClock;

    fn timing() -> Timing<MockClock> {
        let clock = MockClock::new(0);
        clock.now_us.set(5_000_000);
        Timing::new(clock)
    }

    #[test]
    fn test_counts_from_creation() {
        let timing = timing();
        assert_eq!(timing.millis(), 0);
        assert_eq!(timing.micros(), 0);

        timing.delay(15);
        assert_eq!(timing.millis(), 15);
        assert_eq!(timing.micros(), 15_000);
    }

    #[test]
    fn test_delay_microseconds() {
        let timing = timing();
        timing.delay_microseconds(250);
        timing.delay_microseconds(0);
        assert_eq!(timing.micros(), 250);
        assert_eq!(timing.millis(), 0);
    }

    #[test]
    fn test_long_delay_split_into_chunks() {
        let timing = timing();
        // More microseconds than fit in one u32 call
        timing.delay(5_000_000);
        assert_eq!(timing.millis(), 5_000_000);
    }

    #[test]
    fn test_micros_wraps() {
        let timing = timing();
        timing.delay_microseconds(u32::MAX);
        timing.delay_microseconds(11);
        assert_eq!(timing.micros(), 10);
    }

    #[test]
    fn test_millis_since_across_wrap() {
        let timing = timing();
        let start = timing.millis().wrapping_sub(3);
        timing.delay(7);
        assert_eq!(timing.millis_since(start), 10);
    }

    #[test]
    fn test_readings_follow_clock_steps() {
        let timing = Timing::new(MockClock::new(1_500));
        // Each reading advances the fake clock
        assert_eq!(timing.millis(), 1);
        assert_eq!(timing.millis(), 3);
    }
}
