//! Time base
//!
//! Sketch code paces itself with `millis()`, `delay()` and
//! `delayMicroseconds()`, and the console read path bounds its waits by a
//! deadline. Both sit on this trait so they can run against a fake clock.

/// Monotonic microsecond clock with busy-wait delays
pub trait Clock {
    /// Microseconds since an arbitrary fixed point
    ///
    /// Never goes backwards.
    fn now_us(&self) -> u64;

    /// Block for at least `us` microseconds
    fn delay_us(&self, us: u32);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Poll `ready` until it returns true or `timeout_us` elapses on `clock`
///
/// `ready` is polled at least once, so a zero timeout is a single check.
/// Returns false when the deadline passed without `ready` succeeding.
pub fn wait_until<C, F>(clock: &C, timeout_us: u32, mut ready: F) -> bool
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    let deadline = clock.now_us().saturating_add(u64::from(timeout_us));
    loop {
        if ready() {
            return true;
        }
        if clock.now_us() >= deadline {
            return false;
        }
    }
}
