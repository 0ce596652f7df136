//! Time base on the embassy time driver

use embassy_time::{block_for, Duration, Instant};
use picowire_hal::time::Clock;

/// [`Clock`] reading the embassy-rp timer
///
/// Requires the `time-driver` feature of embassy-rp, which the workspace
/// enables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpClock;

impl Clock for RpClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn delay_us(&self, us: u32) {
        block_for(Duration::from_micros(u64::from(us)));
    }
}
