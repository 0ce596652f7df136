//! Board-agnostic Serial and Wire adapters
//!
//! Gives ported tuner-control sketches the two sessions they expect:
//!
//! - [`Wire`]: staged I2C master transfers with fixed-capacity buffers,
//!   silent truncation on overrun and a bounded-time receive path
//! - [`Serial`]: a console with per-byte read timeouts and text output
//! - [`Runtime`]: owns one of each and dispatches console input
//! - [`Timing`]: `millis`/`micros` uptime counters and blocking delays
//! - [`HeldWriteBus`]: repeated-start writes on controllers that stop after
//!   every transfer
//!
//! Hardware access goes through the `picowire-hal` traits; the RP2040
//! implementations live in `picowire-hal-rp2040`.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// Must come first so the macros are visible to the other modules
mod fmt;

pub mod buffer;
pub mod held;
pub mod print;
pub mod runtime;
pub mod serial;
pub mod timing;
pub mod wire;

#[cfg(test)]
mod mock;

pub use buffer::{Append, RxBuffer, TxBuffer};
pub use held::HeldWriteBus;
pub use print::Printable;
pub use runtime::{Runtime, ShimConfig};
pub use serial::Serial;
pub use timing::Timing;
pub use wire::Wire;
