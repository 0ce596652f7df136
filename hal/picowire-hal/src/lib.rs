//! Picowire Hardware Abstraction Layer
//!
//! This crate defines the peripheral traits the `Serial` and `Wire`
//! adapters in `picowire-core` are written against. Chip-specific HALs
//! implement them, which keeps the adapter semantics (buffering, timeouts,
//! partial failure) independent of the peripheral driver underneath.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Sketch code (tuner driver, dispatcher) │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  picowire-core (Serial, Wire, Runtime)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  picowire-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ picowire-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital output (device reset line)
//! - [`uart::UartTx`], [`uart::UartRx`], [`uart::UartControl`] - Serial console transport
//! - [`i2c::I2cMaster`] - Two-wire bus master with timeout-bounded reads
//! - [`i2c::StopTransfers`] - Controllers that release the bus after every transfer
//! - [`time::Clock`] - Microsecond time base and busy-wait delays

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use i2c::{ErrorKind, I2cConfig, I2cMaster, StopTransfers};
pub use time::Clock;
pub use uart::{Uart, UartConfig, UartControl, UartPins, UartRx, UartTx};
