//! RP2040 implementation of the Picowire HAL
//!
//! Provides the `picowire-hal` traits on top of embassy-rp:
//!
//! - [`RpI2c`]: blocking, timeout-bounded I2C transfers, each ending with
//!   a stop
//! - [`RpConsole`]: console on a buffered UART
//! - [`RpOutput`]: plain GPIO output (device reset line)
//! - [`RpClock`]: microsecond time base on the embassy time driver
//!
//! Plus the RP2040 pin-to-peripheral tables used to validate board wiring.

#![cfg_attr(not(test), no_std)]

// Must come first so the macros are visible to the other modules
mod fmt;

pub mod gpio;
pub mod i2c;
pub mod time;
pub mod uart;

pub use gpio::RpOutput;
pub use i2c::{gpio_to_i2c, i2c_config, i2c_for_pins, I2cId, RpI2c, RpI2cError};
pub use time::RpClock;
pub use uart::{gpio_to_uart, uart_config, uart_for_pins, RpConsole, RpUartError, UartId};
