//! Board wiring and clock constants
//!
//! Raspberry Pi Pico carrying an Si473x receiver: bus on I2C0, console on
//! UART0, receiver reference clock generated by PWM.

/// I2C0 SDA
pub const BUS_SDA_PIN: u8 = 4;
/// I2C0 SCL
pub const BUS_SCL_PIN: u8 = 5;

/// UART0 TX
pub const CONSOLE_TX_PIN: u8 = 0;
/// UART0 RX
pub const CONSOLE_RX_PIN: u8 = 1;

/// Receiver reset line, active low
pub const RESET_PIN: u8 = 6;

/// Reset held low for this long at power-up
pub const RESET_PULSE_MS: u32 = 10;
/// Settling time after reset is released, before the first bus access
pub const RESET_SETTLE_MS: u32 = 10;

/// Receiver reference clock output (PWM slice 4, channel B)
pub const RADIO_CLOCK_PIN: u8 = 9;

pub const SYSTEM_CLOCK_HZ: u32 = 125_000_000;

/// Reference clock fed to the receiver
pub const RADIO_CLOCK_HZ: u32 = 131_000;

/// PWM wrap value giving [`RADIO_CLOCK_HZ`] from the undivided system clock
pub const RADIO_CLOCK_TOP: u16 = (SYSTEM_CLOCK_HZ / RADIO_CLOCK_HZ) as u16;

/// Addresses the receiver answers on, depending on its SEN pin
pub const DEVICE_ADDRESSES: [u8; 2] = [0x11, 0x63];

/// Idle time between console polls
pub const POLL_INTERVAL_MS: u64 = 10;
