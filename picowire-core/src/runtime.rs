//! Owner of the bus and console sessions
//!
//! Exactly one `Runtime` exists per board. Application code borrows the
//! sessions from it instead of reaching for globals.

use picowire_hal::i2c::{I2cConfig, I2cMaster};
use picowire_hal::uart::{Uart, UartConfig, UartPins};

use crate::serial::{Serial, DEFAULT_TIMEOUT_MS};
use crate::wire::{Wire, BUFFER_SIZE};

/// Bytes handed to the dispatcher per [`Runtime::poll`] at most
pub const MAX_DISPATCH_PER_POLL: usize = 32;

/// Console rate used by the tuner sketches
pub const CONSOLE_BAUDRATE: u32 = 9600;

/// Settings for both sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShimConfig {
    pub bus: I2cConfig,
    pub console: UartConfig,
    pub console_pins: UartPins,
    /// Per-byte console read timeout in milliseconds
    pub console_timeout_ms: u32,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            bus: I2cConfig::default(),
            console: UartConfig::with_baudrate(CONSOLE_BAUDRATE),
            console_pins: UartPins::default(),
            console_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

pub struct Runtime<B, P, const N: usize = BUFFER_SIZE> {
    wire: Wire<B, N>,
    serial: Serial<P>,
}

impl<B: I2cMaster, P: Uart, const N: usize> Runtime<B, P, N> {
    /// Build and start both sessions
    pub fn new(bus: B, port: P, config: &ShimConfig) -> Self {
        let mut wire = Wire::with_config(bus, &config.bus);
        wire.begin();

        let mut serial = Serial::new(port);
        serial.begin_with(config.console, config.console_pins);
        serial.set_timeout(config.console_timeout_ms);

        info!(
            "runtime: bus {} Hz, console {} baud",
            config.bus.frequency, config.console.baudrate
        );

        Self { wire, serial }
    }

    pub fn wire(&mut self) -> &mut Wire<B, N> {
        &mut self.wire
    }

    pub fn serial(&mut self) -> &mut Serial<P> {
        &mut self.serial
    }

    /// Borrow both sessions at once
    pub fn split(&mut self) -> (&mut Wire<B, N>, &mut Serial<P>) {
        (&mut self.wire, &mut self.serial)
    }

    pub fn into_parts(self) -> (Wire<B, N>, Serial<P>) {
        (self.wire, self.serial)
    }

    /// Dispatch pending console input
    ///
    /// Hands each byte that is already waiting to `handler` together with
    /// both sessions. Stops when the console runs dry or after
    /// [`MAX_DISPATCH_PER_POLL`] bytes. Returns the number dispatched.
    pub fn poll<F>(&mut self, mut handler: F) -> usize
    where
        F: FnMut(u8, &mut Wire<B, N>, &mut Serial<P>),
    {
        let mut dispatched = 0;
        while dispatched < MAX_DISPATCH_PER_POLL && self.serial.available() > 0 {
            let Some(byte) = self.serial.read() else {
                break;
            };
            trace!("runtime: dispatch {:#x}", byte);
            handler(byte, &mut self.wire, &mut self.serial);
            dispatched += 1;
        }
        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{LoopbackBus, MockUart};

    type TestRuntime = Runtime<LoopbackBus, MockUart, 8>;

    fn runtime(input: &[u8]) -> TestRuntime {
        Runtime::new(
            LoopbackBus::with_devices(&[0x11]),
            MockUart::with_input(input),
            &ShimConfig::default(),
        )
    }

    #[test]
    fn test_new_applies_config() {
        let mut rt = runtime(b"");
        assert_eq!(rt.wire().bus_mut().frequency, 10_000);
        assert_eq!(rt.serial().timeout(), 1000);

        let (console, pins) = rt.serial().port_mut().configured.unwrap();
        assert_eq!(console.baudrate, 9600);
        assert_eq!(pins, UartPins::default());
    }

    #[test]
    fn test_custom_config() {
        let config = ShimConfig {
            bus: I2cConfig::FAST,
            console_timeout_ms: 50,
            ..ShimConfig::default()
        };
        let mut rt: TestRuntime =
            Runtime::new(LoopbackBus::default(), MockUart::default(), &config);
        assert_eq!(rt.wire().bus_mut().frequency, 400_000);
        assert_eq!(rt.serial().timeout(), 50);
    }

    #[test]
    fn test_poll_dispatches_pending_bytes() {
        let mut rt = runtime(b"ab");
        let mut seen = Vec::new();
        assert_eq!(rt.poll(|byte, _, _| seen.push(byte)), 2);
        assert_eq!(seen, b"ab");

        // Nothing left; no read is attempted
        assert_eq!(rt.poll(|_, _, _| unreachable!()), 0);
        assert_eq!(rt.serial().port_mut().waits.len(), 2);
    }

    #[test]
    fn test_poll_is_bounded() {
        let input = [b'x'; MAX_DISPATCH_PER_POLL + 5];
        let mut rt = runtime(&input);
        assert_eq!(rt.poll(|_, _, _| {}), MAX_DISPATCH_PER_POLL);
        assert_eq!(rt.poll(|_, _, _| {}), 5);
    }

    #[test]
    fn test_handler_drives_both_sessions() {
        let mut rt = runtime(b"w");
        rt.poll(|byte, wire, serial| {
            if byte == b'w' {
                wire.begin_transmission(0x11);
                wire.write_bytes(&[0x30, 0x41]);
                let ok = wire.end_transmission_stop().is_ok();
                serial.println(if ok { "ACK" } else { "NACK" });
            }
        });

        let (mut wire, serial) = rt.into_parts();
        assert_eq!(wire.bus_mut().committed.len(), 1);
        assert_eq!(wire.bus_mut().committed[0].data, [0x30, 0x41]);
        assert_eq!(serial.release().output(), b"ACK\r\n");
    }
}
