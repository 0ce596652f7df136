//! Bus-probe console
//!
//! Single-key commands typed on the serial console, each answered on the
//! console:
//!
//! - `?` help
//! - `s` scan the bus
//! - `p` look for the receiver on its known addresses
//! - `r` read one status byte from the receiver
//! - `c` step the bus clock through 10/100/400 kHz

use defmt::*;
use picowire_core::{Serial, Wire};
use picowire_hal::i2c::{I2cConfig, I2cMaster};
use picowire_hal::uart::Uart;

use crate::board;

const CLOCKS: [I2cConfig; 3] = [I2cConfig::LEGACY, I2cConfig::STANDARD, I2cConfig::FAST];

pub struct ProbeConsole {
    device: Option<u8>,
    clock: usize,
}

impl ProbeConsole {
    pub const fn new() -> Self {
        Self {
            device: None,
            clock: 0,
        }
    }

    pub fn banner<P: Uart>(&self, serial: &mut Serial<P>) {
        serial.println("Picowire bus probe");
        self.help(serial);
    }

    pub fn handle<B, P, const N: usize>(
        &mut self,
        key: u8,
        wire: &mut Wire<B, N>,
        serial: &mut Serial<P>,
    ) where
        B: I2cMaster,
        P: Uart,
    {
        match key {
            b'?' | b'h' => self.help(serial),
            b's' => self.scan(wire, serial),
            b'p' => self.find_device(wire, serial),
            b'r' => self.read_status(wire, serial),
            b'c' => self.cycle_clock(wire, serial),
            b'\r' | b'\n' | b' ' => {}
            other => {
                serial.println_fmt(format_args!("Unknown command '{}'", other as char));
            }
        }
    }

    fn help<P: Uart>(&self, serial: &mut Serial<P>) {
        serial.println("Type ? for help");
        serial.println("s: scan bus");
        serial.println("p: find receiver");
        serial.println("r: read receiver status");
        serial.println("c: next bus clock");
    }

    fn scan<B: I2cMaster, P: Uart, const N: usize>(
        &mut self,
        wire: &mut Wire<B, N>,
        serial: &mut Serial<P>,
    ) {
        let found = wire.scan();
        info!("Scan: {} devices", found.len());
        if found.is_empty() {
            serial.println("No devices found");
            return;
        }
        serial.print("Found:");
        for address in &found {
            serial.print_fmt(format_args!(" {:#04x}", address));
        }
        serial.newline();
    }

    fn find_device<B: I2cMaster, P: Uart, const N: usize>(
        &mut self,
        wire: &mut Wire<B, N>,
        serial: &mut Serial<P>,
    ) {
        self.device = wire.find_first(&board::DEVICE_ADDRESSES);
        match self.device {
            Some(address) => {
                info!("Receiver at {:#x}", address);
                serial.println_fmt(format_args!("Si47XX I2C bus address is {:#04X}", address));
            }
            None => {
                warn!("Receiver not found");
                serial.println("Si473X not found!");
            }
        }
    }

    fn read_status<B: I2cMaster, P: Uart, const N: usize>(
        &mut self,
        wire: &mut Wire<B, N>,
        serial: &mut Serial<P>,
    ) {
        let Some(address) = self.device else {
            serial.println("No receiver yet, press p first");
            return;
        };

        if wire.request_from(address, 1, true) == 0 {
            serial.println_fmt(format_args!("Read failed ({})", wire.last_error_code()));
            return;
        }
        if let Some(status) = wire.read() {
            serial.println_fmt(format_args!("Status {:#04x}", status));
        }
    }

    fn cycle_clock<B: I2cMaster, P: Uart, const N: usize>(
        &mut self,
        wire: &mut Wire<B, N>,
        serial: &mut Serial<P>,
    ) {
        self.clock = (self.clock + 1) % CLOCKS.len();
        let frequency = CLOCKS[self.clock].frequency;
        wire.set_clock(frequency);
        serial.println_fmt(format_args!("Bus clock {} Hz", frequency));
    }
}
