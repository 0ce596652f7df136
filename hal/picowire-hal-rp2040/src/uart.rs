//! Console UART
//!
//! RP2040 has two UART peripherals (UART0 and UART1). The console runs on
//! one of them through the embassy-rp buffered driver; the line format and
//! pins are fixed when the driver is created at bring-up.

use embassy_rp::pac;
use embassy_rp::uart::{self, BufferedUartRx, BufferedUartTx};
use embedded_io::{Read, ReadReady, Write};
use picowire_hal::time::wait_until;
use picowire_hal::uart::{
    DataBits, Parity, StopBits, UartConfig, UartControl, UartPins, UartRx, UartTx,
};

use crate::time::RpClock;

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

/// Direction of a GPIO on its UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartPinRole {
    Tx,
    Rx,
}

/// Determine which UART and direction a GPIO pin can serve
pub fn gpio_to_uart(gpio: u8) -> Option<(UartId, UartPinRole)> {
    // UART0: TX 0/12/16/28, RX 1/13/17/29
    // UART1: TX 4/8/20/24, RX 5/9/21/25
    match gpio {
        0 | 12 | 16 | 28 => Some((UartId::Uart0, UartPinRole::Tx)),
        1 | 13 | 17 | 29 => Some((UartId::Uart0, UartPinRole::Rx)),
        4 | 8 | 20 | 24 => Some((UartId::Uart1, UartPinRole::Tx)),
        5 | 9 | 21 | 25 => Some((UartId::Uart1, UartPinRole::Rx)),
        _ => None,
    }
}

/// UART serving a TX/RX pair, if the pair is usable together
pub fn uart_for_pins(pins: UartPins) -> Option<UartId> {
    match (gpio_to_uart(pins.tx)?, gpio_to_uart(pins.rx)?) {
        ((a, UartPinRole::Tx), (b, UartPinRole::Rx)) if a == b => Some(a),
        _ => None,
    }
}

/// Driver configuration for a console line format
pub fn uart_config(config: &UartConfig) -> uart::Config {
    let mut driver = uart::Config::default();
    driver.baudrate = config.baudrate;
    driver.data_bits = match config.data_bits {
        DataBits::Five => uart::DataBits::DataBits5,
        DataBits::Six => uart::DataBits::DataBits6,
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    driver.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    driver.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    driver
}

/// Error from the console UART
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpUartError {
    /// Receive FIFO overflowed
    Overrun,
    /// Line held low for longer than a frame
    Break,
    /// Parity check failed
    Parity,
    /// Missing stop bit
    Framing,
    /// Read returned no data
    Empty,
}

impl From<uart::Error> for RpUartError {
    fn from(e: uart::Error) -> Self {
        match e {
            uart::Error::Overrun => RpUartError::Overrun,
            uart::Error::Break => RpUartError::Break,
            uart::Error::Parity => RpUartError::Parity,
            _ => RpUartError::Framing,
        }
    }
}

/// Console transport over the split buffered UART
pub struct RpConsole {
    id: UartId,
    pins: UartPins,
    config: UartConfig,
    tx: BufferedUartTx,
    rx: BufferedUartRx,
}

impl RpConsole {
    /// Wrap the halves of a buffered UART created on `pins` with `config`
    pub fn new(
        id: UartId,
        pins: UartPins,
        config: UartConfig,
        tx: BufferedUartTx,
        rx: BufferedUartRx,
    ) -> Self {
        Self {
            id,
            pins,
            config,
            tx,
            rx,
        }
    }

    pub fn id(&self) -> UartId {
        self.id
    }

    /// Line format the driver runs with
    pub fn config(&self) -> UartConfig {
        self.config
    }

    fn regs(&self) -> pac::uart::Uart {
        match self.id {
            UartId::Uart0 => pac::UART0,
            UartId::Uart1 => pac::UART1,
        }
    }
}

impl UartTx for RpConsole {
    type Error = RpUartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), RpUartError> {
        Write::write_all(&mut self.tx, data).map_err(RpUartError::from)
    }

    fn flush(&mut self) -> Result<(), RpUartError> {
        Write::flush(&mut self.tx).map_err(RpUartError::from)
    }

    fn is_writable(&mut self) -> bool {
        !self.regs().uartfr().read().txff()
    }
}

impl UartRx for RpConsole {
    type Error = RpUartError;

    fn is_readable(&mut self) -> bool {
        self.rx.read_ready().unwrap_or(false)
    }

    fn wait_readable(&mut self, timeout_us: u32) -> bool {
        let rx = &mut self.rx;
        wait_until(&RpClock, timeout_us, || rx.read_ready().unwrap_or(false))
    }

    fn read_byte(&mut self) -> Result<u8, RpUartError> {
        let mut byte = [0u8; 1];
        match Read::read(&mut self.rx, &mut byte)? {
            0 => Err(RpUartError::Empty),
            _ => Ok(byte[0]),
        }
    }
}

impl UartControl for RpConsole {
    /// The driver was set up at bring-up; this only checks the request
    /// against it.
    fn configure(&mut self, config: &UartConfig, pins: UartPins) {
        match uart_for_pins(pins) {
            Some(id) if id == self.id && pins == self.pins => {}
            _ => warn!(
                "uart: console is {:?} on tx {} rx {}, ignoring tx {} rx {}",
                self.id,
                self.pins.tx,
                self.pins.rx,
                pins.tx,
                pins.rx
            ),
        }
        if *config != self.config {
            warn!(
                "uart: console runs at {} baud, requested {}",
                self.config.baudrate,
                config.baudrate
            );
        }
    }
}
