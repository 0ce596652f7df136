//! UART serial communication abstractions
//!
//! Blocking console transport. Reads are never issued blind: the adapter
//! first waits (bounded) for the receiver to become readable, so a silent
//! line can never hang the control loop.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error: core::fmt::Debug;

    /// Write data to the UART
    ///
    /// Blocks until all data has been queued or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until all queued data has left the transmitter
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Whether the transmitter can accept another byte without blocking
    fn is_writable(&mut self) -> bool;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error: core::fmt::Debug;

    /// Whether at least one byte can be read without blocking
    fn is_readable(&mut self) -> bool;

    /// Wait up to `timeout_us` microseconds for a byte to become readable
    ///
    /// Returns `true` as soon as a byte is pending, `false` on expiry.
    fn wait_readable(&mut self, timeout_us: u32) -> bool;

    /// Read a single byte
    ///
    /// Only called after [`UartRx::is_readable`] or
    /// [`UartRx::wait_readable`] reported a pending byte.
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

/// UART line configuration and ownership
pub trait UartControl {
    /// Apply a new line configuration on the given pins
    ///
    /// The pins are fixed at bring-up; implementations only check that the
    /// requested ones match what they own.
    fn configure(&mut self, config: &UartConfig, pins: UartPins);

    /// Release the transport
    ///
    /// Backends that cannot give the peripheral back leave this as a no-op.
    fn release(&mut self) {}
}

/// Combined UART interface
///
/// For UARTs that provide both TX and RX on a single peripheral.
pub trait Uart: UartTx + UartRx + UartControl {}

// Blanket implementation
impl<T: UartTx + UartRx + UartControl> Uart for T {}

/// GPIO numbers carrying the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPins {
    pub tx: u8,
    pub rx: u8,
}

impl Default for UartPins {
    fn default() -> Self {
        Self { tx: 0, rx: 1 }
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// 8N1 at the given baud rate
    pub const fn with_baudrate(baudrate: u32) -> Self {
        Self {
            baudrate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
