//! I2C bus abstractions
//!
//! The `Wire` adapter needs a little more than a plain
//! write/read/write_read bus: it commits with or without a stop condition,
//! bounds every read by a timeout, changes the clock rate at runtime and can
//! ask the peripheral to answer as a slave.

/// Chip-independent classification of a failed bus transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Transfer did not complete within the allotted time
    Timeout,
    /// Address or data byte was not acknowledged
    Nack,
    /// Arbitration lost to another master
    ArbitrationLost,
    /// Bus error (misplaced start/stop)
    Bus,
    /// Peripheral FIFO overrun
    Overrun,
    /// Anything the peripheral reports that does not fit above
    Other,
}

/// Legacy generic-error code returned by the Pico SDK transfer calls
pub const CODE_GENERIC: i32 = -1;

/// Legacy timeout code returned by the Pico SDK transfer calls
pub const CODE_TIMEOUT: i32 = -2;

impl ErrorKind {
    /// Negative sentinel code matching the legacy transfer return values
    ///
    /// Only timeouts are distinguished; every other failure is generic.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Timeout => CODE_TIMEOUT,
            _ => CODE_GENERIC,
        }
    }

    /// Whether this error is a transfer timeout
    pub fn is_timeout(self) -> bool {
        self == ErrorKind::Timeout
    }
}

/// Errors produced by an [`I2cMaster`] implementation
///
/// Backends keep their own error enums and map them to an [`ErrorKind`]
/// so the adapter can record a chip-independent last error.
pub trait Error: core::fmt::Debug {
    /// Classify this error
    fn kind(&self) -> ErrorKind;
}

impl Error for ErrorKind {
    fn kind(&self) -> ErrorKind {
        *self
    }
}

/// I2C bus master
pub trait I2cMaster {
    /// Error type for I2C operations
    type Error: Error;

    /// Write `data` to the device at `address` in one blocking transfer
    ///
    /// When `stop` is false the bus is not released afterwards, so the next
    /// transfer starts with a repeated start.
    ///
    /// Returns the number of bytes sent.
    fn write(&mut self, address: u8, data: &[u8], stop: bool) -> Result<usize, Self::Error>;

    /// Read into `buf` from the device at `address`
    ///
    /// Blocks until `buf` is full, the peripheral reports an error, or
    /// `timeout_us` microseconds elapse (reported as a timeout error).
    ///
    /// Returns the number of bytes received.
    fn read_timeout(
        &mut self,
        address: u8,
        buf: &mut [u8],
        stop: bool,
        timeout_us: u32,
    ) -> Result<usize, Self::Error>;

    /// Change the bus clock rate
    fn set_frequency(&mut self, frequency: u32);

    /// Respond as a slave at `address` in addition to acting as master
    ///
    /// Backends without slave support leave this as a no-op.
    fn set_slave_address(&mut self, _address: u8) {}
}

/// Controller whose every transfer ends with a stop
///
/// Some I2C blocks cannot keep the bus between two calls, so a write ended
/// without a stop has no direct equivalent. They implement this trait and
/// get [`I2cMaster`] semantics from an adapter that holds such a write back
/// and issues it together with the following read.
pub trait StopTransfers {
    type Error: Error;

    /// Write `data` to `address`; an empty `data` only addresses the device
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Fill `buf` from `address` within `timeout_us`
    fn read(&mut self, address: u8, buf: &mut [u8], timeout_us: u32) -> Result<(), Self::Error>;

    /// Write `data` then read into `buf` across a repeated start
    fn write_read(
        &mut self,
        address: u8,
        data: &[u8],
        buf: &mut [u8],
        timeout_us: u32,
    ) -> Result<(), Self::Error>;

    /// Change the bus clock rate
    fn set_frequency(&mut self, frequency: u32);

    fn set_slave_address(&mut self, _address: u8) {}
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Upper bound for a single read transfer, in microseconds
    pub read_timeout_us: u32,
}

/// Default read timeout for `requestFrom` transfers
pub const DEFAULT_READ_TIMEOUT_US: u32 = 10_000;

impl Default for I2cConfig {
    fn default() -> Self {
        Self::LEGACY
    }
}

impl I2cConfig {
    /// Rate the bus is brought up at before the sketch calls `setClock` (10 kHz)
    pub const LEGACY: Self = Self {
        frequency: 10_000,
        read_timeout_us: DEFAULT_READ_TIMEOUT_US,
    };

    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self {
        frequency: 100_000,
        read_timeout_us: DEFAULT_READ_TIMEOUT_US,
    };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self {
        frequency: 400_000,
        read_timeout_us: DEFAULT_READ_TIMEOUT_US,
    };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
        read_timeout_us: DEFAULT_READ_TIMEOUT_US,
    };
}
