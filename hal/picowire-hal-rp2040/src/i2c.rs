//! I2C master on the RP2040 I2C blocks
//!
//! Wraps the embassy-rp async driver and runs each transfer to completion
//! with `block_on`, bounded by `with_timeout`. The hardware cannot hold the
//! bus between two separate transfers, so this is a [`StopTransfers`]
//! controller; repeated starts come from merging a write with the read that
//! follows it.

use core::future::Future;

use embassy_embedded_hal::SetConfig;
use embassy_futures::block_on;
use embassy_rp::i2c::{AbortReason, Async, Config, Error as DriverError, I2c, Instance};
use embassy_time::{with_timeout, Duration};
use embedded_hal_async::i2c::I2c as _;
use picowire_hal::i2c::{Error, ErrorKind, I2cConfig, StopTransfers};

/// Upper bound on a single write transfer
pub const WRITE_TIMEOUT_MS: u64 = 100;

/// Highest clock the RP2040 I2C block supports
pub const MAX_FREQUENCY: u32 = 1_000_000;

/// I2C peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cId {
    I2c0,
    I2c1,
}

/// Function of a GPIO on its I2C block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cPinRole {
    Sda,
    Scl,
}

/// Which I2C block and line a GPIO can carry
///
/// Every bank-0 GPIO has an I2C function: blocks alternate in pairs of pins,
/// with SDA on the even pin and SCL on the odd one.
pub fn gpio_to_i2c(gpio: u8) -> Option<(I2cId, I2cPinRole)> {
    if gpio > 29 {
        return None;
    }
    let id = if (gpio / 2) % 2 == 0 {
        I2cId::I2c0
    } else {
        I2cId::I2c1
    };
    let role = if gpio % 2 == 0 {
        I2cPinRole::Sda
    } else {
        I2cPinRole::Scl
    };
    Some((id, role))
}

/// Block serving a SDA/SCL pair, if the pair is usable together
pub fn i2c_for_pins(sda: u8, scl: u8) -> Option<I2cId> {
    match (gpio_to_i2c(sda)?, gpio_to_i2c(scl)?) {
        ((a, I2cPinRole::Sda), (b, I2cPinRole::Scl)) if a == b => Some(a),
        _ => None,
    }
}

/// Driver configuration for a bus config
pub fn i2c_config(config: &I2cConfig) -> Config {
    let mut driver = Config::default();
    driver.frequency = config.frequency;
    driver
}

/// Error from RP2040 I2C transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpI2cError {
    /// Transfer did not finish in time
    Timeout,
    /// Address or data byte not acknowledged
    Nack,
    /// Another master won arbitration
    ArbitrationLost,
    /// Transfer aborted for another reason
    Abort,
    /// Empty or oversized buffer
    InvalidLength,
    /// Address outside 7 bits or reserved
    InvalidAddress,
}

impl From<DriverError> for RpI2cError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::Abort(AbortReason::NoAcknowledge) => RpI2cError::Nack,
            DriverError::Abort(AbortReason::ArbitrationLoss) => RpI2cError::ArbitrationLost,
            DriverError::Abort(_) => RpI2cError::Abort,
            DriverError::InvalidReadBufferLength | DriverError::InvalidWriteBufferLength => {
                RpI2cError::InvalidLength
            }
            _ => RpI2cError::InvalidAddress,
        }
    }
}

impl Error for RpI2cError {
    fn kind(&self) -> ErrorKind {
        match self {
            RpI2cError::Timeout => ErrorKind::Timeout,
            RpI2cError::Nack => ErrorKind::Nack,
            RpI2cError::ArbitrationLost => ErrorKind::ArbitrationLost,
            RpI2cError::Abort => ErrorKind::Bus,
            RpI2cError::InvalidLength | RpI2cError::InvalidAddress => ErrorKind::Other,
        }
    }
}

/// Run a driver future to completion within `timeout`
fn run<F>(timeout: Duration, transfer: F) -> Result<(), RpI2cError>
where
    F: Future<Output = Result<(), DriverError>>,
{
    match block_on(with_timeout(timeout, transfer)) {
        Ok(result) => result.map_err(RpI2cError::from),
        Err(_) => Err(RpI2cError::Timeout),
    }
}

/// I2C controller over an embassy-rp async driver
///
/// Every transfer is run to completion and ends with a stop. Wrap it in
/// `picowire_core::HeldWriteBus` for writes that keep the bus.
pub struct RpI2c<'d, T: Instance> {
    i2c: I2c<'d, T, Async>,
    frequency: u32,
    slave_address: Option<u8>,
}

impl<'d, T: Instance> RpI2c<'d, T> {
    /// Wrap a driver created with `frequency`
    pub fn new(i2c: I2c<'d, T, Async>, frequency: u32) -> Self {
        Self {
            i2c,
            frequency,
            slave_address: None,
        }
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    /// Address requested through `set_slave_address`, if any
    pub fn slave_address(&self) -> Option<u8> {
        self.slave_address
    }
}

impl<T: Instance> StopTransfers for RpI2c<'_, T> {
    type Error = RpI2cError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), RpI2cError> {
        let timeout = Duration::from_millis(WRITE_TIMEOUT_MS);
        if data.is_empty() {
            // The controller cannot issue an address-only write; a one
            // byte read acknowledges the same way
            let mut scratch = [0u8; 1];
            return run(timeout, self.i2c.read(address, &mut scratch));
        }
        run(timeout, self.i2c.write(address, data))
    }

    fn read(&mut self, address: u8, buf: &mut [u8], timeout_us: u32) -> Result<(), RpI2cError> {
        let timeout = Duration::from_micros(u64::from(timeout_us));
        run(timeout, self.i2c.read(address, buf))
    }

    fn write_read(
        &mut self,
        address: u8,
        data: &[u8],
        buf: &mut [u8],
        timeout_us: u32,
    ) -> Result<(), RpI2cError> {
        let timeout = Duration::from_micros(u64::from(timeout_us));
        run(timeout, self.i2c.write_read(address, data, buf))
    }

    fn set_frequency(&mut self, frequency: u32) {
        if frequency == 0 || frequency > MAX_FREQUENCY {
            warn!("i2c: unsupported clock {} Hz, keeping {}", frequency, self.frequency);
            return;
        }

        let mut config = Config::default();
        config.frequency = frequency;
        match self.i2c.set_config(&config) {
            Ok(()) => self.frequency = frequency,
            Err(_) => warn!("i2c: clock {} Hz rejected", frequency),
        }
    }

    /// Recorded only: the master driver owns the block, so it never answers
    /// as a slave.
    fn set_slave_address(&mut self, address: u8) {
        warn!("i2c: slave mode unavailable, ignoring address {:#x}", address);
        self.slave_address = Some(address);
    }
}
