//! Buffered two-wire bus master (`Wire`)
//!
//! Reproduces the sketch-level `Wire` contract on top of an [`I2cMaster`]:
//!
//! - Transmission is staged: `begin_transmission` → `write*` →
//!   `end_transmission`, which commits the staged bytes as one blocking
//!   transfer.
//! - Reception is one blocking, timeout-bounded `request_from` into a receive
//!   buffer that is then drained with `read`/`available`.
//! - Staging more bytes than the buffer holds truncates silently and latches
//!   [`Wire::is_overrun`]; it is never a fault.
//! - Transfer failures are recorded in [`Wire::last_error`]. `request_from`
//!   reports them only as a zero length, exactly like the sketch API;
//!   [`Wire::try_request_from`] returns the error directly.
//!
//! No retries are attempted. Slave-mode event callbacks are accepted and
//! ignored.

use core::ffi::CStr;

use heapless::Vec;
use picowire_hal::i2c::{Error as _, ErrorKind, I2cConfig, I2cMaster, DEFAULT_READ_TIMEOUT_US};

use crate::buffer::{Append, RxBuffer, TxBuffer};

/// Transmit and receive buffer capacity
pub const BUFFER_SIZE: usize = 256;

/// First non-reserved 7-bit address probed by [`Wire::scan`]
pub const SCAN_FIRST: u8 = 0x08;

/// Last non-reserved 7-bit address probed by [`Wire::scan`]
pub const SCAN_LAST: u8 = 0x77;

/// Number of addresses in the scan range
pub const SCAN_SLOTS: usize = (SCAN_LAST - SCAN_FIRST + 1) as usize;

/// Bus session: one active master context
pub struct Wire<B, const N: usize = BUFFER_SIZE> {
    bus: B,
    address: u8,
    tx: TxBuffer<N>,
    rx: RxBuffer<N>,
    last_error: Option<ErrorKind>,
    read_timeout_us: u32,
}

impl<B: I2cMaster, const N: usize> Wire<B, N> {
    /// Wrap an initialized bus
    ///
    /// The bus keeps whatever clock rate bring-up gave it.
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            address: 0,
            tx: TxBuffer::new(),
            rx: RxBuffer::new(),
            last_error: None,
            read_timeout_us: DEFAULT_READ_TIMEOUT_US,
        }
    }

    /// Wrap a bus and apply clock rate and read timeout from `config`
    pub fn with_config(bus: B, config: &I2cConfig) -> Self {
        let mut wire = Self::new(bus);
        wire.set_clock(config.frequency);
        wire.read_timeout_us = config.read_timeout_us;
        wire
    }

    /// Reset both buffers and the overrun flag
    pub fn begin(&mut self) {
        self.tx.clear();
        self.rx.clear();
    }

    /// Reset like [`Wire::begin`] and also answer as a slave at `address`
    pub fn begin_slave(&mut self, address: u8) {
        self.begin();
        debug!("wire: slave address {:#x}", address);
        self.bus.set_slave_address(address);
    }

    /// Releasing the bus master is not supported; kept for compatibility
    pub fn end(&mut self) {}

    /// Start staging a write to `address`
    ///
    /// Clears the transmit buffer and the overrun flag.
    pub fn begin_transmission(&mut self, address: u8) {
        self.tx.clear();
        self.address = address;
    }

    /// Stage one byte
    ///
    /// Returns 1 if the byte was stored, 0 if it was dropped by overrun.
    pub fn write(&mut self, byte: u8) -> usize {
        match self.tx.push(byte) {
            Append::Stored => 1,
            Append::Truncated => 0,
        }
    }

    /// Stage a byte sequence, stopping at the first byte that does not fit
    ///
    /// Returns the number of bytes stored.
    pub fn write_bytes(&mut self, data: &[u8]) -> usize {
        self.tx.extend(data)
    }

    /// Stage the bytes of a string
    pub fn write_str(&mut self, s: &str) -> usize {
        self.write_bytes(s.as_bytes())
    }

    /// Stage the bytes of a C string, without its terminator
    pub fn write_cstr(&mut self, s: &CStr) -> usize {
        self.write_bytes(s.to_bytes())
    }

    /// Commit the staged bytes to the recorded target
    ///
    /// With `stop` false the bus is held for a repeated start. Returns the
    /// number of bytes sent; a failure is also recorded as the last error.
    /// The staged bytes stay in place until the next `begin_transmission`.
    pub fn end_transmission(&mut self, stop: bool) -> Result<usize, ErrorKind> {
        if self.tx.is_overrun() {
            warn!(
                "wire: transmit overrun, committing first {} bytes",
                self.tx.len()
            );
        }
        debug!(
            "wire: sending {} bytes to {:#x}: {:?}",
            self.tx.len(),
            self.address,
            self.tx.as_slice()
        );

        self.last_error = None;
        match self.bus.write(self.address, self.tx.as_slice(), stop) {
            Ok(sent) => Ok(sent),
            Err(e) => {
                let kind = e.kind();
                warn!("wire: write to {:#x} failed: {:?}", self.address, kind);
                self.last_error = Some(kind);
                Err(kind)
            }
        }
    }

    /// Commit the staged bytes and release the bus
    pub fn end_transmission_stop(&mut self) -> Result<usize, ErrorKind> {
        self.end_transmission(true)
    }

    /// Read up to `quantity` bytes from `address` into the receive buffer
    ///
    /// Returns the number of bytes received. A timeout or bus error yields
    /// 0, the same as a device that returned nothing; check
    /// [`Wire::last_error`] to tell them apart.
    pub fn request_from(&mut self, address: u8, quantity: usize, stop: bool) -> usize {
        self.try_request_from(address, quantity, stop).unwrap_or(0)
    }

    /// Like [`Wire::request_from`] but returns the transfer error directly
    ///
    /// Zero-length requests complete immediately without touching the bus.
    pub fn try_request_from(
        &mut self,
        address: u8,
        quantity: usize,
        stop: bool,
    ) -> Result<usize, ErrorKind> {
        self.address = address;
        self.last_error = None;

        if quantity > N {
            warn!(
                "wire: request of {} bytes exceeds receive buffer, clamped to {}",
                quantity, N
            );
        }
        if quantity == 0 {
            self.rx.clear();
            return Ok(0);
        }

        let timeout_us = self.read_timeout_us;
        let want = quantity.min(N);
        let slot = self.rx.fill_slot(want);
        match self.bus.read_timeout(address, slot, stop, timeout_us) {
            Ok(received) => {
                if received > want {
                    warn!(
                        "wire: {:#x} reported {} bytes for a {} byte request",
                        address, received, want
                    );
                }
                self.rx.set_filled(received.min(want));
                debug!(
                    "wire: received {} bytes from {:#x}: {:?}",
                    self.rx.len(),
                    address,
                    self.rx.received()
                );
                Ok(self.rx.len())
            }
            Err(e) => {
                let kind = e.kind();
                match kind {
                    ErrorKind::Timeout => warn!("wire: read from {:#x} timed out", address),
                    _ => warn!("wire: read from {:#x} failed: {:?}", address, kind),
                }
                self.rx.clear();
                self.last_error = Some(kind);
                Err(kind)
            }
        }
    }

    /// Next unread received byte
    ///
    /// Returns `None` once every received byte has been read.
    pub fn read(&mut self) -> Option<u8> {
        let byte = self.rx.take_next();
        if byte.is_none() {
            warn!(
                "wire: read past end of receive buffer ({} bytes)",
                self.rx.len()
            );
        }
        byte
    }

    /// Next unread received byte, without consuming it
    pub fn peek(&self) -> Option<u8> {
        self.rx.peek()
    }

    /// Number of received bytes not yet read
    pub fn available(&self) -> usize {
        self.rx.remaining()
    }

    /// Everything the last reception returned, read or not
    pub fn received(&self) -> &[u8] {
        self.rx.received()
    }

    /// Bytes currently staged for transmission
    pub fn staged(&self) -> &[u8] {
        self.tx.as_slice()
    }

    /// Set the bus clock rate in Hz
    pub fn set_clock(&mut self, frequency: u32) {
        debug!("wire: clock {} Hz", frequency);
        self.bus.set_frequency(frequency);
    }

    /// Slave receive callbacks are not delivered
    pub fn on_receive(&mut self, _handler: fn(usize)) {}

    /// Slave request callbacks are not delivered
    pub fn on_request(&mut self, _handler: fn()) {}

    /// Accepted for compatibility; reads use [`Wire::set_read_timeout_us`]
    pub fn set_wire_timeout(&mut self, _timeout_us: u32, _reset_on_timeout: bool) {}

    pub fn clear_wire_timeout_flag(&mut self) {}

    /// Always false: no timeout flag is latched
    pub fn wire_timeout_flag(&self) -> bool {
        false
    }

    /// Error recorded by the most recent transfer, if it failed
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Last error as the legacy negative code, 0 after a successful transfer
    pub fn last_error_code(&self) -> i32 {
        self.last_error.map_or(0, ErrorKind::code)
    }

    /// Whether staged bytes have been dropped since `begin_transmission`
    pub fn is_overrun(&self) -> bool {
        self.tx.is_overrun()
    }

    /// Target of the current or most recent transaction
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn read_timeout_us(&self) -> u32 {
        self.read_timeout_us
    }

    pub fn set_read_timeout_us(&mut self, timeout_us: u32) {
        self.read_timeout_us = timeout_us;
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether a device acknowledges a one-byte read at `address`
    ///
    /// Overwrites the receive buffer and the last error.
    pub fn probe(&mut self, address: u8) -> bool {
        self.try_request_from(address, 1, true).is_ok()
    }

    /// Probe every non-reserved 7-bit address
    ///
    /// Returns the responding addresses in ascending order.
    pub fn scan(&mut self) -> Vec<u8, SCAN_SLOTS> {
        let mut found = Vec::new();
        for address in SCAN_FIRST..=SCAN_LAST {
            if self.probe(address) {
                // Capacity covers the whole range
                let _ = found.push(address);
            }
        }
        debug!("wire: scan found {} devices", found.len());
        found
    }

    /// First of `candidates` that acknowledges, probed in order
    pub fn find_first(&mut self, candidates: &[u8]) -> Option<u8> {
        candidates.iter().copied().find(|&addr| self.probe(addr))
    }

    /// Borrow the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Give back the underlying bus
    pub fn release(self) -> B {
        self.bus
    }
}
