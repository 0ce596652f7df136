//! Repeated-start writes on controllers that stop after every transfer
//!
//! Register reads on the tuner are a write of the register index without a
//! stop, then a read. When the controller cannot keep the bus between two
//! calls, [`HeldWriteBus`] holds that write back and sends it with the read
//! as one write-then-read transfer.
//!
//! A held write that cannot be merged (the next transfer is another write,
//! or a read from a different device) goes out on its own first. If that
//! fails, the failure is logged and kept for [`HeldWriteBus::take_held_error`];
//! the transfer that displaced it still runs and reports only its own result.

use heapless::Vec;
use picowire_hal::i2c::{Error, I2cMaster, StopTransfers};

/// Longest write that can be held back for a repeated start
pub const HOLD_CAPACITY: usize = 256;

#[derive(Debug)]
struct Held<const H: usize> {
    address: u8,
    data: Vec<u8, H>,
}

/// [`I2cMaster`] over a [`StopTransfers`] controller
pub struct HeldWriteBus<T: StopTransfers, const H: usize = HOLD_CAPACITY> {
    inner: T,
    held: Option<Held<H>>,
    held_error: Option<T::Error>,
}

impl<T: StopTransfers, const H: usize> HeldWriteBus<T, H> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            held: None,
            held_error: None,
        }
    }

    /// Write waiting for a read, as `(address, bytes)`
    pub fn held(&self) -> Option<(u8, &[u8])> {
        self.held.as_ref().map(|h| (h.address, h.data.as_slice()))
    }

    /// Failure of the last held write that went out on its own, if any
    pub fn take_held_error(&mut self) -> Option<T::Error> {
        self.held_error.take()
    }

    /// Send a held write now, on its own, and return its result
    pub fn flush(&mut self) -> Result<(), T::Error> {
        match self.held.take() {
            Some(held) => self.inner.write(held.address, &held.data),
            None => Ok(()),
        }
    }

    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Drop any held write and give back the controller
    pub fn into_inner(self) -> T {
        self.inner
    }

    fn release_held(&mut self) {
        let Some(held) = self.held.take() else {
            return;
        };
        if let Err(e) = self.inner.write(held.address, &held.data) {
            warn!(
                "i2c: held write of {} bytes to {:#x} failed: {:?}",
                held.data.len(),
                held.address,
                e.kind()
            );
            self.held_error = Some(e);
        }
    }
}

impl<T: StopTransfers, const H: usize> I2cMaster for HeldWriteBus<T, H> {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8], stop: bool) -> Result<usize, T::Error> {
        self.release_held();

        if !stop && !data.is_empty() {
            if let Ok(bytes) = Vec::from_slice(data) {
                trace!("i2c: holding {} bytes for {:#x}", data.len(), address);
                self.held = Some(Held {
                    address,
                    data: bytes,
                });
                return Ok(data.len());
            }
            warn!(
                "i2c: {} byte write too long to hold, sending with stop",
                data.len()
            );
        }

        self.inner.write(address, data)?;
        Ok(data.len())
    }

    /// Reads always end with a stop; `stop = false` has no effect.
    fn read_timeout(
        &mut self,
        address: u8,
        buf: &mut [u8],
        _stop: bool,
        timeout_us: u32,
    ) -> Result<usize, T::Error> {
        if buf.is_empty() {
            return Ok(0);
        }

        match self.held.take() {
            Some(held) if held.address == address => {
                self.inner.write_read(address, &held.data, buf, timeout_us)?;
            }
            other => {
                self.held = other;
                self.release_held();
                self.inner.read(address, buf, timeout_us)?;
            }
        }
        Ok(buf.len())
    }

    fn set_frequency(&mut self, frequency: u32) {
        self.inner.set_frequency(frequency);
    }

    fn set_slave_address(&mut self, address: u8) {
        self.inner.set_slave_address(address);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Transfer, TransferLog};
    use crate::wire::Wire;
    use picowire_hal::i2c::ErrorKind;

    const TUNER: u8 = 0x63;
    const OTHER: u8 = 0x11;

    fn bus() -> HeldWriteBus<TransferLog, 4> {
        HeldWriteBus::new(TransferLog::with_devices(&[TUNER, OTHER]))
    }

    #[test]
    fn test_write_without_stop_is_held() {
        let mut bus = bus();
        assert_eq!(bus.write(TUNER, &[0x10], false), Ok(1));
        assert!(bus.inner_mut().log.is_empty());
        assert_eq!(bus.held(), Some((TUNER, &[0x10][..])));
    }

    #[test]
    fn test_held_write_merges_with_read_from_same_device() {
        let mut bus = bus();
        bus.inner_mut().load(TUNER, &[0xA0, 0xA1]);
        bus.write(TUNER, &[0x10], false).unwrap();

        let mut buf = [0u8; 2];
        assert_eq!(bus.read_timeout(TUNER, &mut buf, true, 500), Ok(2));
        assert_eq!(buf, [0xA0, 0xA1]);
        assert_eq!(
            bus.inner_mut().log,
            [Transfer::WriteRead {
                address: TUNER,
                data: vec![0x10],
                len: 2,
                timeout_us: 500,
            }]
        );
        assert_eq!(bus.held(), None);
    }

    #[test]
    fn test_held_write_sent_before_next_write() {
        let mut bus = bus();
        bus.write(TUNER, &[0x10], false).unwrap();
        assert_eq!(bus.write(OTHER, &[0x20, 0x21], true), Ok(2));

        assert_eq!(
            bus.inner_mut().log,
            [
                Transfer::Write {
                    address: TUNER,
                    data: vec![0x10],
                },
                Transfer::Write {
                    address: OTHER,
                    data: vec![0x20, 0x21],
                },
            ]
        );
    }

    #[test]
    fn test_held_write_sent_before_read_from_other_device() {
        let mut bus = bus();
        bus.write(TUNER, &[0x10], false).unwrap();

        let mut buf = [0u8; 1];
        bus.read_timeout(OTHER, &mut buf, true, 100).unwrap();
        assert_eq!(
            bus.inner_mut().log,
            [
                Transfer::Write {
                    address: TUNER,
                    data: vec![0x10],
                },
                Transfer::Read {
                    address: OTHER,
                    len: 1,
                    timeout_us: 100,
                },
            ]
        );
    }

    #[test]
    fn test_failed_held_write_does_not_block_next_write() {
        let mut bus = bus();
        bus.inner_mut().fail_writes_to = Some((TUNER, ErrorKind::Nack));
        bus.write(TUNER, &[0x10], false).unwrap();

        // The displacing write still reaches the bus and succeeds
        assert_eq!(bus.write(OTHER, &[0x20], true), Ok(1));
        assert_eq!(
            bus.inner_mut().log.last(),
            Some(&Transfer::Write {
                address: OTHER,
                data: vec![0x20],
            })
        );
        assert_eq!(bus.take_held_error(), Some(ErrorKind::Nack));
        assert_eq!(bus.take_held_error(), None);
    }

    #[test]
    fn test_failed_held_write_does_not_block_read() {
        let mut bus = bus();
        bus.inner_mut().fail_writes_to = Some((TUNER, ErrorKind::Timeout));
        bus.inner_mut().load(OTHER, &[0x5A]);
        bus.write(TUNER, &[0x10], false).unwrap();

        let mut buf = [0u8; 1];
        assert_eq!(bus.read_timeout(OTHER, &mut buf, true, 100), Ok(1));
        assert_eq!(buf, [0x5A]);
        assert_eq!(bus.take_held_error(), Some(ErrorKind::Timeout));
    }

    #[test]
    fn test_wire_error_belongs_to_its_own_transaction() {
        let mut wire: Wire<_, 8> = Wire::new(bus());
        wire.bus_mut().inner_mut().fail_writes_to = Some((OTHER, ErrorKind::Nack));

        wire.begin_transmission(OTHER);
        wire.write(0x01);
        assert_eq!(wire.end_transmission(false), Ok(1));

        wire.begin_transmission(TUNER);
        wire.write(0x02);
        assert_eq!(wire.end_transmission(true), Ok(1));
        assert_eq!(wire.last_error(), None);
        assert_eq!(wire.bus_mut().take_held_error(), Some(ErrorKind::Nack));
    }

    #[test]
    fn test_oversized_write_sent_with_stop() {
        let mut bus = bus();
        assert_eq!(bus.write(TUNER, &[1, 2, 3, 4, 5], false), Ok(5));
        assert_eq!(bus.held(), None);
        assert_eq!(
            bus.inner_mut().log,
            [Transfer::Write {
                address: TUNER,
                data: vec![1, 2, 3, 4, 5],
            }]
        );
    }

    #[test]
    fn test_empty_write_is_not_held() {
        let mut bus = bus();
        assert_eq!(bus.write(TUNER, &[], false), Ok(0));
        assert_eq!(bus.held(), None);
        assert_eq!(bus.inner_mut().log.len(), 1);
    }

    #[test]
    fn test_write_error_reported_for_unheld_write() {
        let mut bus = bus();
        assert_eq!(bus.write(0x42, &[1], true), Err(ErrorKind::Nack));
        assert_eq!(bus.take_held_error(), None);
    }

    #[test]
    fn test_flush_returns_held_result() {
        let mut bus = bus();
        bus.inner_mut().fail_writes_to = Some((TUNER, ErrorKind::Nack));
        bus.write(TUNER, &[0x10], false).unwrap();
        assert_eq!(bus.flush(), Err(ErrorKind::Nack));
        assert_eq!(bus.flush(), Ok(()));
        assert_eq!(bus.take_held_error(), None);
    }
}
