//! Host-side mock peripherals shared by the unit tests

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};

use picowire_hal::i2c::{ErrorKind, I2cMaster, StopTransfers};
use picowire_hal::time::{wait_until, Clock};
use picowire_hal::uart::{UartConfig, UartControl, UartPins, UartRx, UartTx};

/// One committed write as seen on the bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub address: u8,
    pub data: Vec<u8>,
    pub stop: bool,
}

/// Loopback bus: each present device echoes back the last bytes written to it
#[derive(Debug, Default)]
pub struct LoopbackBus {
    pub devices: BTreeMap<u8, Vec<u8>>,
    pub committed: Vec<Committed>,
    pub read_timeouts: Vec<u32>,
    pub fail_next_read: Option<ErrorKind>,
    pub fail_next_write: Option<ErrorKind>,
    pub frequency: u32,
    pub slave_address: Option<u8>,
    pub reads: usize,
    /// Added to the byte count every read reports, past what it filled
    pub over_report: usize,
}

impl LoopbackBus {
    pub fn with_devices(addresses: &[u8]) -> Self {
        let mut bus = Self::default();
        for &addr in addresses {
            bus.devices.insert(addr, Vec::new());
        }
        bus
    }

    /// Preload what a device returns on the next read
    pub fn load(&mut self, address: u8, data: &[u8]) {
        self.devices.insert(address, data.to_vec());
    }
}

impl I2cMaster for LoopbackBus {
    type Error = ErrorKind;

    fn write(&mut self, address: u8, data: &[u8], stop: bool) -> Result<usize, ErrorKind> {
        if let Some(e) = self.fail_next_write.take() {
            return Err(e);
        }
        let memory = self.devices.get_mut(&address).ok_or(ErrorKind::Nack)?;
        *memory = data.to_vec();
        self.committed.push(Committed {
            address,
            data: data.to_vec(),
            stop,
        });
        Ok(data.len())
    }

    fn read_timeout(
        &mut self,
        address: u8,
        buf: &mut [u8],
        _stop: bool,
        timeout_us: u32,
    ) -> Result<usize, ErrorKind> {
        self.reads += 1;
        self.read_timeouts.push(timeout_us);
        if let Some(e) = self.fail_next_read.take() {
            return Err(e);
        }
        let memory = self.devices.get(&address).ok_or(ErrorKind::Nack)?;
        let n = memory.len().min(buf.len());
        buf[..n].copy_from_slice(&memory[..n]);
        Ok(n + self.over_report)
    }

    fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }

    fn set_slave_address(&mut self, address: u8) {
        self.slave_address = Some(address);
    }
}

/// One transfer issued to a [`TransferLog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transfer {
    Write {
        address: u8,
        data: Vec<u8>,
    },
    Read {
        address: u8,
        len: usize,
        timeout_us: u32,
    },
    WriteRead {
        address: u8,
        data: Vec<u8>,
        len: usize,
        timeout_us: u32,
    },
}

/// Stop-after-every-transfer controller that records what it was asked to do
#[derive(Debug, Default)]
pub struct TransferLog {
    pub devices: BTreeMap<u8, Vec<u8>>,
    pub log: Vec<Transfer>,
    /// Writes to this address fail with this error
    pub fail_writes_to: Option<(u8, ErrorKind)>,
    pub frequency: u32,
}

impl TransferLog {
    pub fn with_devices(addresses: &[u8]) -> Self {
        let mut bus = Self::default();
        for &addr in addresses {
            bus.devices.insert(addr, Vec::new());
        }
        bus
    }

    pub fn load(&mut self, address: u8, data: &[u8]) {
        self.devices.insert(address, data.to_vec());
    }

    fn fill(&self, address: u8, buf: &mut [u8]) -> Result<(), ErrorKind> {
        let memory = self.devices.get(&address).ok_or(ErrorKind::Nack)?;
        let n = memory.len().min(buf.len());
        buf[..n].copy_from_slice(&memory[..n]);
        Ok(())
    }
}

impl StopTransfers for TransferLog {
    type Error = ErrorKind;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), ErrorKind> {
        self.log.push(Transfer::Write {
            address,
            data: data.to_vec(),
        });
        match self.fail_writes_to {
            Some((target, e)) if target == address => Err(e),
            _ if self.devices.contains_key(&address) => Ok(()),
            _ => Err(ErrorKind::Nack),
        }
    }

    fn read(&mut self, address: u8, buf: &mut [u8], timeout_us: u32) -> Result<(), ErrorKind> {
        self.log.push(Transfer::Read {
            address,
            len: buf.len(),
            timeout_us,
        });
        self.fill(address, buf)
    }

    fn write_read(
        &mut self,
        address: u8,
        data: &[u8],
        buf: &mut [u8],
        timeout_us: u32,
    ) -> Result<(), ErrorKind> {
        self.log.push(Transfer::WriteRead {
            address,
            data: data.to_vec(),
            len: buf.len(),
            timeout_us,
        });
        self.fill(address, buf)
    }

    fn set_frequency(&mut self, frequency: u32) {
        self.frequency = frequency;
    }
}

/// Fake time base; every reading advances it by `step_us`
#[derive(Debug)]
pub struct MockClock {
    pub now_us: Cell<u64>,
    pub step_us: u64,
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new(1)
    }
}

impl MockClock {
    pub fn new(step_us: u64) -> Self {
        Self {
            now_us: Cell::new(0),
            step_us,
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.now_us.get()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + self.step_us);
        now
    }

    fn delay_us(&self, us: u32) {
        self.now_us.set(self.now_us.get() + u64::from(us));
    }
}

/// Scripted console transport
#[derive(Debug, Default)]
pub struct MockUart {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub blocked: bool,
    pub fail_writes: bool,
    /// Wait for the requested timeout on `clock` when no byte is pending
    pub timed: bool,
    pub clock: MockClock,
    pub waits: Vec<u32>,
    pub flushes: usize,
    pub configured: Option<(UartConfig, UartPins)>,
    pub released: bool,
}

impl MockUart {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            rx: input.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn output(&self) -> &[u8] {
        &self.tx
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockUartError;

impl UartTx for MockUart {
    type Error = MockUartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), MockUartError> {
        if self.fail_writes {
            return Err(MockUartError);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockUartError> {
        self.flushes += 1;
        Ok(())
    }

    fn is_writable(&mut self) -> bool {
        !self.blocked
    }
}

impl UartRx for MockUart {
    type Error = MockUartError;

    fn is_readable(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn wait_readable(&mut self, timeout_us: u32) -> bool {
        self.waits.push(timeout_us);
        if !self.timed {
            return !self.rx.is_empty();
        }
        let rx = &self.rx;
        wait_until(&self.clock, timeout_us, || !rx.is_empty())
    }

    fn read_byte(&mut self) -> Result<u8, MockUartError> {
        self.rx.pop_front().ok_or(MockUartError)
    }
}

impl UartControl for MockUart {
    fn configure(&mut self, config: &UartConfig, pins: UartPins) {
        self.configured = Some((*config, pins));
    }

    fn release(&mut self) {
        self.released = true;
    }
}
