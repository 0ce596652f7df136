//! Timeout-bounded serial console (`Serial`)
//!
//! Byte and line reads wait at most the configured timeout for each byte and
//! report "no data" instead of blocking forever.
//!
//! # Output accounting
//!
//! Text output (`print`, `println`, `write_str`, `write_cstr`) goes through
//! newline translation: every `'\n'` is sent as `"\r\n"`. The counts these
//! calls return are bytes put on the wire, so a newline costs 2. Raw output
//! (`write`, `write_bytes`) is sent untouched and counts its length.

use core::ffi::CStr;
use core::fmt;

use heapless::String;
use picowire_hal::uart::{Uart, UartConfig, UartPins, UartRx, UartTx};

use crate::print::Printable;

/// Default per-byte read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u32 = 1000;

/// Line terminator emitted by `println` and newline translation
pub const LINE_ENDING: &[u8] = b"\r\n";

/// Console session
pub struct Serial<P> {
    port: P,
    timeout_ms: u32,
}

impl<P: Uart> Serial<P> {
    /// Wrap a transport claimed at bring-up
    pub fn new(port: P) -> Self {
        Self {
            port,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Configure 8N1 at `baudrate` on the default console pins
    pub fn begin(&mut self, baudrate: u32) {
        self.begin_with(UartConfig::with_baudrate(baudrate), UartPins::default());
    }

    /// Configure the line format and pins
    pub fn begin_with(&mut self, config: UartConfig, pins: UartPins) {
        debug!(
            "serial: {} baud on tx {} rx {}",
            config.baudrate, pins.tx, pins.rx
        );
        self.port.configure(&config, pins);
    }

    /// Release the transport; a no-op where the backend cannot
    pub fn end(&mut self) {
        self.port.release();
    }

    /// 1 if a byte can be read right now, 0 otherwise
    pub fn available(&mut self) -> usize {
        usize::from(self.port.is_readable())
    }

    /// 1 if a byte can be written without blocking, 0 otherwise
    pub fn available_for_write(&mut self) -> usize {
        usize::from(self.port.is_writable())
    }

    /// Set the per-byte read timeout in milliseconds
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    pub fn timeout(&self) -> u32 {
        self.timeout_ms
    }

    /// Next byte, or `None` if none arrives within the timeout
    pub fn read(&mut self) -> Option<u8> {
        if !self.port.wait_readable(self.timeout_ms.saturating_mul(1000)) {
            return None;
        }
        match UartRx::read_byte(&mut self.port) {
            Ok(byte) => Some(byte),
            Err(_) => {
                warn!("serial: read failed");
                None
            }
        }
    }

    /// Fill `buf`, stopping early on timeout
    ///
    /// Returns the number of bytes read.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> usize {
        self.read_bytes_terminated(buf, None)
    }

    /// Fill `buf`, stopping after `terminator` or on timeout
    ///
    /// The terminator is stored in `buf` and included in the count.
    pub fn read_bytes_terminated(&mut self, buf: &mut [u8], terminator: Option<u8>) -> usize {
        let mut count = 0;
        while count < buf.len() {
            let Some(byte) = self.read() else {
                break;
            };
            buf[count] = byte;
            count += 1;
            if Some(byte) == terminator {
                break;
            }
        }
        count
    }

    /// Sketch-order alias of [`Serial::read_bytes_terminated`]
    pub fn read_bytes_until(&mut self, terminator: u8, buf: &mut [u8]) -> usize {
        self.read_bytes_terminated(buf, Some(terminator))
    }

    /// Read up to `N` bytes as text, stopping after `terminator`
    ///
    /// The terminator is kept. Invalid UTF-8 sequences are dropped.
    pub fn read_line<const N: usize>(&mut self, terminator: u8) -> String<N> {
        let mut raw = [0u8; N];
        let len = self.read_bytes_terminated(&mut raw, Some(terminator));

        let mut line = String::new();
        for chunk in raw[..len].utf8_chunks() {
            // Fits: the valid part is never longer than N bytes
            let _ = line.push_str(chunk.valid());
        }
        line
    }

    /// Send one byte untranslated
    pub fn write(&mut self, byte: u8) -> usize {
        self.write_bytes(&[byte])
    }

    /// Send bytes untranslated
    ///
    /// Returns the number of bytes written, 0 if the transport failed.
    pub fn write_bytes(&mut self, data: &[u8]) -> usize {
        match UartTx::write_blocking(&mut self.port, data) {
            Ok(()) => data.len(),
            Err(_) => {
                warn!("serial: write failed");
                0
            }
        }
    }

    /// Send text with newline translation
    pub fn write_str(&mut self, s: &str) -> usize {
        self.write_text(s.as_bytes())
    }

    /// Send a C string (without terminator) with newline translation
    pub fn write_cstr(&mut self, s: &CStr) -> usize {
        self.write_text(s.to_bytes())
    }

    /// Render a value as text
    pub fn print<T: Printable>(&mut self, value: T) -> usize {
        let mut out = TextWriter::new(self);
        // TextWriter never fails; short writes are reflected in the count
        let _ = value.fmt_text(&mut out);
        out.written
    }

    /// Render a value followed by a line ending
    pub fn println<T: Printable>(&mut self, value: T) -> usize {
        self.print(value) + self.newline()
    }

    /// Just the line ending
    pub fn newline(&mut self) -> usize {
        self.write_bytes(LINE_ENDING)
    }

    /// Render preformatted arguments
    ///
    /// ```ignore
    /// serial.print_fmt(format_args!("{:.2} MHz", freq as f32 / 100.0));
    /// ```
    pub fn print_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
        let mut out = TextWriter::new(self);
        let _ = fmt::write(&mut out, args);
        out.written
    }

    pub fn println_fmt(&mut self, args: fmt::Arguments<'_>) -> usize {
        self.print_fmt(args) + self.newline()
    }

    /// Block until all output has left the transmitter
    pub fn flush(&mut self) {
        if UartTx::flush(&mut self.port).is_err() {
            warn!("serial: flush failed");
        }
    }

    /// Borrow the underlying transport
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Give back the underlying transport
    pub fn release(self) -> P {
        self.port
    }

    fn write_text(&mut self, text: &[u8]) -> usize {
        let mut written = 0;
        let mut lines = text.split(|&b| b == b'\n');
        if let Some(first) = lines.next() {
            written += self.write_segment(first);
        }
        for line in lines {
            written += self.write_bytes(LINE_ENDING);
            written += self.write_segment(line);
        }
        written
    }

    fn write_segment(&mut self, segment: &[u8]) -> usize {
        if segment.is_empty() {
            0
        } else {
            self.write_bytes(segment)
        }
    }
}

impl<P: Uart> fmt::Write for Serial<P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        Serial::write_str(self, s);
        Ok(())
    }
}

/// Counting text sink used by the `print` family
struct TextWriter<'a, P> {
    serial: &'a mut Serial<P>,
    written: usize,
}

impl<'a, P: Uart> TextWriter<'a, P> {
    fn new(serial: &'a mut Serial<P>) -> Self {
        Self { serial, written: 0 }
    }
}

impl<P: Uart> fmt::Write for TextWriter<'_, P> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.written += self.serial.write_text(s.as_bytes());
        Ok(())
    }
}
