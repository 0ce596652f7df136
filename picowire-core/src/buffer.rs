//! Fixed-capacity transfer buffers
//!
//! The transmit side never grows past its capacity: an append that does not
//! fit latches an overrun flag and is dropped, and every later append is
//! refused until the buffer is cleared. The receive side is a filled-once
//! buffer with a read cursor.

use heapless::Vec;

/// Outcome of appending one byte to a [`TxBuffer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Append {
    /// Byte stored
    Stored,
    /// Byte dropped, buffer is (or already was) overrun
    Truncated,
}

impl Append {
    pub fn is_stored(self) -> bool {
        self == Append::Stored
    }
}

/// Bounded transmit buffer with a latching overrun flag
#[derive(Debug, Clone)]
pub struct TxBuffer<const N: usize> {
    data: Vec<u8, N>,
    overrun: bool,
}

impl<const N: usize> Default for TxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            overrun: false,
        }
    }

    /// Append one byte
    ///
    /// Once a byte has been dropped the buffer stays overrun until
    /// [`TxBuffer::clear`], even though nothing was removed from it.
    pub fn push(&mut self, byte: u8) -> Append {
        if self.overrun {
            return Append::Truncated;
        }
        match self.data.push(byte) {
            Ok(()) => Append::Stored,
            Err(_) => {
                self.overrun = true;
                Append::Truncated
            }
        }
    }

    /// Append bytes until the first one that does not fit
    ///
    /// Returns the number of bytes stored.
    pub fn extend(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.push(b).is_stored())
            .count()
    }

    /// Empty the buffer and reset the overrun flag
    pub fn clear(&mut self) {
        self.data.clear();
        self.overrun = false;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_overrun(&self) -> bool {
        self.overrun
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Receive buffer with a sequential read cursor
///
/// The cursor never passes the received length, and the received length
/// never passes the last slot handed out by [`RxBuffer::fill_slot`].
#[derive(Debug, Clone)]
pub struct RxBuffer<const N: usize> {
    data: [u8; N],
    len: usize,
    cursor: usize,
    slot: usize,
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxBuffer<N> {
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            len: 0,
            cursor: 0,
            slot: 0,
        }
    }

    /// Drop the received bytes and rewind the cursor
    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
        self.slot = 0;
    }

    /// Hand out the first `quantity` bytes of storage to be filled
    ///
    /// Clears the buffer first; `quantity` is clamped to the capacity.
    /// Follow up with [`RxBuffer::set_filled`].
    pub fn fill_slot(&mut self, quantity: usize) -> &mut [u8] {
        self.clear();
        self.slot = quantity.min(N);
        &mut self.data[..self.slot]
    }

    /// Record how many bytes of the slot were actually received
    ///
    /// Counts past the end of the slot are clamped to it; bytes beyond the
    /// slot were never written by the transfer.
    pub fn set_filled(&mut self, len: usize) {
        self.len = len.min(self.slot);
        self.cursor = 0;
    }

    /// Next unread byte, advancing the cursor
    pub fn take_next(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Next unread byte without advancing
    pub fn peek(&self) -> Option<u8> {
        if self.cursor < self.len {
            Some(self.data[self.cursor])
        } else {
            None
        }
    }

    /// Received bytes, read or not
    pub fn received(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Unread bytes remaining
    pub fn remaining(&self) -> usize {
        self.len - self.cursor
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_until_full_then_latch() {
        let mut buf = TxBuffer::<3>::new();
        assert_eq!(buf.extend(&[1, 2, 3]), 3);
        assert!(!buf.is_overrun());

        assert_eq!(buf.push(4), Append::Truncated);
        assert!(buf.is_overrun());
        assert_eq!(buf.as_slice(), &[1, 2, 3]);

        // Still refused even though nothing changed in the buffer
        assert_eq!(buf.push(5), Append::Truncated);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_extend_stops_at_first_drop() {
        let mut buf = TxBuffer::<4>::new();
        assert_eq!(buf.extend(&[1, 2]), 2);
        assert_eq!(buf.extend(&[3, 4, 5, 6]), 2);
        assert!(buf.is_overrun());
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_clear_resets_overrun() {
        let mut buf = TxBuffer::<1>::new();
        buf.extend(&[1, 2]);
        assert!(buf.is_overrun());

        buf.clear();
        assert!(!buf.is_overrun());
        assert!(buf.is_empty());
        assert_eq!(buf.push(9), Append::Stored);
    }

    #[test]
    fn test_rx_cursor_bounded() {
        let mut rx = RxBuffer::<8>::new();
        let slot = rx.fill_slot(3);
        slot.copy_from_slice(&[0xA, 0xB, 0xC]);
        rx.set_filled(3);

        assert_eq!(rx.remaining(), 3);
        assert_eq!(rx.peek(), Some(0xA));
        assert_eq!(rx.take_next(), Some(0xA));
        assert_eq!(rx.take_next(), Some(0xB));
        assert_eq!(rx.take_next(), Some(0xC));
        assert_eq!(rx.take_next(), None);
        assert_eq!(rx.cursor(), 3);
        assert_eq!(rx.remaining(), 0);
    }

    #[test]
    fn test_rx_fill_slot_clamps_and_clears() {
        let mut rx = RxBuffer::<4>::new();
        rx.fill_slot(2).copy_from_slice(&[1, 2]);
        rx.set_filled(2);
        rx.take_next();

        let slot = rx.fill_slot(100);
        assert_eq!(slot.len(), 4);
        assert_eq!(rx.len(), 0);
        assert_eq!(rx.cursor(), 0);
        assert_eq!(rx.take_next(), None);
    }

    #[test]
    fn test_rx_filled_never_passes_slot() {
        let mut rx = RxBuffer::<8>::new();
        rx.fill_slot(4).copy_from_slice(&[1, 2, 3, 4]);
        rx.set_filled(4);

        // Shorter slot; the old bytes past it must not reappear
        rx.fill_slot(2).copy_from_slice(&[9, 9]);
        rx.set_filled(7);
        assert_eq!(rx.len(), 2);
        assert_eq!(rx.received(), &[9, 9]);
    }

    #[test]
    fn test_rx_filled_without_slot_is_empty() {
        let mut rx = RxBuffer::<4>::new();
        rx.set_filled(3);
        assert!(rx.is_empty());
        assert_eq!(rx.take_next(), None);
    }
}
