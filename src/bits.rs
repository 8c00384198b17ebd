//! Bit-level packing and unpacking, most significant bit first
//!
//! Both halves are resumable: partially filled or partially consumed
//! bytes are carried across calls.

use alloc::boxed::Box;
use alloc::vec;

use crate::util::BufOutput;

/// Accumulates bits into bytes, releasing a byte only once all 8 bits are set
#[derive(Debug)]
pub(crate) struct BitWriter {
    current_byte: u8,
    bit_mask: u8,
}
impl BitWriter {
    pub fn new() -> Self {
        Self {
            current_byte: 0,
            bit_mask: 0x80,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Push the low `count` bits of `bits`
    ///
    /// At most 8 bits, so at most one byte is completed.
    /// The caller must have checked that `out` has room for it.
    pub fn push_bits(&mut self, count: u8, bits: u8, out: &mut BufOutput) {
        debug_assert!(count <= 8);

        // byte aligned, skip the bit loop
        if count == 8 && self.bit_mask == 0x80 {
            out.putc(bits);
            return;
        }

        for i in (0..count).rev() {
            if bits & (1 << i) != 0 {
                self.current_byte |= self.bit_mask;
            }
            self.bit_mask >>= 1;
            if self.bit_mask == 0 {
                out.putc(self.current_byte);
                self.current_byte = 0;
                self.bit_mask = 0x80;
            }
        }
    }

    /// Whether some bits are waiting for the rest of their byte
    pub fn has_partial_byte(&self) -> bool {
        self.bit_mask != 0x80
    }

    /// Release the partial byte, with the unused low bits left as zero padding
    pub fn flush(&mut self, out: &mut BufOutput) {
        out.putc(self.current_byte);
        self.reset();
    }
}

/// A multi-byte field (backreference index or count) being written out in
/// chunks of at most 8 bits, one chunk per available output byte
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PendingField {
    value: u16,
    remaining: u8,
}
impl PendingField {
    pub fn new(value: u16, width: u8) -> Self {
        debug_assert!(width <= 16);
        Self {
            value,
            remaining: width,
        }
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }

    /// Write the next chunk, the high bits first
    pub fn push_chunk(&mut self, writer: &mut BitWriter, out: &mut BufOutput) {
        let count = u8::min(self.remaining, 8);
        let bits = (self.value >> (self.remaining - count)) as u8;
        if count > 0 {
            writer.push_bits(count, bits, out);
            self.remaining -= count;
        }
    }
}

/// Bounded FIFO of staged input bytes, consumed a bit at a time
#[derive(Debug)]
pub(crate) struct BitReader {
    queue: Box<[u8]>,
    head: usize,
    len: usize,
    current_byte: u8,
    bits_left: u8,
}
impl BitReader {
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            queue: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            current_byte: 0,
            bits_left: 0,
        }
    }

    pub fn reset(&mut self) {
        self.queue.fill(0);
        self.head = 0;
        self.len = 0;
        self.current_byte = 0;
        self.bits_left = 0;
    }

    pub fn free(&self) -> usize {
        self.queue.len() - self.len
    }

    /// No staged bytes remain (the current byte may still hold a few bits)
    pub fn is_drained(&self) -> bool {
        self.len == 0
    }

    /// Stage as much of `inp` as fits, returning the count taken
    pub fn sink(&mut self, inp: &[u8]) -> usize {
        let cap = self.queue.len();
        let n = usize::min(self.free(), inp.len());

        let tail = (self.head + self.len) % cap;
        let first = usize::min(n, cap - tail);
        self.queue[tail..tail + first].copy_from_slice(&inp[..first]);
        self.queue[..n - first].copy_from_slice(&inp[first..n]);
        self.len += n;

        n
    }

    /// Read `count` bits as an integer, MSB first
    ///
    /// If fewer than `count` bits are staged, nothing is consumed and
    /// `None` is returned, so the read can simply be retried later.
    pub fn get_bits(&mut self, count: u8) -> Option<u16> {
        debug_assert!(count <= 16);
        let available = self.bits_left as usize + 8 * self.len;
        if available < count as usize {
            return None;
        }

        let mut acc = 0u16;
        for _ in 0..count {
            if self.bits_left == 0 {
                self.current_byte = self.queue[self.head];
                self.head = (self.head + 1) % self.queue.len();
                self.len -= 1;
                self.bits_left = 8;
            }
            self.bits_left -= 1;
            acc = (acc << 1) | ((self.current_byte >> self.bits_left) & 1) as u16;
        }
        Some(acc)
    }
}
