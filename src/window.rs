//! Fixed-size byte arenas holding the context backreferences point into

use alloc::boxed::Box;
use alloc::vec;

/// Encoder working buffer: `[backlog | input]`, each half one window long
///
/// The backlog holds the most recent window's worth of already-processed
/// bytes (initially zeros). New input is appended to the second half,
/// and once it has been scanned far enough everything is slid down so
/// the processed bytes become the new backlog.
#[derive(Debug)]
pub(crate) struct SearchBuffer {
    buf: Box<[u8]>,
    window_len: usize,
}
impl SearchBuffer {
    pub fn new(window_len: usize) -> Self {
        Self {
            buf: vec![0; 2 * window_len].into_boxed_slice(),
            window_len,
        }
    }

    pub fn reset(&mut self) {
        self.buf.fill(0);
    }

    /// Offset of the first input byte
    pub fn input_offset(&self) -> usize {
        self.window_len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Copy `inp` into the input half, `at` bytes past its start
    pub fn write_input(&mut self, at: usize, inp: &[u8]) {
        let start = self.window_len + at;
        self.buf[start..start + inp.len()].copy_from_slice(inp);
    }

    /// Discard the oldest `processed` bytes by sliding the whole buffer down
    ///
    /// Afterwards the window of bytes directly preceding the first
    /// unprocessed input byte sits in the backlog half.
    pub fn slide(&mut self, processed: usize) {
        debug_assert!(processed <= self.window_len);
        self.buf.copy_within(processed.., 0);
    }
}

/// Decoder history: the last window's worth of produced bytes, as a ring
///
/// The ring starts out as a full window of zeros, which matches what the
/// encoder's search sees before any input, so every distance in
/// `1..=window_len` names a defined byte.
#[derive(Debug)]
pub(crate) struct HistoryRing {
    buf: Box<[u8]>,
    head: usize,
}
impl HistoryRing {
    pub fn new(window_len: usize) -> Self {
        debug_assert!(window_len.is_power_of_two());
        Self {
            buf: vec![0; window_len].into_boxed_slice(),
            head: 0,
        }
    }

    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.head = 0;
    }

    fn mask(&self) -> usize {
        self.buf.len() - 1
    }

    pub fn push(&mut self, c: u8) {
        self.buf[self.head] = c;
        self.head = (self.head + 1) & self.mask();
    }

    /// The byte `distance` positions before the next one to be pushed
    pub fn byte_back(&self, distance: usize) -> u8 {
        debug_assert!(distance >= 1 && distance <= self.buf.len());
        self.buf[(self.head + self.buf.len() - distance) & self.mask()]
    }
}
