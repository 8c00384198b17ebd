use core::fmt;

use alloc::vec::Vec;

use crate::bits::BitReader;
use crate::util::BufOutput;
use crate::window::HistoryRing;
use crate::{Config, ConfigError, FinishRes, PollRes, SinkRes};

#[cfg(feature = "std")]
extern crate std;

/// Input staging size used by the one-shot helpers
const ONESHOT_INPUT_BUFFER: usize = 256;
/// Scratch space used by [decompress_to_vec] per poll
const VEC_CHUNK: usize = 256;

#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecompressError {
    /// The output buffer was too small to hold all the output.
    ///
    /// The output that has been written *is* valid, but has been truncated.
    OutputTooSmall,
}

impl fmt::Display for DecompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecompressError::OutputTooSmall => write!(f, "output buffer was insufficient"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecompressError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    TagBit,
    YieldLiteral,
    /// Bits of the index above the low 8, only for windows over 8 bits
    BackrefIndexMsb,
    BackrefIndexLsb,
    BackrefCountMsb,
    BackrefCountLsb,
    YieldBackref,
}

/// Streaming decoder
///
/// Compressed input is staged in a queue of the size given at construction;
/// [sink](Self::sink) refuses input once it is full, and [poll](Self::poll)
/// drains it. Fields are never read more than 8 bits at a time, so even a
/// one byte queue always makes progress.
#[derive(Debug)]
pub struct Decoder {
    cfg: Config,
    state: State,
    reader: BitReader,
    history: HistoryRing,
    /// Distance of the backreference being decoded or copied
    backref_distance: usize,
    /// Bytes of it still to copy
    backref_count: usize,
}

impl Decoder {
    /// Allocate a decoder with an input buffer of `input_buffer_size` bytes
    ///
    /// The window and lookahead sizes must match the ones the data was
    /// compressed with.
    pub fn new(
        input_buffer_size: usize,
        window_bits: u8,
        lookahead_bits: u8,
    ) -> Result<Self, ConfigError> {
        Self::with_config(input_buffer_size, Config::new(window_bits, lookahead_bits)?)
    }

    pub fn with_config(input_buffer_size: usize, cfg: Config) -> Result<Self, ConfigError> {
        if input_buffer_size == 0 {
            return Err(ConfigError::ZeroInputBuffer);
        }
        Ok(Self::alloc(input_buffer_size, cfg))
    }

    fn alloc(input_buffer_size: usize, cfg: Config) -> Self {
        Self {
            cfg,
            state: State::TagBit,
            reader: BitReader::new(input_buffer_size),
            history: HistoryRing::new(cfg.window_len()),
            backref_distance: 0,
            backref_count: 0,
        }
    }

    pub fn config(&self) -> Config {
        self.cfg
    }

    /// Return to the freshly constructed state, keeping the configuration
    pub fn reset(&mut self) {
        self.state = State::TagBit;
        self.reader.reset();
        self.history.reset();
        self.backref_distance = 0;
        self.backref_count = 0;
    }

    /// Stage as much of `inp` as fits in the input buffer
    pub fn sink(&mut self, inp: &[u8]) -> (SinkRes, usize) {
        if self.reader.free() == 0 {
            return (SinkRes::Full, 0);
        }

        let n = self.reader.sink(inp);
        trace!("sunk {} bytes", n);
        (SinkRes::Ok, n)
    }

    /// Expand as much staged input as possible into `outp`
    ///
    /// Returns [PollRes::More] if `outp` is full, and [PollRes::Empty] once
    /// more input is needed.
    pub fn poll(&mut self, outp: &mut [u8]) -> (PollRes, usize) {
        let mut out: BufOutput = outp.into();

        loop {
            let in_state = self.state;
            self.state = match in_state {
                State::TagBit => self.tag_bit(),
                State::YieldLiteral => self.yield_literal(&mut out),
                State::BackrefIndexMsb => self.backref_index_msb(),
                State::BackrefIndexLsb => self.backref_index_lsb(),
                State::BackrefCountMsb => self.backref_count_msb(),
                State::BackrefCountLsb => self.backref_count_lsb(),
                State::YieldBackref => self.yield_backref(&mut out),
            };

            // stuck, either for lack of input or of output space
            if self.state == in_state {
                let res = if out.can_take_byte() {
                    PollRes::Empty
                } else {
                    PollRes::More
                };
                return (res, out.pos);
            }
        }
    }

    /// Check whether all input has been processed
    ///
    /// Fewer than 8 bits left over once the input queue is empty can only be
    /// the padding of the final byte, so they are not waited on.
    pub fn finish(&mut self) -> FinishRes {
        match self.state {
            State::YieldBackref => FinishRes::More,
            _ if self.reader.is_drained() => FinishRes::Done,
            _ => FinishRes::More,
        }
    }

    fn tag_bit(&mut self) -> State {
        match self.reader.get_bits(1) {
            None => State::TagBit,
            Some(1) => State::YieldLiteral,
            Some(_) => {
                self.backref_distance = 0;
                if self.cfg.window_bits() > 8 {
                    State::BackrefIndexMsb
                } else {
                    State::BackrefIndexLsb
                }
            }
        }
    }

    fn yield_literal(&mut self, out: &mut BufOutput) -> State {
        if !out.can_take_byte() {
            return State::YieldLiteral;
        }

        match self.reader.get_bits(8) {
            None => State::YieldLiteral,
            Some(c) => {
                let c = c as u8;
                trace!("literal 0x{:02x}", c);
                self.history.push(c);
                out.putc(c);
                State::TagBit
            }
        }
    }

    fn backref_index_msb(&mut self) -> State {
        match self.reader.get_bits(self.cfg.window_bits() - 8) {
            None => State::BackrefIndexMsb,
            Some(bits) => {
                self.backref_distance = (bits as usize) << 8;
                State::BackrefIndexLsb
            }
        }
    }

    fn backref_index_lsb(&mut self) -> State {
        match self.reader.get_bits(u8::min(self.cfg.window_bits(), 8)) {
            None => State::BackrefIndexLsb,
            Some(bits) => {
                self.backref_distance |= bits as usize;
                self.backref_distance += 1;
                self.backref_count = 0;
                if self.cfg.lookahead_bits() > 8 {
                    State::BackrefCountMsb
                } else {
                    State::BackrefCountLsb
                }
            }
        }
    }

    fn backref_count_msb(&mut self) -> State {
        match self.reader.get_bits(self.cfg.lookahead_bits() - 8) {
            None => State::BackrefCountMsb,
            Some(bits) => {
                self.backref_count = (bits as usize) << 8;
                State::BackrefCountLsb
            }
        }
    }

    fn backref_count_lsb(&mut self) -> State {
        match self.reader.get_bits(u8::min(self.cfg.lookahead_bits(), 8)) {
            None => State::BackrefCountLsb,
            Some(bits) => {
                self.backref_count |= bits as usize;
                self.backref_count += 1;
                trace!(
                    "backref of {} bytes at -{}",
                    self.backref_count,
                    self.backref_distance
                );
                State::YieldBackref
            }
        }
    }

    fn yield_backref(&mut self, out: &mut BufOutput) -> State {
        let count = usize::min(out.remaining(), self.backref_count);
        if count == 0 {
            return State::YieldBackref;
        }

        // one byte at a time, so the copy can overlap its own output
        for _ in 0..count {
            let c = self.history.byte_back(self.backref_distance);
            out.putc(c);
            self.history.push(c);
        }

        self.backref_count -= count;
        if self.backref_count == 0 {
            State::TagBit
        } else {
            State::YieldBackref
        }
    }
}

/// Decompress the input into a preallocated buffer
///
/// Returns the decompressed size on success, or an error otherwise
pub fn decompress_to_buf(
    inp: &[u8],
    outp: &mut [u8],
    cfg: Config,
) -> Result<usize, DecompressError> {
    let mut dec = Decoder::alloc(ONESHOT_INPUT_BUFFER, cfg);
    let mut sunk = 0;
    let mut polled = 0;

    loop {
        let (_, n) = dec.sink(&inp[sunk..]);
        sunk += n;

        let (_, n) = dec.poll(&mut outp[polled..]);
        polled += n;

        if polled == outp.len() {
            break;
        }
        if sunk == inp.len() && dec.finish() == FinishRes::Done {
            return Ok(polled);
        }
    }

    // output is full, anything further means it was too small
    let mut spare = [0u8; 1];
    loop {
        let (_, n) = dec.poll(&mut spare);
        if n > 0 {
            return Err(DecompressError::OutputTooSmall);
        }
        if sunk == inp.len() && dec.finish() == FinishRes::Done {
            return Ok(polled);
        }

        let (_, n) = dec.sink(&inp[sunk..]);
        sunk += n;
    }
}

/// Decompress the input into a [Vec](alloc::vec::Vec)
pub fn decompress_to_vec(inp: &[u8], cfg: Config, capacity_hint: Option<usize>) -> Vec<u8> {
    let mut ret = if let Some(capacity_hint) = capacity_hint {
        Vec::with_capacity(capacity_hint)
    } else {
        Vec::new()
    };
    let mut dec = Decoder::alloc(ONESHOT_INPUT_BUFFER, cfg);
    let mut chunk = [0u8; VEC_CHUNK];
    let mut sunk = 0;

    loop {
        let (_, n) = dec.sink(&inp[sunk..]);
        sunk += n;

        loop {
            let (res, n) = dec.poll(&mut chunk);
            ret.extend_from_slice(&chunk[..n]);
            if res == PollRes::Empty {
                break;
            }
        }

        if sunk == inp.len() && dec.finish() == FinishRes::Done {
            return ret;
        }
    }
}
