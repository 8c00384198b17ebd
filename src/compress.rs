use core::fmt;

use alloc::vec::Vec;

use crate::bits::{BitWriter, PendingField};
#[cfg(not(feature = "search-index"))]
use crate::matcher::find_longest_match;
#[cfg(feature = "search-index")]
use crate::matcher::SearchIndex;
use crate::util::BufOutput;
use crate::window::SearchBuffer;
use crate::{Config, ConfigError, FinishRes, PollRes, SinkRes};

#[cfg(feature = "std")]
extern crate std;

/// Scratch space used by [compress_to_vec] per poll
const VEC_CHUNK: usize = 256;

/// Compression errors
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum CompressError {
    /// The output buffer was too small to hold all the output.
    ///
    /// The output that has been written *is* valid, but has been truncated.
    OutputTooSmall,
}
impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressError::OutputTooSmall => write!(f, "output buffer was insufficient"),
        }
    }
}
#[cfg(feature = "std")]
impl std::error::Error for CompressError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Input half not full yet, waiting for more sink or a finish
    NotFull,
    /// Input ready to be scanned
    Filled,
    Search,
    YieldTagBit,
    YieldLiteral,
    YieldBackrefIndex,
    YieldBackrefLength,
    /// Scanned as far as the lookahead allows, slide the buffer down
    SaveBacklog,
    /// Finishing, write out the last partial byte
    FlushBits,
    Done,
}

/// Streaming encoder
///
/// Feed input with [sink](Self::sink), collect compressed bytes with
/// [poll](Self::poll), and call [finish](Self::finish) once all input has
/// been sunk (continuing to poll until it returns [FinishRes::Done]).
/// All memory is allocated up front in the constructor.
#[derive(Debug)]
pub struct Encoder {
    cfg: Config,
    state: State,
    finishing: bool,
    buffer: SearchBuffer,
    #[cfg(feature = "search-index")]
    index: SearchIndex,
    /// Bytes in the input half of `buffer`
    input_size: usize,
    /// Next input byte to be encoded, relative to the input half
    match_scan_index: usize,
    /// Zero for a literal
    match_length: usize,
    match_distance: usize,
    field: PendingField,
    bits: BitWriter,
}

impl Encoder {
    /// Allocate an encoder with a window of `2^window_bits` bytes and
    /// matches of up to `2^lookahead_bits` bytes
    pub fn new(window_bits: u8, lookahead_bits: u8) -> Result<Self, ConfigError> {
        Ok(Self::with_config(Config::new(window_bits, lookahead_bits)?))
    }

    pub fn with_config(cfg: Config) -> Self {
        let window_len = cfg.window_len();
        Self {
            cfg,
            state: State::NotFull,
            finishing: false,
            buffer: SearchBuffer::new(window_len),
            #[cfg(feature = "search-index")]
            index: SearchIndex::new(2 * window_len),
            input_size: 0,
            match_scan_index: 0,
            match_length: 0,
            match_distance: 0,
            field: PendingField::default(),
            bits: BitWriter::new(),
        }
    }

    pub fn config(&self) -> Config {
        self.cfg
    }

    /// Return to the freshly constructed state, keeping the configuration
    pub fn reset(&mut self) {
        self.state = State::NotFull;
        self.finishing = false;
        self.buffer.reset();
        #[cfg(feature = "search-index")]
        self.index.reset();
        self.input_size = 0;
        self.match_scan_index = 0;
        self.match_length = 0;
        self.match_distance = 0;
        self.field = PendingField::default();
        self.bits.reset();
    }

    /// Copy as much of `inp` as currently fits into the encoder
    ///
    /// Returns [SinkRes::Full] without consuming anything if the input buffer
    /// is waiting to be polled, or if the stream has been finished.
    pub fn sink(&mut self, inp: &[u8]) -> (SinkRes, usize) {
        if self.finishing || self.state != State::NotFull {
            return (SinkRes::Full, 0);
        }

        let rem = self.cfg.window_len() - self.input_size;
        let len = usize::min(rem, inp.len());
        self.buffer.write_input(self.input_size, &inp[..len]);
        self.input_size += len;
        trace!("sunk {} bytes, {} buffered", len, self.input_size);

        if len == rem {
            self.state = State::Filled;
        }
        (SinkRes::Ok, len)
    }

    /// Write as much compressed output as possible into `outp`
    ///
    /// Returns [PollRes::More] if `outp` filled up before the encoder ran out
    /// of work, and [PollRes::Empty] if more input (or a finish) is needed.
    pub fn poll(&mut self, outp: &mut [u8]) -> (PollRes, usize) {
        let mut out: BufOutput = outp.into();

        loop {
            let in_state = self.state;
            self.state = match in_state {
                State::NotFull | State::Done => return (PollRes::Empty, out.pos),
                State::Filled => {
                    self.index_input();
                    State::Search
                }
                State::Search => self.step_search(),
                State::YieldTagBit => self.yield_tag_bit(&mut out),
                State::YieldLiteral => self.yield_literal(&mut out),
                State::YieldBackrefIndex => self.yield_backref_index(&mut out),
                State::YieldBackrefLength => self.yield_backref_length(&mut out),
                State::SaveBacklog => self.save_backlog(),
                State::FlushBits => self.flush_bits(&mut out),
            };

            if self.state == in_state && !out.can_take_byte() {
                return (PollRes::More, out.pos);
            }
        }
    }

    /// Mark the end of input
    ///
    /// Returns [FinishRes::More] until every buffered byte has been polled out.
    pub fn finish(&mut self) -> FinishRes {
        self.finishing = true;
        if self.state == State::NotFull {
            self.state = State::Filled;
        }

        if self.state == State::Done {
            FinishRes::Done
        } else {
            FinishRes::More
        }
    }

    #[cfg(feature = "search-index")]
    fn index_input(&mut self) {
        let end = self.buffer.input_offset() + self.input_size;
        self.index.rebuild(&self.buffer.as_slice()[..end]);
    }

    #[cfg(not(feature = "search-index"))]
    fn index_input(&mut self) {}

    fn step_search(&mut self) -> State {
        let window_len = self.cfg.window_len();
        let lookahead_len = self.cfg.lookahead_len();
        let msi = self.match_scan_index;

        // until finishing, keep a full lookahead in front of the scan
        let needed = if self.finishing { 1 } else { lookahead_len };
        if msi + needed > self.input_size {
            trace!("end of search at {}", msi);
            return if self.finishing {
                State::FlushBits
            } else {
                State::SaveBacklog
            };
        }

        let end = self.buffer.input_offset() + msi;
        let start = end - window_len;
        let max_len = usize::min(lookahead_len, self.input_size - msi);
        let buf = self.buffer.as_slice();
        let break_even = self.cfg.break_even();

        #[cfg(feature = "search-index")]
        let found = self
            .index
            .find_longest_match(buf, start, end, max_len, break_even);
        #[cfg(not(feature = "search-index"))]
        let found = find_longest_match(buf, start, end, max_len, break_even);

        match found {
            Some(m) => {
                trace!("match of {} bytes at -{}", m.len, m.distance);
                self.match_length = m.len;
                self.match_distance = m.distance;
            }
            None => {
                self.match_length = 0;
            }
        }
        State::YieldTagBit
    }

    fn yield_tag_bit(&mut self, out: &mut BufOutput) -> State {
        if !out.can_take_byte() {
            return State::YieldTagBit;
        }

        if self.match_length == 0 {
            self.bits.push_bits(1, 1, out);
            State::YieldLiteral
        } else {
            self.bits.push_bits(1, 0, out);
            self.field = PendingField::new(
                (self.match_distance - 1) as u16,
                self.cfg.window_bits(),
            );
            State::YieldBackrefIndex
        }
    }

    fn yield_literal(&mut self, out: &mut BufOutput) -> State {
        if !out.can_take_byte() {
            return State::YieldLiteral;
        }

        let c = self.buffer.as_slice()[self.buffer.input_offset() + self.match_scan_index];
        trace!("literal 0x{:02x}", c);
        self.bits.push_bits(8, c, out);
        self.match_scan_index += 1;
        State::Search
    }

    fn yield_backref_index(&mut self, out: &mut BufOutput) -> State {
        if !out.can_take_byte() {
            return State::YieldBackrefIndex;
        }

        self.field.push_chunk(&mut self.bits, out);
        if self.field.is_done() {
            self.field =
                PendingField::new((self.match_length - 1) as u16, self.cfg.lookahead_bits());
            State::YieldBackrefLength
        } else {
            State::YieldBackrefIndex
        }
    }

    fn yield_backref_length(&mut self, out: &mut BufOutput) -> State {
        if !out.can_take_byte() {
            return State::YieldBackrefLength;
        }

        self.field.push_chunk(&mut self.bits, out);
        if self.field.is_done() {
            self.match_scan_index += self.match_length;
            self.match_length = 0;
            State::Search
        } else {
            State::YieldBackrefLength
        }
    }

    fn save_backlog(&mut self) -> State {
        let processed = self.match_scan_index;
        trace!("saving backlog, {} bytes processed", processed);
        self.buffer.slide(processed);
        self.input_size -= processed;
        self.match_scan_index = 0;
        State::NotFull
    }

    fn flush_bits(&mut self, out: &mut BufOutput) -> State {
        if !self.bits.has_partial_byte() {
            trace!("done");
            State::Done
        } else if out.can_take_byte() {
            trace!("flushing final partial byte");
            self.bits.flush(out);
            State::Done
        } else {
            State::FlushBits
        }
    }
}

/// Compress the input into a preallocated buffer
///
/// Returns the compressed size on success, or an error otherwise
pub fn compress_to_buf(inp: &[u8], outp: &mut [u8], cfg: Config) -> Result<usize, CompressError> {
    let mut enc = Encoder::with_config(cfg);
    let mut sunk = 0;
    let mut polled = 0;

    loop {
        if sunk < inp.len() {
            let (_, n) = enc.sink(&inp[sunk..]);
            sunk += n;
        }
        if sunk == inp.len() && enc.finish() == FinishRes::Done {
            return Ok(polled);
        }

        let (res, n) = enc.poll(&mut outp[polled..]);
        polled += n;
        if res == PollRes::More {
            return Err(CompressError::OutputTooSmall);
        }
    }
}

/// Compress the input into a [Vec](alloc::vec::Vec)
pub fn compress_to_vec(inp: &[u8], cfg: Config) -> Vec<u8> {
    let mut enc = Encoder::with_config(cfg);
    let mut ret = Vec::with_capacity(inp.len() / 2);
    let mut chunk = [0u8; VEC_CHUNK];
    let mut sunk = 0;

    loop {
        if sunk < inp.len() {
            let (_, n) = enc.sink(&inp[sunk..]);
            sunk += n;
        }
        if sunk == inp.len() && enc.finish() == FinishRes::Done {
            return ret;
        }

        loop {
            let (res, n) = enc.poll(&mut chunk);
            ret.extend_from_slice(&chunk[..n]);
            if res == PollRes::Empty {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_all(enc: &mut Encoder, inp: &[u8]) -> Vec<u8> {
        let (res, n) = enc.sink(inp);
        assert_eq!(res, SinkRes::Ok);
        assert_eq!(n, inp.len());

        let mut out = [0u8; 1024];
        assert_eq!(enc.finish(), FinishRes::More);
        let (res, n) = enc.poll(&mut out);
        assert_eq!(res, PollRes::Empty);
        assert_eq!(enc.finish(), FinishRes::Done);
        out[..n].to_vec()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        assert_eq!(
            Encoder::new(3, 8).unwrap_err(),
            ConfigError::WindowBitsOutOfRange
        );
        assert_eq!(
            Encoder::new(16, 8).unwrap_err(),
            ConfigError::WindowBitsOutOfRange
        );
        assert_eq!(
            Encoder::new(8, 2).unwrap_err(),
            ConfigError::LookaheadBitsOutOfRange
        );
        assert_eq!(
            Encoder::new(8, 9).unwrap_err(),
            ConfigError::LookaheadBitsOutOfRange
        );
    }

    #[test]
    fn test_sink_whole_window() {
        let mut enc = Encoder::new(8, 7).unwrap();
        assert_eq!(enc.sink(&[b'*'; 256]), (SinkRes::Ok, 256));
    }

    #[test]
    fn test_sink_partial() {
        let mut enc = Encoder::new(8, 7).unwrap();
        assert_eq!(enc.sink(&[b'*'; 512]), (SinkRes::Ok, 256));
        // nothing more until polled
        assert_eq!(enc.sink(&[b'*'; 1]), (SinkRes::Full, 0));
    }

    #[test]
    fn test_sink_after_finish() {
        let mut enc = Encoder::new(8, 7).unwrap();
        enc.finish();
        assert_eq!(enc.sink(&[1, 2, 3]), (SinkRes::Full, 0));
    }

    #[test]
    fn test_poll_without_input() {
        let mut enc = Encoder::new(8, 7).unwrap();
        let mut out = [0u8; 512];
        assert_eq!(enc.poll(&mut out), (PollRes::Empty, 0));
    }

    #[test]
    fn test_empty_stream() {
        let mut enc = Encoder::new(8, 7).unwrap();
        assert_eq!(enc.finish(), FinishRes::More);
        let mut out = [0u8; 4];
        assert_eq!(enc.poll(&mut out), (PollRes::Empty, 0));
        assert_eq!(enc.finish(), FinishRes::Done);
    }

    #[test]
    fn test_literals_only() {
        let mut enc = Encoder::new(8, 7).unwrap();
        assert_eq!(enc.sink(&[0, 1, 2, 3, 4]), (SinkRes::Ok, 5));

        // no output until the encoder knows the input is complete
        let mut out = [0u8; 1024];
        assert_eq!(enc.poll(&mut out), (PollRes::Empty, 0));

        assert_eq!(enc.finish(), FinishRes::More);
        let (res, n) = enc.poll(&mut out);
        assert_eq!(res, PollRes::Empty);
        assert_eq!(out[..n], [0x80, 0x40, 0x60, 0x50, 0x38, 0x20]);
        assert_eq!(enc.finish(), FinishRes::Done);
    }

    #[test]
    fn test_literal_then_backref() {
        let mut enc = Encoder::new(8, 7).unwrap();
        assert_eq!(encode_all(&mut enc, b"aaaaa"), [0xb0, 0x80, 0x01, 0x80]);
    }

    #[test]
    fn test_repeated_substring() {
        let mut enc = Encoder::new(8, 3).unwrap();
        assert_eq!(
            encode_all(&mut enc, b"abcdabcd"),
            [0xb0, 0xd8, 0xac, 0x76, 0x40, 0x1b]
        );
    }

    #[test]
    fn test_repeated_substring_trailing_literal() {
        let mut enc = Encoder::new(8, 3).unwrap();
        assert_eq!(
            encode_all(&mut enc, b"abcdabcde"),
            [0xb0, 0xd8, 0xac, 0x76, 0x40, 0x1b, 0xb2, 0x80]
        );
    }

    #[test]
    fn test_tiny_output_buffer() {
        let mut enc = Encoder::new(8, 3).unwrap();
        for &b in b"abcdabcde" {
            assert_eq!(enc.sink(&[b]), (SinkRes::Ok, 1));
        }
        assert_eq!(enc.finish(), FinishRes::More);

        let mut out = [0u8; 16];
        let mut n = 0;
        while enc.finish() == FinishRes::More {
            let (_, count) = enc.poll(&mut out[n..n + 1]);
            n += count;
        }
        assert_eq!(out[..n], [0xb0, 0xd8, 0xac, 0x76, 0x40, 0x1b, 0xb2, 0x80]);
    }

    #[test]
    fn test_poll_more_on_full_output() {
        let mut enc = Encoder::new(8, 7).unwrap();
        enc.sink(&[0, 1, 2, 3, 4]);
        enc.finish();

        let mut out = [0u8; 4];
        assert_eq!(enc.poll(&mut out), (PollRes::More, 4));
        assert_eq!(enc.finish(), FinishRes::More);
        let (res, n) = enc.poll(&mut out);
        assert_eq!(res, PollRes::Empty);
        assert_eq!(out[..n], [0x38, 0x20]);
        assert_eq!(enc.finish(), FinishRes::Done);
    }

    #[test]
    fn test_reset() {
        let mut enc = Encoder::new(8, 7).unwrap();
        enc.sink(b"abcabcabc");
        enc.finish();
        let mut out = [0u8; 2];
        enc.poll(&mut out);

        enc.reset();
        assert_eq!(encode_all(&mut enc, b"aaaaa"), [0xb0, 0x80, 0x01, 0x80]);
    }

    #[test]
    fn test_matches_reference_encoder() {
        // produced by the reference C implementation
        let inp = hex_literal::hex!(
            "21529554340200000000000000000000000000000000000000000000000000000000000000000000"
            "9302000000000000F202F102F0020000000000002F04000000000000000000000000000000000000"
            "00000000"
        );

        let cfg = Config::new(11, 4).unwrap();
        assert_eq!(
            compress_to_vec(&inp, cfg),
            hex_literal::hex!("90D4B2B549A408057C003E0100C9811B7CA05F1817C002DA5F04025F0005")
        );

        let cfg = Config::new(8, 4).unwrap();
        assert_eq!(
            compress_to_vec(&inp, cfg),
            hex_literal::hex!("90D4B2B549A4082BE00F000E4C46DF2817C605F005B4BE0825F00280")
        );
    }

    #[test]
    fn test_compress_to_buf() {
        let cfg = Config::new(8, 7).unwrap();
        let mut out = [0u8; 4];
        assert_eq!(compress_to_buf(b"aaaaa", &mut out, cfg), Ok(4));
        assert_eq!(out, [0xb0, 0x80, 0x01, 0x80]);

        let mut out = [0u8; 3];
        assert_eq!(
            compress_to_buf(b"aaaaa", &mut out, cfg),
            Err(CompressError::OutputTooSmall)
        );
        assert_eq!(out, [0xb0, 0x80, 0x01]);

        let mut out = [0u8; 0];
        assert_eq!(compress_to_buf(b"", &mut out, cfg), Ok(0));

        // "abcdabcd" ends on a backref that completes the last byte exactly
        let cfg = Config::new(8, 3).unwrap();
        let mut out = [0u8; 6];
        assert_eq!(compress_to_buf(b"abcdabcd", &mut out, cfg), Ok(6));
        assert_eq!(out, [0xb0, 0xd8, 0xac, 0x76, 0x40, 0x1b]);
    }

    #[test]
    fn test_long_input_spans_backlog() {
        // several window refills, sunk in awkward chunk sizes
        let cfg = Config::new(5, 3).unwrap();
        let inp: Vec<u8> = (0..1000u32).map(|i| b"abcdefg"[(i % 7) as usize] ^ (i / 97) as u8).collect();
        let expected = compress_to_vec(&inp, cfg);

        let mut enc = Encoder::with_config(cfg);
        let mut out = Vec::new();
        let mut chunk = [0u8; 3];
        for piece in inp.chunks(13) {
            let mut sunk = 0;
            while sunk < piece.len() {
                let (_, n) = enc.sink(&piece[sunk..]);
                sunk += n;
                loop {
                    let (res, n) = enc.poll(&mut chunk);
                    out.extend_from_slice(&chunk[..n]);
                    if res == PollRes::Empty {
                        break;
                    }
                }
            }
        }
        while enc.finish() == FinishRes::More {
            let (_, n) = enc.poll(&mut chunk);
            out.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(out, expected);
    }
}
