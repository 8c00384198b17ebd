//! Streaming [heatshrink](https://github.com/atomicobject/heatshrink)
//! compression and decompression in bounded memory
//!
//! Both [Encoder] and [Decoder] are driven with the same three calls:
//! [sink](Encoder::sink) input into them, [poll](Encoder::poll) output out of
//! them until they report [PollRes::Empty], and once all input has been sunk
//! call [finish](Encoder::finish) (polling again while it reports
//! [FinishRes::More]). Memory is allocated once, at construction, and
//! depends only on the [Config].
//!
//! [compress_to_vec] and [decompress_to_vec] wrap all of that for when the
//! data is already in memory.

#![no_std]

extern crate alloc;

/// Trace-level logging, compiled out unless the `tracing` feature is on
macro_rules! trace {
    ($($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)+);
    }};
}

mod bits;
mod compress;
mod config;
mod decompress;
mod matcher;
mod util;
mod window;

pub use compress::{compress_to_buf, compress_to_vec, CompressError, Encoder};
pub use config::{
    Config, ConfigError, MAX_WINDOW_BITS, MIN_LOOKAHEAD_BITS, MIN_WINDOW_BITS,
};
pub use decompress::{decompress_to_buf, decompress_to_vec, DecompressError, Decoder};

/// Result of a `sink` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkRes {
    /// Some input was accepted (possibly none, if none was given)
    Ok,
    /// No room for input until output has been polled
    Full,
}

/// Result of a `poll` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollRes {
    /// Nothing more can be produced until more input is sunk
    Empty,
    /// The output buffer filled up, poll again
    More,
}

/// Result of a `finish` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishRes {
    /// All output has been produced
    Done,
    /// There is still output to poll
    More,
}
