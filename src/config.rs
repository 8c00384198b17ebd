use core::fmt;

#[cfg(feature = "std")]
extern crate std;

/// Smallest accepted window size, as a power of two
pub const MIN_WINDOW_BITS: u8 = 4;
/// Largest accepted window size, as a power of two
pub const MAX_WINDOW_BITS: u8 = 15;
/// Smallest accepted lookahead size, as a power of two
pub const MIN_LOOKAHEAD_BITS: u8 = 3;

/// Configuration errors, reported when constructing an encoder or decoder
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// Window bits outside of `MIN_WINDOW_BITS..=MAX_WINDOW_BITS`
    WindowBitsOutOfRange,
    /// Lookahead bits below `MIN_LOOKAHEAD_BITS`, or not smaller than the window bits
    LookaheadBitsOutOfRange,
    /// The decoder input buffer must hold at least one byte
    ZeroInputBuffer,
}
impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::WindowBitsOutOfRange => write!(
                f,
                "window bits must be between {} and {}",
                MIN_WINDOW_BITS, MAX_WINDOW_BITS
            ),
            ConfigError::LookaheadBitsOutOfRange => write!(
                f,
                "lookahead bits must be at least {} and less than the window bits",
                MIN_LOOKAHEAD_BITS
            ),
            ConfigError::ZeroInputBuffer => write!(f, "input buffer size must be nonzero"),
        }
    }
}
#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Window and lookahead sizes shared by an encoder and its matching decoder
///
/// Nothing about the configuration is stored in the compressed stream,
/// so both sides must agree on it out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    window_bits: u8,
    lookahead_bits: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_bits: 11,
            lookahead_bits: 4,
        }
    }
}

impl Config {
    /// Validate a window size of `2^window_bits` and a lookahead of `2^lookahead_bits`
    pub fn new(window_bits: u8, lookahead_bits: u8) -> Result<Self, ConfigError> {
        if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
            return Err(ConfigError::WindowBitsOutOfRange);
        }
        if lookahead_bits < MIN_LOOKAHEAD_BITS || lookahead_bits >= window_bits {
            return Err(ConfigError::LookaheadBitsOutOfRange);
        }

        Ok(Self {
            window_bits,
            lookahead_bits,
        })
    }

    pub fn window_bits(&self) -> u8 {
        self.window_bits
    }

    pub fn lookahead_bits(&self) -> u8 {
        self.lookahead_bits
    }

    /// Number of bytes a backreference can reach back
    pub fn window_len(&self) -> usize {
        1 << self.window_bits
    }

    /// Longest single match
    pub fn lookahead_len(&self) -> usize {
        1 << self.lookahead_bits
    }

    /// Matches of this many bytes or fewer cost at least as much as literals
    pub(crate) fn break_even(&self) -> usize {
        (1 + self.window_bits as usize + self.lookahead_bits as usize) / 8
    }
}
