//! Longest-match search over the encoder's [SearchBuffer](crate::window::SearchBuffer)

#[cfg(feature = "search-index")]
use alloc::{boxed::Box, vec};

/// A match found by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Match {
    /// How far back the match starts, `1` being the previous byte
    pub distance: usize,
    pub len: usize,
}

/// Find the longest run matching `buf[end..end + max_len]` starting at one
/// of `candidates`
///
/// Candidates must be visited from most recent to oldest: an older candidate
/// only wins if it is strictly longer, so ties go to the shortest distance.
/// The match may run past `end` into the bytes it is matching against.
///
/// Matches of `break_even` bytes or fewer are not worth a backreference and
/// are not reported.
fn longest_match(
    buf: &[u8],
    candidates: impl Iterator<Item = usize>,
    end: usize,
    max_len: usize,
    break_even: usize,
) -> Option<Match> {
    let needle = &buf[end..end + max_len];
    let mut best_len = 0;
    let mut best_pos = None;

    for pos in candidates {
        let cand = &buf[pos..pos + max_len];
        // cheap reject, the candidate can't beat what we have
        if cand[best_len] != needle[best_len] || cand[0] != needle[0] {
            continue;
        }

        let len = 1 + cand[1..]
            .iter()
            .zip(needle[1..].iter())
            .take_while(|(a, b)| a == b)
            .count();

        if len > best_len {
            best_len = len;
            best_pos = Some(pos);
            if len == max_len {
                break;
            }
        }
    }

    match best_pos {
        Some(pos) if best_len > break_even => Some(Match {
            distance: end - pos,
            len: best_len,
        }),
        _ => None,
    }
}

/// Brute force: every position in `start..end`, newest first
#[cfg_attr(feature = "search-index", allow(dead_code))]
pub(crate) fn find_longest_match(
    buf: &[u8],
    start: usize,
    end: usize,
    max_len: usize,
    break_even: usize,
) -> Option<Match> {
    longest_match(buf, (start..end).rev(), end, max_len, break_even)
}

/// Per-position link to the previous position holding the same byte
///
/// Lets the search skip straight to positions whose first byte matches.
/// Results are identical to [find_longest_match].
#[cfg(feature = "search-index")]
#[derive(Debug)]
pub(crate) struct SearchIndex {
    links: Box<[Option<u16>]>,
}
#[cfg(feature = "search-index")]
impl SearchIndex {
    pub fn new(len: usize) -> Self {
        debug_assert!(len <= u16::MAX as usize + 1);
        Self {
            links: vec![None; len].into_boxed_slice(),
        }
    }

    pub fn reset(&mut self) {
        self.links.fill(None);
    }

    /// Relink every position of `data`
    pub fn rebuild(&mut self, data: &[u8]) {
        let mut last = [None; 256];
        for (i, &b) in data.iter().enumerate() {
            self.links[i] = last[b as usize];
            last[b as usize] = Some(i as u16);
        }
    }

    /// Earlier positions with the same byte as `pos`, newest first
    fn chain(&self, pos: usize) -> impl Iterator<Item = usize> + '_ {
        let mut next = self.links[pos];
        core::iter::from_fn(move || {
            let cur = next? as usize;
            next = self.links[cur];
            Some(cur)
        })
    }

    pub fn find_longest_match(
        &self,
        buf: &[u8],
        start: usize,
        end: usize,
        max_len: usize,
        break_even: usize,
    ) -> Option<Match> {
        let candidates = self.chain(end).take_while(|&pos| pos >= start);
        longest_match(buf, candidates, end, max_len, break_even)
    }
}
