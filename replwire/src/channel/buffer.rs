//! Pattern buffer with incremental windowed search.
//!
//! Only bytes that arrived since the last search, plus an overlap of
//! `search_depth` bytes, are scanned for prompt patterns. A prompt split
//! across two reads is still found as long as it is shorter than the overlap,
//! and large outputs are never rescanned from the start.

use bytes::{Buf, BytesMut};
use regex::bytes::{Match, Regex};

use super::patterns::PromptMatcher;

/// Buffer for accumulating raw shell output and locating prompt boundaries.
///
/// Bytes are stored exactly as read from the terminal. Escape sequences are
/// left in place because the response filter and the emptiness check both
/// depend on them.
#[derive(Debug)]
pub struct PatternBuffer {
    /// The accumulated, not yet consumed output.
    buffer: BytesMut,

    /// How many already-scanned bytes to re-search on the next call.
    search_depth: usize,

    /// Length of the buffer at the last search.
    scanned: usize,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    ///
    /// # Arguments
    ///
    /// * `search_depth` - Number of previously scanned bytes to include in the
    ///   next search. Must be at least the length of the longest prompt;
    ///   `DriverBuilder` rejects smaller values.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            scanned: 0,
        }
    }

    /// Append raw bytes read from the child.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Offset where the next incremental search begins.
    pub fn window_start(&self) -> usize {
        self.scanned.saturating_sub(self.search_depth)
    }

    /// Search the unscanned region (plus overlap) for `pattern`.
    ///
    /// Returned offsets are absolute positions in the buffer.
    pub fn search_window<M: PromptMatcher + ?Sized>(&self, pattern: &M) -> Option<(usize, usize)> {
        let start = self.window_start();
        pattern
            .find_span(&self.buffer[start..])
            .map(|(s, e)| (start + s, start + e))
    }

    /// Record that everything currently buffered has been searched.
    pub fn mark_scanned(&mut self) {
        self.scanned = self.buffer.len();
    }

    /// Search the entire buffer for a pattern.
    pub fn search_full(&self, pattern: &Regex) -> Option<Match<'_>> {
        pattern.find(&self.buffer)
    }

    /// Remove and return the bytes before `start`, dropping `start..end`.
    ///
    /// Whatever follows `end` stays buffered and is treated as unscanned.
    pub fn consume_match(&mut self, start: usize, end: usize) -> Vec<u8> {
        let before = self.buffer.split_to(start).to_vec();
        self.buffer.advance(end - start);
        self.scanned = 0;
        before
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Vec<u8> {
        self.scanned = 0;
        self.buffer.split().to_vec()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}
