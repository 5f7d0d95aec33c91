//! Line assembly over the upstream console text.
//!
//! The upstream log is fetched as raw text slices starting at a byte
//! offset. Slice boundaries fall anywhere, including mid-line and between
//! the bytes of a CRLF pair, so the cursor buffers the trailing partial
//! line until its terminator arrives.

use crate::domain::messages::LogLine;

/// Tracks how far into a build's console text a session has read and
/// assembles complete lines from the fetched chunks.
#[derive(Debug, Default)]
pub struct LineCursor {
    offset: u64,
    pending: String,
}

impl LineCursor {
    /// Creates a cursor at the start of the log.
    pub fn new() -> Self {
        Self {
            offset: 0,
            pending: String::new(),
        }
    }

    /// Next byte offset to fetch from the sink.
    ///
    /// Counts every byte consumed, terminators included, so it can be
    /// compared against the sink's reported total length.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// True if a partial line is buffered awaiting its terminator.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Consumes a chunk fetched at `offset()` and returns the complete
    /// lines it finishes, in order.
    ///
    /// Lines are terminated by `\n`; a preceding `\r` is stripped. Empty
    /// lines are preserved. A trailing partial line stays buffered.
    pub fn advance(&mut self, chunk: &str) -> Vec<LogLine> {
        self.offset += chunk.len() as u64;
        self.pending.push_str(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(LogLine::new(line));
        }
        lines
    }

    /// Emits the buffered partial line, if any.
    ///
    /// Called once the build is finished and no further text will arrive;
    /// the last line of a console log often has no trailing newline.
    pub fn flush(&mut self) -> Option<LogLine> {
        if self.pending.is_empty() {
            return None;
        }
        let mut line = std::mem::take(&mut self.pending);
        if line.ends_with('\r') {
            line.pop();
        }
        Some(LogLine::new(line))
    }
}
