//! Line framing for the Pico command protocol.
//!
//! Commands go out as a single text line terminated by `\n`. Responses come
//! back as `\n`-terminated text with no length prefix and no end-of-response
//! marker; see [`engine`](crate::engine) for how a response is judged
//! complete. Text is decoded best-effort: byte sequences that are not valid
//! UTF-8 are dropped rather than failing the read.

use bytes::BytesMut;

/// Terminates every command and every response line.
pub const LINE_DELIMITER: u8 = b'\n';

/// Upper bound on buffered bytes without a delimiter before the buffer is
/// flushed as a partial line. The firmware's longest help text lines are
/// well under this.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Encode a command for transmission.
///
/// Appends the line delimiter; the command text itself is sent as-is.
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(command.len() + 1);
    buf.extend_from_slice(command.as_bytes());
    buf.push(LINE_DELIMITER);
    buf
}

/// Decode bytes as UTF-8, silently dropping invalid sequences.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

/// Accumulates received bytes and splits them into lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
    /// Set when a partial line was discarded; incoming bytes are dropped up
    /// to and including the next delimiter.
    resync: bool,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(256),
            resync: false,
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        let data = if self.resync {
            match data.iter().position(|&b| b == LINE_DELIMITER) {
                Some(end) => {
                    self.resync = false;
                    &data[end + 1..]
                }
                None => return,
            }
        } else {
            data
        };
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete line, without its delimiter.
    ///
    /// A line that has grown past [`MAX_LINE_LENGTH`] without a delimiter is
    /// returned as-is so a misbehaving device cannot grow the buffer forever.
    pub fn next_line(&mut self) -> Option<String> {
        match self.buffer.iter().position(|&b| b == LINE_DELIMITER) {
            Some(end) => {
                let line = self.buffer.split_to(end + 1);
                Some(decode_lossy(&line[..end]))
            }
            None if self.buffer.len() > MAX_LINE_LENGTH => self.take_partial(),
            None => None,
        }
    }

    /// Take whatever is buffered even though no delimiter has arrived.
    pub fn take_partial(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = self.buffer.split();
        Some(decode_lossy(&rest))
    }

    /// Number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered after an aborted read, returning the number
    /// of bytes dropped.
    ///
    /// If the buffer ended mid-line, the remainder of that line is dropped
    /// as well when it arrives.
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.len();
        if self.buffer.last().is_some_and(|&b| b != LINE_DELIMITER) {
            self.resync = true;
        }
        self.buffer.clear();
        dropped
    }

    /// Drop everything buffered and forget any pending resync.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.resync = false;
    }
}
