//! Newline framing with a hard length bound.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use log::warn;
use st_model::MAX_MESSAGE_LENGTH;

/// One overflow warning per this many discards.
const OVERFLOW_WARN_EVERY: u32 = 16;

/// Accumulates raw link bytes into complete `\n`-terminated lines.
///
/// A partial line that reaches [`MAX_MESSAGE_LENGTH`] before its terminator
/// is discarded whole and the buffer reset; a partial message is never
/// delivered. Carriage returns before the terminator are tolerated and
/// stripped. Lines that are not valid UTF-8 are dropped.
pub struct LineFramer {
    buffer: Vec<u8>,
    overflows: u32,
    bad_utf8: u32,
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflows: 0,
            bad_utf8: 0,
        }
    }

    /// Feed received bytes, invoking `on_line` for each completed line
    /// (terminator stripped).
    pub fn push_bytes(&mut self, bytes: &[u8], mut on_line: impl FnMut(String)) {
        for &byte in bytes {
            if byte == b'\n' {
                let mut line = core::mem::take(&mut self.buffer);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                match String::from_utf8(line) {
                    Ok(line) => on_line(line),
                    Err(_) => {
                        self.bad_utf8 = self.bad_utf8.wrapping_add(1);
                        warn!("dropped non-UTF-8 line ({} so far)", self.bad_utf8);
                    }
                }
            } else {
                self.buffer.push(byte);
                if self.buffer.len() >= MAX_MESSAGE_LENGTH {
                    self.buffer.clear();
                    self.overflows = self.overflows.wrapping_add(1);
                    if self.overflows % OVERFLOW_WARN_EVERY == 1 {
                        warn!("line overflow, {} partial lines discarded so far", self.overflows);
                    }
                }
            }
        }
    }

    /// Partial lines discarded for exceeding the frame limit.
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Bytes currently buffered toward an incomplete line.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}
