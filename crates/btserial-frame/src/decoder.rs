use bytes::Bytes;
use tracing::trace;

use crate::codec::{ESCAPE, ESCAPED_ESCAPE, ESCAPED_START, START};

/// Default decoder buffer capacity. Any legal length byte (up to 255)
/// fits, so no well-formed frame is ever rejected as oversized.
pub const DEFAULT_CAPACITY: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingStart,
    AwaitingLength,
    Buffering,
    AwaitingEscape,
}

/// Byte-at-a-time frame decoder.
///
/// Feed it raw bytes from a live stream; it reassembles complete,
/// checksum-validated frames with no backtracking. Corruption in any form
/// (oversized length claim, checksum mismatch, invalid escape sequence)
/// discards the frame in progress and resynchronizes on the next start
/// marker.
///
/// The internal buffer is fixed at construction and reused across frames;
/// a completed frame is handed out as an independent copy. Delivered
/// payloads INCLUDE the trailing checksum byte as their last element —
/// this is the documented wire contract, callers wanting only the
/// application payload must strip it.
#[derive(Debug)]
pub struct Decoder {
    buf: Box<[u8]>,
    pos: usize,
    frame_len: usize,
    state: State,
}

impl Decoder {
    /// Create a decoder with a fixed buffer capacity. The capacity bounds
    /// the maximum length byte the decoder will accept.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            frame_len: 0,
            state: State::AwaitingStart,
        }
    }

    /// Buffer capacity fixed at construction.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Discard any frame in progress and hunt for the next start marker.
    pub fn reset(&mut self) {
        self.state = State::AwaitingStart;
    }

    /// Process one byte from the stream.
    ///
    /// Returns a completed, checksum-validated frame (payload plus
    /// trailing checksum byte) when this byte closes one, `None`
    /// otherwise. Never fails: malformed input only resynchronizes.
    pub fn feed(&mut self, byte: u8) -> Option<Bytes> {
        match self.state {
            State::AwaitingStart => {
                if byte == START {
                    self.state = State::AwaitingLength;
                }
                None
            }
            State::AwaitingLength => self.begin_frame(byte),
            State::Buffering => {
                if byte == START {
                    // A fresh start marker mid-frame: the start is already
                    // consumed, so go straight to the length byte.
                    trace!("start marker inside frame, discarding partial");
                    self.state = State::AwaitingLength;
                    None
                } else if byte == ESCAPE {
                    self.state = State::AwaitingEscape;
                    None
                } else {
                    self.buffer_byte(byte)
                }
            }
            State::AwaitingEscape => match byte {
                ESCAPED_ESCAPE => {
                    self.state = State::Buffering;
                    self.buffer_byte(ESCAPE)
                }
                ESCAPED_START => {
                    self.state = State::Buffering;
                    self.buffer_byte(START)
                }
                code => {
                    trace!(code, "invalid escape sequence, resynchronizing");
                    self.state = State::AwaitingStart;
                    None
                }
            },
        }
    }

    fn begin_frame(&mut self, length: u8) -> Option<Bytes> {
        let length = length as usize;
        if length > self.buf.len() {
            trace!(
                length,
                capacity = self.buf.len(),
                "oversized length claim, resynchronizing"
            );
            self.state = State::AwaitingStart;
            return None;
        }
        if length == 0 {
            // Degenerate: no room for even the checksum byte.
            trace!("zero-length frame, resynchronizing");
            self.state = State::AwaitingStart;
            return None;
        }
        self.pos = 0;
        self.frame_len = length;
        self.state = State::Buffering;
        None
    }

    fn buffer_byte(&mut self, byte: u8) -> Option<Bytes> {
        self.buf[self.pos] = byte;
        self.pos += 1;
        if self.pos < self.frame_len {
            return None;
        }

        self.state = State::AwaitingStart;
        let frame = &self.buf[..self.frame_len];
        let (body, checksum) = frame.split_at(self.frame_len - 1);
        let sum = body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != checksum[0] {
            trace!(
                expected = checksum[0],
                computed = sum,
                "checksum mismatch, frame discarded"
            );
            return None;
        }

        // The buffer is reused for the next frame; hand out a copy.
        Some(Bytes::copy_from_slice(frame))
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
