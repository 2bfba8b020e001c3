//! Delimited, checksummed message framing for serial links.
//!
//! This is the wire protocol of btserial. Every message is framed with:
//! - A start marker byte (`0xFF`) for stream synchronization
//! - A length byte counting the unescaped payload bytes plus one checksum byte
//! - The byte-stuffed payload (`0xFE`/`0xFF` are escaped, nothing else)
//! - A byte-stuffed mod-256 checksum over the unescaped payload
//!
//! Encoding is a pure function over a byte slice. Decoding is a
//! resynchronizing state machine fed one byte at a time from a live,
//! error-prone stream; malformed frames are discarded silently and the
//! decoder hunts for the next start marker.

pub mod codec;
pub mod decoder;
pub mod error;

pub use codec::{
    encode, encode_into, ESCAPE, ESCAPED_ESCAPE, ESCAPED_START, MAX_PAYLOAD, START,
};
pub use decoder::{Decoder, DEFAULT_CAPACITY};
pub use error::{FrameError, Result};
