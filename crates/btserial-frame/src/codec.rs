use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Frame start marker.
pub const START: u8 = 0xFF;

/// Escape marker. Inside a frame, `ESCAPE` followed by an escape code
/// stands for one reserved byte value.
pub const ESCAPE: u8 = 0xFE;

/// Escape code for a literal `0xFE`.
pub const ESCAPED_ESCAPE: u8 = 0x01;

/// Escape code for a literal `0xFF`.
pub const ESCAPED_START: u8 = 0x02;

/// Maximum payload size. The length byte counts the payload plus one
/// checksum byte and must fit in a `u8`.
pub const MAX_PAYLOAD: usize = 254;

/// Encode a payload into a fresh wire-format frame.
///
/// Wire format:
/// ```text
/// ┌────────────┬────────────────┬──────────────────┬──────────────────┐
/// │ Start (1B) │ Length (1B)    │ Payload          │ Checksum (1B)    │
/// │ 0xFF       │ payload + 1    │ (byte-stuffed)   │ (byte-stuffed)   │
/// └────────────┴────────────────┴──────────────────┴──────────────────┘
/// ```
///
/// The length byte counts *unescaped* bytes, independent of how many
/// escape sequences appear on the wire. Only `0xFE` and `0xFF` are ever
/// escaped; every other byte value passes through unmodified. The
/// checksum is the wrapping u8 sum of the original payload bytes.
///
/// Payloads longer than [`MAX_PAYLOAD`] are rejected with
/// [`FrameError::PayloadTooLarge`] before anything is written.
pub fn encode(payload: &[u8]) -> Result<BytesMut> {
    let mut dst = BytesMut::with_capacity(payload.len() + 4);
    encode_into(payload, &mut dst)?;
    Ok(dst)
}

/// Encode a payload, appending the frame to `dst`.
pub fn encode_into(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    dst.reserve(payload.len() + 4);
    dst.put_u8(START);
    dst.put_u8((payload.len() + 1) as u8);

    let mut check: u8 = 0;
    for &byte in payload {
        check = check.wrapping_add(byte);
        put_escaped(byte, dst);
    }
    put_escaped(check, dst);
    Ok(())
}

fn put_escaped(byte: u8, dst: &mut BytesMut) {
    if byte < ESCAPE {
        dst.put_u8(byte);
    } else {
        dst.put_u8(ESCAPE);
        dst.put_u8(if byte == ESCAPE {
            ESCAPED_ESCAPE
        } else {
            ESCAPED_START
        });
    }
}
