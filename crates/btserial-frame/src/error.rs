/// Errors that can occur during frame encoding.
///
/// Decoding never returns an error: malformed input (oversized length
/// claim, checksum mismatch, invalid escape sequence) is discarded and the
/// decoder resynchronizes on the next start marker.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload plus its checksum byte does not fit the single-byte
    /// length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
