use crate::DecodeMode;

/// Structural problems with an unstuffed frame. A frame that fails here is discarded and
/// the reader waits for the next one.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFrame {
    #[error("frame of {0} bytes is shorter than the 5 byte minimum")]
    TooShort(usize),

    #[error("frame declares {declared} payload bytes but carries {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("checksum mismatch: frame has {received:#04x}, computed {computed:#04x}")]
    ChecksumMismatch { received: u8, computed: u8 },
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Malformed(#[from] MalformedFrame),

    #[error("{mode:?} payload must be {expected} bytes, got {actual}")]
    PayloadLength {
        mode:     DecodeMode,
        expected: usize,
        actual:   usize,
    },

    #[error("non-ascii byte {byte:#04x} at offset {offset} in serial number")]
    Encoding { offset: usize, byte: u8 },

    #[error(transparent)]
    Packing(#[from] packed_struct::PackingError),
}
