//! Error types for frame construction and the frame file codec.

/// Errors raised when assembling a [`DataFrame`](crate::DataFrame).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A column's length differs from the first column's length.
    #[error("column '{column}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        /// The offending column.
        column: String,
        /// Row count of the first column.
        expected: usize,
        /// Row count of the offending column.
        actual: usize,
    },

    /// Two columns share a name.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// Errors raised when encoding or decoding a frame file.
///
/// Any decode error means the bytes are not a usable artifact; callers in
/// the cache treat all variants alike as corruption.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The input is shorter than its declared header.
    #[error("frame data truncated: {len} bytes")]
    Truncated {
        /// Length of the input.
        len: usize,
    },

    /// The header could not be decoded or has the wrong magic bytes.
    #[error("invalid frame header: {reason}")]
    InvalidHeader {
        /// Description of the header problem.
        reason: String,
    },

    /// The header's format version is not the one this build writes.
    #[error("frame format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The supported format version.
        expected: u32,
        /// The version found in the header.
        actual: u32,
    },

    /// The payload does not hash to the checksum stored in the header.
    #[error("frame checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum computed from the payload.
        actual: String,
    },

    /// bincode failed to encode or decode a value.
    #[error("frame serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// The payload decoded but violates frame invariants.
    #[error("decoded frame is invalid: {0}")]
    InvalidFrame(#[from] FrameError),
}
