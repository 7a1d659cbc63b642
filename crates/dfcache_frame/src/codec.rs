//! Self-validating binary file format for frames.
//!
//! A frame file is a 4-byte little-endian header length, a bincode-encoded
//! [`FrameHeader`], and a bincode-encoded [`DataFrame`] payload. The header
//! carries magic bytes, the format version and a checksum of the payload, so
//! truncated, foreign or bit-rotted files are rejected before the payload is
//! decoded.

use dfcache_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::frame::DataFrame;

/// Magic bytes identifying a frame file.
const FRAME_MAGIC: [u8; 4] = *b"DFCF";

/// Current frame format version. Increment on breaking changes to the header
/// or payload layout.
pub const FRAME_FORMAT_VERSION: u32 = 1;

/// Header prepended to every encoded frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FrameHeader {
    /// Magic bytes: must be `b"DFCF"`.
    magic: [u8; 4],

    /// Frame format version.
    format_version: u32,

    /// Content hash of the payload bytes.
    checksum: ContentHash,
}

/// Encodes a frame into the on-disk byte layout.
pub fn encode(frame: &DataFrame) -> Result<Vec<u8>, CodecError> {
    let payload = bincode::serde::encode_to_vec(frame, bincode::config::standard())
        .map_err(|e| CodecError::Serialization {
            reason: e.to_string(),
        })?;

    let header = FrameHeader {
        magic: FRAME_MAGIC,
        format_version: FRAME_FORMAT_VERSION,
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| CodecError::Serialization {
            reason: e.to_string(),
        })?;

    let header_len = header_bytes.len() as u32;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes bytes produced by [`encode`], validating the header first.
pub fn decode(raw: &[u8]) -> Result<DataFrame, CodecError> {
    let truncated = || CodecError::Truncated { len: raw.len() };

    let len_bytes: [u8; 4] = raw
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(truncated)?;
    let header_len = u32::from_le_bytes(len_bytes) as usize;
    let header_end = 4usize.checked_add(header_len).ok_or_else(truncated)?;
    let header_bytes = raw.get(4..header_end).ok_or_else(truncated)?;

    let (header, _): (FrameHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard()).map_err(
            |e| CodecError::InvalidHeader {
                reason: e.to_string(),
            },
        )?;

    if header.magic != FRAME_MAGIC {
        return Err(CodecError::InvalidHeader {
            reason: "missing magic bytes".to_string(),
        });
    }
    if header.format_version != FRAME_FORMAT_VERSION {
        return Err(CodecError::VersionMismatch {
            expected: FRAME_FORMAT_VERSION,
            actual: header.format_version,
        });
    }

    let payload = &raw[header_end..];
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(CodecError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (frame, _): (DataFrame, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard()).map_err(|e| {
            CodecError::Serialization {
                reason: e.to_string(),
            }
        })?;
    frame.validated().map_err(CodecError::from)
}
