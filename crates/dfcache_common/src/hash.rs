//! Content hashing for cache keys and artifact integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// Number of hex characters in the display form of a [`ContentHash`].
pub const CONTENT_HASH_HEX_LEN: usize = 32;

/// A 128-bit content hash computed using XXH3.
///
/// Used both as the fingerprint of a memoized call and as the checksum of a
/// stored artifact payload. The [`Display`](fmt::Display) form is a fixed
/// 32-character lowercase hex digest, which is what appears in artifact file
/// names.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Parses the 32-character hex form produced by `Display`.
    ///
    /// Only lowercase digits are accepted so that a parsed hash always
    /// displays back to the same string.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != CONTENT_HASH_HEX_LEN || !is_lower_hex(s) {
            return None;
        }
        let mut out = [0u8; 16];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(out))
    }
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

/// Incremental XXH3-128 hasher for inputs that are produced piecewise.
///
/// Feeding the same bytes in any chunking yields the same [`ContentHash`] as
/// [`ContentHash::from_bytes`] over their concatenation.
pub struct ContentHasher {
    inner: Xxh3,
}

impl ContentHasher {
    /// Creates an empty hasher.
    pub fn new() -> Self {
        Self { inner: Xxh3::new() }
    }

    /// Appends bytes to the hashed input.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Returns the hash of everything fed so far.
    pub fn finish(&self) -> ContentHash {
        ContentHash(self.inner.digest128().to_le_bytes())
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}
