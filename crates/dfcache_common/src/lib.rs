//! Shared foundational types used across the dfcache workspace.
//!
//! This crate provides content hashing (used for call fingerprints and artifact
//! checksums) and the time-to-live span type used by expiry policies.

#![warn(missing_docs)]

pub mod duration;
pub mod hash;

pub use duration::{DurationError, TtlDuration};
pub use hash::{ContentHash, ContentHasher, CONTENT_HASH_HEX_LEN};
