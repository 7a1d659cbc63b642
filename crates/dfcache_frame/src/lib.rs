//! Tabular datasets and their on-disk format.
//!
//! [`DataFrame`] is the result type the memoization layer knows how to
//! persist. The [`codec`] module turns a frame into a checksummed binary blob
//! and back.

#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod frame;

pub use codec::{decode, encode, FRAME_FORMAT_VERSION};
pub use error::{CodecError, FrameError};
pub use frame::{Column, ColumnData, DType, DataFrame};
