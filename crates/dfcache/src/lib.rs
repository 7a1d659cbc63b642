//! Disk-backed memoization for functions that return tabular datasets.
//!
//! A function is described by a [`Signature`] and wrapped in a [`Memoized`].
//! Each call is bound and fingerprinted. The newest artifact file for that
//! fingerprint is served if the expiry policy accepts it. Otherwise the
//! function runs and a frame result is written to a new artifact file.
//!
//! Artifacts live in one flat directory named
//! `<function>_<fingerprint>_<YYYYMMDD>_<HHMMSS>.dfc`; the directory listing
//! is the only index. See [`naming`] for the scheme and [`fingerprint`] for
//! how arguments are canonicalized.

#![warn(missing_docs)]

pub mod error;
pub mod fingerprint;
pub mod memo;
pub mod naming;
pub mod policy;
pub mod signature;
pub mod store;
pub mod value;

pub use dfcache_common::{ContentHash, DurationError, TtlDuration};
pub use dfcache_config::CacheConfig;
pub use dfcache_frame::{Column, ColumnData, DType, DataFrame};
pub use error::{BindError, CacheError, CallError, NamingError, StoreError};
pub use memo::{CallStatus, MemoOptions, Memoized, Output};
pub use naming::{ArtifactKey, ArtifactRecord};
pub use policy::{is_valid, ExpiryPolicy};
pub use signature::{BoundArg, BoundArgs, CallArgs, FunctionId, ParamKind, Signature};
pub use store::ArtifactStore;
pub use value::Value;
