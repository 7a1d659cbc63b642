//! Error types for the memoization layer.
//!
//! Only [`BindError`] ever reaches a caller of a wrapped function: a call
//! whose arguments cannot be bound has no cache key. Naming and storage
//! errors are matched on internally and degrade to cache misses.

use std::fmt;
use std::path::PathBuf;

use dfcache_frame::CodecError;

/// Arguments could not be bound to the declared parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// More positional arguments than positional parameters.
    #[error("{function}() takes {expected} positional arguments but {given} were given")]
    TooManyPositional {
        /// Qualified function name.
        function: String,
        /// Number of parameters.
        expected: usize,
        /// Number of positional arguments supplied.
        given: usize,
    },

    /// A named argument matches no parameter.
    #[error("{function}() got an unexpected argument '{name}'")]
    UnknownArgument {
        /// Qualified function name.
        function: String,
        /// The unmatched argument name.
        name: String,
    },

    /// A parameter received a value both positionally and by name, or twice by name.
    #[error("{function}() got multiple values for argument '{name}'")]
    DuplicateArgument {
        /// Qualified function name.
        function: String,
        /// The parameter name.
        name: String,
    },

    /// A parameter without a default received no value.
    #[error("{function}() missing required argument '{name}'")]
    MissingArgument {
        /// Qualified function name.
        function: String,
        /// The parameter name.
        name: String,
    },

    /// The signature declares the same parameter name twice.
    #[error("{function}() declares parameter '{name}' more than once")]
    DuplicateParameter {
        /// Qualified function name.
        function: String,
        /// The repeated parameter name.
        name: String,
    },

    /// A receiver parameter that is not the first parameter, or more than one.
    #[error("{function}() receiver '{name}' must be the first and only receiver parameter")]
    MisplacedReceiver {
        /// Qualified function name.
        function: String,
        /// The receiver parameter name.
        name: String,
    },
}

/// An artifact file name that does not follow the naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed artifact name '{name}': {reason}")]
pub struct NamingError {
    /// The offending file name.
    pub name: String,
    /// What is wrong with it.
    pub reason: String,
}

impl NamingError {
    pub(crate) fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while reading or writing a single artifact file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The filesystem refused a read, write, rename or delete.
    #[error("artifact I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The artifact bytes could not be encoded or decoded.
    #[error("artifact serialization fault at {path}: {source}")]
    Codec {
        /// The artifact path.
        path: PathBuf,
        /// The underlying codec error.
        source: CodecError,
    },
}

/// Errors raised by wrapper construction and cache maintenance.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A cache directory operation failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An artifact file could not be removed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The wrapped function's signature is not well formed.
    #[error("invalid signature: {0}")]
    Signature(#[from] BindError),
}

/// The error returned by a memoized call.
///
/// `Compute` carries the wrapped function's own error untouched; the cache
/// layer never inspects or rewraps it.
#[derive(Debug)]
pub enum CallError<E> {
    /// The arguments could not be bound, so no cache key exists.
    Key(BindError),
    /// The wrapped computation failed.
    Compute(E),
}

impl<E> CallError<E> {
    /// Returns the computation's error, if that is what this is.
    pub fn into_compute(self) -> Option<E> {
        match self {
            CallError::Compute(e) => Some(e),
            CallError::Key(_) => None,
        }
    }
}

impl<E> From<BindError> for CallError<E> {
    fn from(e: BindError) -> Self {
        CallError::Key(e)
    }
}

impl<E: fmt::Display> fmt::Display for CallError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Key(e) => write!(f, "cannot derive cache key: {e}"),
            CallError::Compute(e) => e.fmt(f),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for CallError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Key(e) => Some(e),
            CallError::Compute(e) => e.source(),
        }
    }
}
