//! The memoizing wrapper.
//!
//! [`Memoized`] wraps a function that produces a [`DataFrame`] and serves
//! repeated calls with equal arguments from artifact files on disk. A call
//! runs through these steps:
//!
//! 1. bind the arguments to the signature and fingerprint them,
//! 2. find the newest artifact for that fingerprint,
//! 3. check it against the expiry policy and load it,
//! 4. on a miss, run the computation and save a frame result under a fresh name.
//!
//! Only step 1 can fail the call on the cache's behalf. Every lookup, load
//! and save fault degrades to a miss.

use std::path::{Path, PathBuf};

use chrono::Utc;
use dfcache_common::ContentHash;
use dfcache_config::CacheConfig;
use dfcache_frame::DataFrame;

use crate::error::{BindError, CacheError, CallError};
use crate::fingerprint::fingerprint;
use crate::naming::{self, ArtifactKey, ArtifactRecord};
use crate::policy::ExpiryPolicy;
use crate::signature::{BoundArgs, CallArgs, Signature};
use crate::store::ArtifactStore;
use crate::value::Value;

/// What a wrapped computation returns.
///
/// Only frames are cached. Any other result is passed through and the
/// computation runs again on the next call.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A tabular dataset; cacheable.
    Frame(DataFrame),
    /// Any other value; never cached.
    Value(Value),
}

impl Output {
    /// Returns `true` if this is a frame.
    pub fn is_frame(&self) -> bool {
        matches!(self, Output::Frame(_))
    }

    /// Returns the frame, if this is one.
    pub fn as_frame(&self) -> Option<&DataFrame> {
        match self {
            Output::Frame(df) => Some(df),
            Output::Value(_) => None,
        }
    }

    /// Consumes the output and returns the frame, if this is one.
    pub fn into_frame(self) -> Option<DataFrame> {
        match self {
            Output::Frame(df) => Some(df),
            Output::Value(_) => None,
        }
    }

    /// Returns the value, if this is not a frame.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Output::Value(v) => Some(v),
            Output::Frame(_) => None,
        }
    }
}

impl From<DataFrame> for Output {
    fn from(df: DataFrame) -> Self {
        Output::Frame(df)
    }
}

impl From<Value> for Output {
    fn from(v: Value) -> Self {
        Output::Value(v)
    }
}

/// How a call was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    /// Loaded from a valid artifact.
    Hit,
    /// Computed; a frame result was offered to the store.
    Miss,
    /// Computed with caching disabled; nothing was read or written.
    Bypassed,
}

/// Per-wrapper options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoOptions {
    /// Directory holding this wrapper's artifacts.
    pub cache_dir: PathBuf,
    /// When `false`, every call computes and no artifact is read or written.
    pub caching_enabled: bool,
    /// Expiry such as `"1d"`; `None` never expires.
    pub invalid_after: Option<String>,
}

impl MemoOptions {
    /// Options with the given directory, caching on and no expiry.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            caching_enabled: true,
            invalid_after: None,
        }
    }

    /// Options taking every default from the process configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            cache_dir: config.default_cache_dir().to_path_buf(),
            caching_enabled: config.cache.enabled,
            invalid_after: config.cache.invalid_after.clone(),
        }
    }

    /// Overrides the cache directory.
    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Turns caching on or off.
    pub fn caching_enabled(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Sets the expiry string.
    pub fn invalid_after(mut self, expiry: impl Into<String>) -> Self {
        self.invalid_after = Some(expiry.into());
        self
    }

    /// Removes any expiry.
    pub fn never_expire(mut self) -> Self {
        self.invalid_after = None;
        self
    }
}

impl Default for MemoOptions {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

/// A function wrapped with a disk-backed cache.
///
/// The wrapped function receives the bound arguments, defaults applied,
/// receiver included.
///
/// ```no_run
/// use dfcache::{BoundArgs, CallArgs, Column, DataFrame, FunctionId, MemoOptions, Memoized, Output, Signature};
///
/// let sig = Signature::new(FunctionId::new("reports", "daily")).param("day");
/// let daily = Memoized::new(
///     sig,
///     MemoOptions::new(".dfcache").invalid_after("1d"),
///     |args: &BoundArgs| -> Result<Output, std::io::Error> {
///         let day = args.get("day").and_then(|v| v.as_str()).unwrap_or_default();
///         let df = DataFrame::new(vec![Column::utf8("day", [day])]).expect("one column");
///         Ok(Output::Frame(df))
///     },
/// )?;
/// let out = daily.call(CallArgs::new().arg("2026-01-01")).expect("computes");
/// assert!(out.is_frame());
/// # Ok::<(), dfcache::CacheError>(())
/// ```
pub struct Memoized<F> {
    signature: Signature,
    options: MemoOptions,
    policy: ExpiryPolicy,
    store: ArtifactStore,
    func: F,
}

impl<F> Memoized<F> {
    /// Wraps `func`.
    ///
    /// Fails if the signature is malformed or the cache directory cannot be
    /// created.
    pub fn new(signature: Signature, options: MemoOptions, func: F) -> Result<Self, CacheError> {
        signature.validate()?;
        let store = ArtifactStore::open(&options.cache_dir)?;
        let policy = ExpiryPolicy::from_setting(options.invalid_after.as_deref());
        Ok(Self {
            signature,
            options,
            policy,
            store,
            func,
        })
    }

    /// Returns the signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the options the wrapper was built with.
    pub fn options(&self) -> &MemoOptions {
        &self.options
    }

    /// Returns the cache directory.
    pub fn cache_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Computes the fingerprint `args` would be cached under.
    pub fn fingerprint(&self, args: CallArgs) -> Result<ContentHash, BindError> {
        let bound = self.signature.bind(args)?;
        Ok(fingerprint(self.signature.function(), &bound))
    }

    /// Lists this function's artifacts, oldest first.
    pub fn artifacts(&self) -> Result<Vec<ArtifactRecord>, CacheError> {
        naming::list_function(self.store.dir(), &self.artifact_name()).map_err(|e| {
            CacheError::Io {
                path: self.store.dir().to_path_buf(),
                source: e,
            }
        })
    }

    /// Deletes every artifact of this function, whatever its fingerprint or
    /// age. Returns how many files were removed.
    pub fn clear_cache(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for record in self.artifacts()? {
            if self.store.remove(&record.path)? {
                removed += 1;
            }
        }
        tracing::debug!(function = %self.signature.function(), removed, "cleared cache");
        Ok(removed)
    }

    fn artifact_name(&self) -> String {
        self.signature.function().artifact_name()
    }

    /// Finds, checks and loads the newest artifact for `key`.
    fn lookup(&self, key: &ArtifactKey) -> Option<DataFrame> {
        let record = match naming::find_latest(self.store.dir(), &key.lookup_prefix()) {
            Ok(Some(record)) => record,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(dir = %self.store.dir().display(), error = %e, "failed to scan cache directory");
                return None;
            }
        };
        if !self.policy.accepts(record.created_at, Utc::now()) {
            tracing::debug!(path = %record.path.display(), "artifact expired");
            return None;
        }
        self.store.load(&record.path)
    }
}

impl<F, E> Memoized<F>
where
    F: Fn(&BoundArgs) -> Result<Output, E>,
{
    /// Calls the wrapped function through the cache.
    pub fn call(&self, args: CallArgs) -> Result<Output, CallError<E>> {
        self.call_with_status(args).map(|(output, _)| output)
    }

    /// Like [`call`](Self::call), also reporting how the call was served.
    pub fn call_with_status(&self, args: CallArgs) -> Result<(Output, CallStatus), CallError<E>> {
        let bound = self.signature.bind(args)?;
        let function = self.signature.function();

        if !self.options.caching_enabled {
            let output = (self.func)(&bound).map_err(CallError::Compute)?;
            return Ok((output, CallStatus::Bypassed));
        }

        let key = ArtifactKey::new(self.artifact_name(), &fingerprint(function, &bound));

        if let Some(frame) = self.lookup(&key) {
            tracing::debug!(%function, fingerprint = key.fingerprint(), "cache hit");
            return Ok((Output::Frame(frame), CallStatus::Hit));
        }
        tracing::debug!(%function, fingerprint = key.fingerprint(), "cache miss");

        let output = (self.func)(&bound).map_err(CallError::Compute)?;

        match &output {
            Output::Frame(frame) => {
                let location = key.locate(self.store.dir(), Utc::now());
                if self.store.save(frame, &location.path) {
                    tracing::debug!(path = %location.path.display(), "stored artifact");
                }
            }
            Output::Value(_) => {
                tracing::debug!(%function, "result is not a frame; not cached");
            }
        }
        Ok((output, CallStatus::Miss))
    }
}
