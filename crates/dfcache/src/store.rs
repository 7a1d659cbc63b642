//! Reading and writing artifact files.
//!
//! Every operation has a `try_` form that reports exactly what went wrong
//! and a fail-safe form used by the wrapper. The fail-safe forms turn every
//! storage fault into "no cached value": a corrupt artifact is deleted and
//! reported as a miss, and a failed write leaves nothing behind.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dfcache_frame::{codec, DataFrame};
use tempfile::NamedTempFile;

use crate::error::{CacheError, StoreError};

/// Artifact file storage rooted at one cache directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Opens a store, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Returns the cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Reads and decodes the artifact at `path`.
    pub fn try_load(&self, path: &Path) -> Result<DataFrame, StoreError> {
        let raw = std::fs::read(path).map_err(|e| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        codec::decode(&raw).map_err(|e| StoreError::Codec {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads the artifact at `path`, or returns `None` on any fault.
    ///
    /// An artifact that cannot be decoded is deleted so the next write for
    /// its key starts clean.
    pub fn load(&self, path: &Path) -> Option<DataFrame> {
        match self.try_load(path) {
            Ok(frame) => Some(frame),
            Err(StoreError::Codec { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "discarding corrupt artifact");
                if let Err(e) = self.remove(&path) {
                    tracing::warn!(error = %e, "failed to delete corrupt artifact");
                }
                None
            }
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "artifact vanished before it was read");
                None
            }
            Err(e @ StoreError::Io { .. }) => {
                tracing::warn!(error = %e, "failed to read artifact");
                None
            }
        }
    }

    /// Encodes `frame` and writes it to `path`.
    ///
    /// The bytes go to a temporary file in the same directory that is then
    /// moved into place, so `path` either holds a complete artifact or does
    /// not exist. An existing file at `path` is never replaced; that case
    /// surfaces as an `AlreadyExists` I/O error.
    pub fn try_save(&self, frame: &DataFrame, path: &Path) -> Result<(), StoreError> {
        let io_err = |e: io::Error| StoreError::Io {
            path: path.to_path_buf(),
            source: e,
        };

        let bytes = codec::encode(frame).map_err(|e| StoreError::Codec {
            path: path.to_path_buf(),
            source: e,
        })?;

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent).map_err(io_err)?;

        if let Err(e) = tmp.write_all(&bytes).and_then(|()| tmp.as_file().sync_all()) {
            discard_temp(tmp);
            return Err(io_err(e));
        }

        match tmp.persist_noclobber(path) {
            Ok(_) => Ok(()),
            Err(e) => {
                discard_temp(e.file);
                Err(io_err(e.error))
            }
        }
    }

    /// Writes `frame` to `path`. Returns `false` if nothing was written.
    pub fn save(&self, frame: &DataFrame, path: &Path) -> bool {
        match self.try_save(frame, path) {
            Ok(()) => true,
            Err(StoreError::Io { source, .. }) if source.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(path = %path.display(), "artifact with this name already exists; keeping it");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to cache result; continuing without caching");
                false
            }
        }
    }

    /// Deletes the file at `path`. Returns `false` if it was already gone.
    pub fn remove(&self, path: &Path) -> Result<bool, StoreError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }
}

/// Removes a temporary file that will not be persisted.
fn discard_temp(tmp: NamedTempFile) {
    let tmp_path = tmp.path().to_path_buf();
    match tmp.close() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %tmp_path.display(), error = %e, "failed to remove temporary file"),
    }
}
