//! Artifact file names: encoding, parsing, and prefix lookup.
//!
//! An artifact lives at `<dir>/<function>_<fingerprint>_<YYYYMMDD>_<HHMMSS>.dfc`.
//! The timestamp is UTC and fixed width, so sorting file names of one key
//! sorts them by creation time. The directory listing is the only index.
//!
//! `<function>` is [`FunctionId::artifact_name`](crate::FunctionId::artifact_name):
//! the sanitized module and qualname plus a short hash of both, so two
//! functions whose names sanitize to the same text still get distinct
//! prefixes.
//!
//! Timestamps have one-second resolution: two artifacts for the same key
//! written within the same second get the same name. The store never
//! replaces an existing file, so the first of the two is kept. Expiry checks
//! compare at the same resolution (see [`crate::policy::is_valid`]).

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use dfcache_common::ContentHash;

use crate::error::NamingError;

/// File extension of artifact files.
pub const ARTIFACT_EXT: &str = "dfc";

/// `strftime` format of the creation timestamp embedded in file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// A logical cache entry: one function called with one set of arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    function: String,
    fingerprint: String,
}

impl ArtifactKey {
    /// Creates a key from a function's artifact name and a call fingerprint.
    pub fn new(function: impl Into<String>, fingerprint: &ContentHash) -> Self {
        Self {
            function: function.into(),
            fingerprint: fingerprint.to_string(),
        }
    }

    /// Returns the function's artifact name.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns the fingerprint as a hex string.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns `<function>_<fingerprint>`, the stem prefix shared by every
    /// artifact of this key.
    pub fn lookup_prefix(&self) -> String {
        format!("{}_{}", self.function, self.fingerprint)
    }

    /// Mints the location for a new artifact of this key created at `now`.
    pub fn locate(&self, dir: &Path, now: DateTime<Utc>) -> ArtifactLocation {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let lookup_prefix = self.lookup_prefix();
        let path = dir.join(format!("{lookup_prefix}_{timestamp}.{ARTIFACT_EXT}"));
        ArtifactLocation {
            path,
            timestamp,
            lookup_prefix,
        }
    }
}

/// Where a new artifact should be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    /// Full path of the artifact file.
    pub path: PathBuf,
    /// The formatted creation timestamp embedded in the file name.
    pub timestamp: String,
    /// Stem prefix used to find this key's artifacts.
    pub lookup_prefix: String,
}

/// One artifact file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRecord {
    /// The key this artifact belongs to.
    pub key: ArtifactKey,
    /// Creation time, read back from the file name.
    pub created_at: DateTime<Utc>,
    /// Full path of the file.
    pub path: PathBuf,
}

impl ArtifactRecord {
    /// Parses an artifact path back into its key and creation time.
    pub fn from_path(path: &Path) -> Result<Self, NamingError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| NamingError::new(path.display().to_string(), "not valid UTF-8"))?;

        let stem = file_name
            .strip_suffix(ARTIFACT_EXT)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(|| {
                NamingError::new(file_name, format!("missing .{ARTIFACT_EXT} extension"))
            })?;

        // <function>_<fingerprint>_<date>_<time>; the function may contain '_'.
        let mut parts = stem.rsplitn(4, '_');
        let (Some(time), Some(date), Some(fingerprint), Some(function)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(NamingError::new(file_name, "too few '_'-separated segments"));
        };
        if function.is_empty() {
            return Err(NamingError::new(file_name, "empty function name"));
        }
        let hash = ContentHash::from_hex(fingerprint)
            .ok_or_else(|| NamingError::new(file_name, "fingerprint is not a hex digest"))?;
        let created_at = parse_timestamp_parts(file_name, date, time)?;

        Ok(Self {
            key: ArtifactKey::new(function, &hash),
            created_at,
            path: path.to_path_buf(),
        })
    }
}

/// Reads the creation time from the last two `_`-separated stem segments.
pub fn parse_timestamp(path: &Path) -> Result<DateTime<Utc>, NamingError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| NamingError::new(path.display().to_string(), "missing file stem"))?;
    let mut parts = stem.rsplitn(3, '_');
    match (parts.next(), parts.next()) {
        (Some(time), Some(date)) => parse_timestamp_parts(stem, date, time),
        _ => Err(NamingError::new(stem, "no timestamp segments")),
    }
}

fn parse_timestamp_parts(name: &str, date: &str, time: &str) -> Result<DateTime<Utc>, NamingError> {
    NaiveDateTime::parse_from_str(&format!("{date}_{time}"), TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| NamingError::new(name, format!("bad timestamp: {e}")))
}

/// Finds the newest artifact in `dir` whose stem starts with `prefix`.
///
/// Files that match the prefix but not the naming scheme are skipped. A
/// missing directory has no artifacts.
pub fn find_latest(dir: &Path, prefix: &str) -> io::Result<Option<ArtifactRecord>> {
    let candidates = scan(dir, |stem| stem.starts_with(prefix))?;
    Ok(candidates.into_iter().max_by(|a, b| a.path.cmp(&b.path)))
}

/// Lists every artifact in `dir` that belongs to `function`, oldest first.
///
/// Matches on the parsed function name, so clearing `mod_f` never touches
/// artifacts of `mod_f2` or `mod_f_inner`.
pub fn list_function(dir: &Path, function: &str) -> io::Result<Vec<ArtifactRecord>> {
    let mut records = scan(dir, |stem| stem.starts_with(function))?;
    records.retain(|r| r.key.function() == function);
    records.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(records)
}

fn scan(dir: &Path, keep_stem: impl Fn(&str) -> bool) -> io::Result<Vec<ArtifactRecord>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut records = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ARTIFACT_EXT) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !keep_stem(stem) {
            continue;
        }
        match ArtifactRecord::from_path(&path) {
            Ok(record) => records.push(record),
            Err(e) => tracing::debug!(error = %e, "skipping file that is not an artifact"),
        }
    }
    Ok(records)
}
