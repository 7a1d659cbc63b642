//! Configuration types deserialized from `dfcache.toml`.

use std::path::PathBuf;

use serde::Deserialize;

/// Cache directory used when no configuration names one.
pub const DEFAULT_CACHE_DIR: &str = ".dfcache";

/// The top-level configuration parsed from `dfcache.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Process-wide cache settings.
    #[serde(default)]
    pub cache: CacheSection,
}

/// The `[cache]` table.
///
/// Every field has a default, so an empty file (or no file) yields a usable
/// configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Directory that holds artifact files for every wrapped function.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Whether wrappers look up and store artifacts unless told otherwise.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Default expiry for artifacts, e.g. `"1d"`. `None` means never.
    #[serde(default)]
    pub invalid_after: Option<String>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            enabled: default_enabled(),
            invalid_after: None,
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

fn default_enabled() -> bool {
    true
}

impl CacheConfig {
    /// Returns the default cache directory wrappers fall back to.
    pub fn default_cache_dir(&self) -> &std::path::Path {
        &self.cache.dir
    }
}
