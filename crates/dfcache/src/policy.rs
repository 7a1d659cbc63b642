//! Time-based artifact invalidation.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use dfcache_common::TtlDuration;

/// Returns `true` if an artifact created at `created_at` is still usable at `now`.
///
/// `None` never expires. Otherwise the artifact is valid up to and
/// including `created_at + ttl`. A TTL too large to add to the creation time
/// is treated as never expiring.
///
/// Creation times come from file names and have whole-second resolution, so
/// `now` is truncated to the second before comparing. An artifact therefore
/// never expires early; it may be served up to one second late.
pub fn is_valid(created_at: DateTime<Utc>, ttl: Option<TtlDuration>, now: DateTime<Utc>) -> bool {
    let Some(ttl) = ttl else {
        return true;
    };
    let now = now.trunc_subsecs(0);
    match TimeDelta::from_std(ttl.as_std())
        .ok()
        .and_then(|delta| created_at.checked_add_signed(delta))
    {
        Some(expires_at) => now <= expires_at,
        None => true,
    }
}

/// A wrapper's expiry setting, resolved once at wrap time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Artifacts never expire.
    Never,
    /// Artifacts expire this long after creation.
    After(TtlDuration),
    /// The configured string did not parse. Every artifact is treated as
    /// expired so that stale data is never served by accident.
    Unparseable {
        /// The configured string.
        input: String,
        /// Why it did not parse.
        reason: String,
    },
}

impl ExpiryPolicy {
    /// Resolves an `invalid_after` option string.
    pub fn from_setting(invalid_after: Option<&str>) -> Self {
        match invalid_after {
            None => ExpiryPolicy::Never,
            Some(s) => match s.parse::<TtlDuration>() {
                Ok(ttl) => ExpiryPolicy::After(ttl),
                Err(e) => ExpiryPolicy::Unparseable {
                    input: s.to_string(),
                    reason: e.to_string(),
                },
            },
        }
    }

    /// Returns `true` if an artifact created at `created_at` may be served at `now`.
    pub fn accepts(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            ExpiryPolicy::Never => is_valid(created_at, None, now),
            ExpiryPolicy::After(ttl) => is_valid(created_at, Some(*ttl), now),
            ExpiryPolicy::Unparseable { input, reason } => {
                tracing::warn!(invalid_after = %input, "{reason}; treating cache as invalid");
                false
            }
        }
    }
}
