//! Cache time-to-live policy.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a resolved placeholder value may be served from cache.
///
/// Wraps a non-negative duration in milliseconds. [`CacheTtl::NONE`] (zero)
/// means "never cache": an entry written with it is expired at the instant
/// it is written.
///
/// ```rust
/// # use mimir::CacheTtl;
/// # use std::time::Duration;
/// let ttl = CacheTtl::from_secs(10).max(CacheTtl::DEFAULT);
/// assert_eq!(ttl, CacheTtl::DEFAULT);
/// assert!(CacheTtl::NONE.is_none());
/// assert_eq!(CacheTtl::from(Duration::from_millis(250)).as_millis(), 250);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheTtl(u64);

impl CacheTtl {
    /// Never cache.
    pub const NONE: CacheTtl = CacheTtl(0);
    /// One second.
    pub const SECOND: CacheTtl = CacheTtl(1_000);
    /// Five seconds, for values that change often (positions, health).
    pub const SHORT: CacheTtl = CacheTtl(5_000);
    /// Thirty seconds. Used when a handler declares no TTL.
    pub const DEFAULT: CacheTtl = CacheTtl(30_000);
    /// One minute.
    pub const MINUTE: CacheTtl = CacheTtl(60_000);
    /// Five minutes, for slow-moving values (ranks, balances).
    pub const LONG: CacheTtl = CacheTtl(300_000);
    /// One hour.
    pub const HOUR: CacheTtl = CacheTtl(3_600_000);

    pub const fn from_millis(millis: u64) -> Self {
        CacheTtl(millis)
    }

    pub const fn from_secs(secs: u64) -> Self {
        CacheTtl(secs.saturating_mul(1_000))
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.0)
    }

    /// Whether this TTL disables caching.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The longer of two TTLs.
    pub fn max(self, other: CacheTtl) -> CacheTtl {
        Ord::max(self, other)
    }

    /// The shorter of two TTLs.
    pub fn min(self, other: CacheTtl) -> CacheTtl {
        Ord::min(self, other)
    }

    /// Scale the TTL by `factor`. Negative and NaN factors yield [`CacheTtl::NONE`].
    pub fn multiply(self, factor: f64) -> CacheTtl {
        if factor.is_nan() || factor <= 0.0 {
            return CacheTtl::NONE;
        }
        let scaled = self.0 as f64 * factor;
        if scaled >= u64::MAX as f64 {
            CacheTtl(u64::MAX)
        } else {
            CacheTtl(scaled.round() as u64)
        }
    }

    /// Whether a value written at `written_at_millis` is stale at `now_millis`.
    ///
    /// Expired when `now - written >= ttl`, so a zero TTL is expired even
    /// when no time has passed. A clock that moved backwards counts as zero
    /// elapsed time.
    pub fn is_expired(self, written_at_millis: u64, now_millis: u64) -> bool {
        now_millis.saturating_sub(written_at_millis) >= self.0
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        CacheTtl::DEFAULT
    }
}

impl From<Duration> for CacheTtl {
    fn from(duration: Duration) -> Self {
        CacheTtl(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<CacheTtl> for Duration {
    fn from(ttl: CacheTtl) -> Self {
        ttl.as_duration()
    }
}

impl fmt::Display for CacheTtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}
