//! Telemetry metric name constants.
//!
//! Centralised metric names for placeholder resolution. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `mimir_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `source`: where a token's value came from: "custom", "cache",
//!   "registry" or "empty"
//! - `expansion`: expansion name of the failing handler

/// Total single-token resolutions.
///
/// Labels: `source` ("custom" | "cache" | "registry" | "empty").
pub const RESOLUTIONS_TOTAL: &str = "mimir_resolutions_total";

/// Total placeholder cache hits.
pub const CACHE_HITS_TOTAL: &str = "mimir_cache_hits_total";

/// Total placeholder cache misses.
pub const CACHE_MISSES_TOTAL: &str = "mimir_cache_misses_total";

/// Total handler or custom resolver failures (errors and panics).
///
/// Labels: `expansion`.
pub const HANDLER_FAILURES_TOTAL: &str = "mimir_handler_failures_total";
