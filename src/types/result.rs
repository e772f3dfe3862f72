//! Single-token resolution outcome.

/// Outcome of resolving one placeholder.
///
/// `Cached` behaves exactly like `Value`; it only records that the value
/// was served from the placeholder cache, for tracing and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderResult {
    /// Freshly computed by a custom resolver or registry handler.
    Value(String),
    /// Served from the placeholder cache.
    Cached(String),
    /// Unknown placeholder, declined or failed handler, or gated out.
    Empty,
}

impl PlaceholderResult {
    pub fn value(&self) -> Option<&str> {
        match self {
            PlaceholderResult::Value(v) | PlaceholderResult::Cached(v) => Some(v),
            PlaceholderResult::Empty => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            PlaceholderResult::Value(v) | PlaceholderResult::Cached(v) => Some(v),
            PlaceholderResult::Empty => None,
        }
    }

    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PlaceholderResult::Empty)
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, PlaceholderResult::Cached(_))
    }
}

impl From<Option<String>> for PlaceholderResult {
    fn from(value: Option<String>) -> Self {
        value.map_or(PlaceholderResult::Empty, PlaceholderResult::Value)
    }
}
