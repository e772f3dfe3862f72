//! Placeholder value caching.
//!
//! Resolved values are cached under one of three key shapes, chosen from
//! the token and the context it was resolved against:
//!
//! - [`CacheKey::Relational`] `(viewer, target, full_key)` for a relational
//!   token in a relational context
//! - [`CacheKey::Subject`] `(subject, full_key)` for any other token with a
//!   known primary subject
//! - [`CacheKey::Global`] `full_key` when there is no subject
//!
//! The shapes are enum variants, so the three keyspaces cannot collide.
//!
//! # Backends
//!
//! The resolver talks to the [`PlaceholderCache`] trait. The bundled
//! [`MemoryPlaceholderCache`] is an in-process moka cache; shared backends
//! (e.g. redis-backed, for several render nodes) implement the same trait
//! and are injected through the resolver builder.

mod clock;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::{MemoryCacheConfig, MemoryPlaceholderCache};

use crate::types::{CacheTtl, ParsedPlaceholder, PlaceholderContext, SubjectId};

/// Key of one cached placeholder value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Global(String),
    Subject(SubjectId, String),
    Relational(SubjectId, SubjectId, String),
}

impl CacheKey {
    /// The key a resolved `token` is cached under for `context`.
    ///
    /// The two-subject shape is only chosen when both the token and the
    /// context are relational, so a relational key always has both subjects.
    pub fn for_token(token: &ParsedPlaceholder, context: &PlaceholderContext) -> CacheKey {
        let key = token.full_key().to_owned();
        if token.is_relational()
            && let Some((viewer, target)) = context.relation()
        {
            return CacheKey::Relational(viewer, target, key);
        }
        match context.primary_subject() {
            Some(subject) => CacheKey::Subject(subject, key),
            None => CacheKey::Global(key),
        }
    }

    /// The placeholder's full key, regardless of shape.
    pub fn full_key(&self) -> &str {
        match self {
            CacheKey::Global(k) | CacheKey::Subject(_, k) | CacheKey::Relational(_, _, k) => k,
        }
    }

    /// Whether the key belongs to `subject` (as primary, viewer or target).
    pub fn mentions(&self, subject: SubjectId) -> bool {
        match self {
            CacheKey::Global(_) => false,
            CacheKey::Subject(s, _) => *s == subject,
            CacheKey::Relational(a, b, _) => *a == subject || *b == subject,
        }
    }
}

/// Store of resolved placeholder values with per-entry TTL.
///
/// Implementations are shared across concurrent resolutions and must be
/// safe for concurrent `get`/`put` on the same and different keys.
/// Last write wins. `get` never returns a value whose TTL has elapsed, and
/// an entry written with [`CacheTtl::NONE`] is never returned.
pub trait PlaceholderCache: Send + Sync {
    /// Look up a live value.
    fn get(&self, key: &CacheKey) -> Option<String>;

    /// Store (or overwrite) a value for `ttl`.
    fn put(&self, key: CacheKey, value: String, ttl: CacheTtl);

    /// Drop one entry eagerly.
    fn invalidate(&self, key: &CacheKey);

    fn get_global(&self, full_key: &str) -> Option<String> {
        self.get(&CacheKey::Global(full_key.to_owned()))
    }

    fn get_subject(&self, subject: SubjectId, full_key: &str) -> Option<String> {
        self.get(&CacheKey::Subject(subject, full_key.to_owned()))
    }

    fn get_relational(&self, viewer: SubjectId, target: SubjectId, full_key: &str) -> Option<String> {
        self.get(&CacheKey::Relational(viewer, target, full_key.to_owned()))
    }

    fn put_global(&self, full_key: &str, value: String, ttl: CacheTtl) {
        self.put(CacheKey::Global(full_key.to_owned()), value, ttl);
    }

    fn put_subject(&self, subject: SubjectId, full_key: &str, value: String, ttl: CacheTtl) {
        self.put(CacheKey::Subject(subject, full_key.to_owned()), value, ttl);
    }

    fn put_relational(
        &self,
        viewer: SubjectId,
        target: SubjectId,
        full_key: &str,
        value: String,
        ttl: CacheTtl,
    ) {
        self.put(
            CacheKey::Relational(viewer, target, full_key.to_owned()),
            value,
            ttl,
        );
    }
}
