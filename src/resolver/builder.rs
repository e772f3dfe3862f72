//! Builder for configuring resolver instances

use std::sync::Arc;

use super::{PlaceholderResolver, ResolverInner};
use super::custom::CustomResolvers;
use crate::cache::PlaceholderCache;
use crate::parser::{DelimitedParser, PlaceholderParser};
use crate::registry::PlaceholderRegistry;

/// Builder for [`PlaceholderResolver`].
///
/// Everything is optional: without a registry only custom resolvers
/// produce values, and without a cache every token is recomputed.
pub struct PlaceholderResolverBuilder {
    registry: Option<Arc<dyn PlaceholderRegistry>>,
    cache: Option<Arc<dyn PlaceholderCache>>,
    parser: Option<Arc<dyn PlaceholderParser>>,
    fallback: Option<String>,
    preserve_unknown: bool,
}

impl PlaceholderResolverBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            cache: None,
            parser: None,
            fallback: None,
            preserve_unknown: false,
        }
    }

    /// Use `registry` as the source of placeholder values.
    pub fn registry(self, registry: impl PlaceholderRegistry + 'static) -> Self {
        self.shared_registry(Arc::new(registry))
    }

    /// Use a registry that is shared with other owners.
    pub fn shared_registry(mut self, registry: Arc<dyn PlaceholderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Cache resolved values in `cache`.
    pub fn cache(self, cache: impl PlaceholderCache + 'static) -> Self {
        self.shared_cache(Arc::new(cache))
    }

    /// Cache resolved values in a cache shared with other owners (e.g. so
    /// the host can invalidate entries when a subject disconnects).
    pub fn shared_cache(mut self, cache: Arc<dyn PlaceholderCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replace the default `%expansion_identifier%` parser.
    pub fn parser(mut self, parser: impl PlaceholderParser + 'static) -> Self {
        self.parser = Some(Arc::new(parser));
        self
    }

    /// Text substituted for unresolvable tokens (default: empty string).
    pub fn fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Leave unresolvable tokens in the output verbatim instead of
    /// substituting the fallback.
    pub fn preserve_unknown(mut self, preserve: bool) -> Self {
        self.preserve_unknown = preserve;
        self
    }

    pub fn build(self) -> PlaceholderResolver {
        PlaceholderResolver {
            inner: Arc::new(ResolverInner {
                registry: self.registry,
                cache: self.cache,
                parser: self
                    .parser
                    .unwrap_or_else(|| Arc::new(DelimitedParser::default())),
                fallback: self.fallback,
                preserve_unknown: self.preserve_unknown,
                custom: CustomResolvers::default(),
            }),
        }
    }
}

impl Default for PlaceholderResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}
