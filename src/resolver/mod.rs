//! Placeholder resolution.
//!
//! # Pipeline
//!
//! ```text
//! text ──► parser.contains_placeholders ──no──► text (borrowed, untouched)
//!                 │ yes
//!                 ▼
//!          parser.find_all ──► tokens
//!                 │
//!                 ▼  one resolution per distinct full key
//!   ┌─────────────────────────────────────────────┐
//!   │ relational token, plain context? ──► empty  │
//!   │ custom resolver for expansion?  ──value──►  │ (never cached)
//!   │ plain token, relational handler? ──► empty  │
//!   │ cache.get(key)                  ──hit───►   │ Cached
//!   │ registry.resolve ──value──► cache.put(ttl)  │ Value
//!   └─────────────────────────────────────────────┘
//!                 │
//!                 ▼
//!   splice values from the last token to the first
//! ```
//!
//! # Splice order
//!
//! Values rarely have the same length as the token they replace, so each
//! splice shifts everything after it. Tokens are therefore replaced from
//! the end of the text toward the start: offsets of the tokens still to be
//! processed all lie before the splice point and stay valid.
//!
//! # Async
//!
//! [`PlaceholderResolver::resolve_async`] resolves every distinct token as
//! its own task on the tokio blocking pool (handlers may block), waits for
//! all of them, then runs the same descending splice. Output is identical
//! to [`PlaceholderResolver::resolve`] regardless of completion order.

mod builder;
mod custom;

pub use builder::PlaceholderResolverBuilder;
pub use custom::CustomResolver;

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::cache::{CacheKey, PlaceholderCache};
use crate::parser::PlaceholderParser;
use crate::registry::PlaceholderRegistry;
use crate::telemetry;
use crate::types::{ParsedPlaceholder, PlaceholderContext, PlaceholderResult};
use custom::CustomResolvers;

/// Resolves placeholder tokens in text.
///
/// Cheap to clone; clones share configuration, cache and the custom
/// resolver table. Safe to call concurrently from any number of threads.
///
/// ```rust
/// # use mimir::{ExpansionRegistry, PlaceholderContext, PlaceholderHandler, PlaceholderResolver};
/// let mut registry = ExpansionRegistry::new();
/// registry
///     .register(PlaceholderHandler::exact("server", "name", |_| Ok(Some("Lobby".into()))))
///     .unwrap();
///
/// let resolver = PlaceholderResolver::builder().registry(registry).build();
/// let text = resolver.resolve("Welcome to %server_name%!", &PlaceholderContext::empty());
/// assert_eq!(text, "Welcome to Lobby!");
/// ```
#[derive(Clone)]
pub struct PlaceholderResolver {
    inner: Arc<ResolverInner>,
}

struct ResolverInner {
    registry: Option<Arc<dyn PlaceholderRegistry>>,
    cache: Option<Arc<dyn PlaceholderCache>>,
    parser: Arc<dyn PlaceholderParser>,
    fallback: Option<String>,
    preserve_unknown: bool,
    custom: CustomResolvers,
}

impl PlaceholderResolver {
    pub fn builder() -> PlaceholderResolverBuilder {
        PlaceholderResolverBuilder::new()
    }

    /// Resolve all tokens in `text`, substituting the configured fallback
    /// for unresolvable ones.
    ///
    /// Text without tokens is returned borrowed and unchanged.
    pub fn resolve<'a>(&self, text: &'a str, context: &PlaceholderContext) -> Cow<'a, str> {
        self.resolve_with_fallback(text, context, self.inner.fallback.as_deref())
    }

    /// Resolve all tokens in `text` with an explicit fallback.
    ///
    /// `None` substitutes the empty string. Ignored when the resolver
    /// preserves unknown tokens.
    #[instrument(level = "debug", skip_all)]
    pub fn resolve_with_fallback<'a>(
        &self,
        text: &'a str,
        context: &PlaceholderContext,
        fallback: Option<&str>,
    ) -> Cow<'a, str> {
        let Some(mut tokens) = self.tokens(text) else {
            return Cow::Borrowed(text);
        };
        tokens.sort_by(|a, b| b.start().cmp(&a.start()));

        let mut resolved: HashMap<String, PlaceholderResult> = HashMap::new();
        for token in &tokens {
            if !resolved.contains_key(token.full_key()) {
                let result = self.inner.resolve_single(token, context);
                resolved.insert(token.full_key().to_owned(), result);
            }
        }

        Cow::Owned(self.inner.splice(text, &tokens, &resolved, fallback))
    }

    /// Resolve all tokens in `text` concurrently.
    ///
    /// Must be called from within a tokio runtime. Produces exactly the
    /// output of [`resolve`](Self::resolve) for the same input.
    #[instrument(level = "debug", skip_all)]
    pub async fn resolve_async<'a>(
        &self,
        text: &'a str,
        context: &PlaceholderContext,
    ) -> Cow<'a, str> {
        let Some(mut tokens) = self.tokens(text) else {
            return Cow::Borrowed(text);
        };
        tokens.sort_by(|a, b| b.start().cmp(&a.start()));

        let context = Arc::new(context.clone());
        let mut seen = HashSet::new();
        let mut tasks = JoinSet::new();
        for token in &tokens {
            if !seen.insert(token.full_key()) {
                continue;
            }
            let inner = Arc::clone(&self.inner);
            let context = Arc::clone(&context);
            let token = token.clone();
            tasks.spawn_blocking(move || {
                let result = inner.resolve_single(&token, &context);
                (token.full_key().to_owned(), result)
            });
        }

        let mut resolved = HashMap::with_capacity(seen.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, result)) => {
                    resolved.insert(key, result);
                }
                // The token stays unresolved.
                Err(e) => warn!(error = %e, "placeholder resolution task failed"),
            }
        }

        Cow::Owned(
            self.inner
                .splice(text, &tokens, &resolved, self.inner.fallback.as_deref()),
        )
    }

    /// Resolve a single placeholder given by name, with or without
    /// delimiters (`"player_name"` or `"%player_name%"`).
    ///
    /// Malformed input yields [`PlaceholderResult::Empty`].
    pub fn resolve_placeholder(
        &self,
        placeholder: &str,
        context: &PlaceholderContext,
    ) -> PlaceholderResult {
        match self.inner.parser.try_parse(placeholder) {
            Some(token) => self.inner.resolve_single(&token, context),
            None => PlaceholderResult::Empty,
        }
    }

    /// Resolve an already parsed token.
    pub fn resolve_token(
        &self,
        token: &ParsedPlaceholder,
        context: &PlaceholderContext,
    ) -> PlaceholderResult {
        self.inner.resolve_single(token, context)
    }

    /// Route every token of `expansion` to `resolver` before the cache and
    /// registry. Returns whether a previous custom resolver was replaced.
    ///
    /// Takes effect for resolutions that start after the call.
    pub fn register_custom_resolver<F>(&self, expansion: &str, resolver: F) -> bool
    where
        F: Fn(&PlaceholderContext, &str) -> Result<Option<String>> + Send + Sync + 'static,
    {
        self.inner.custom.insert(expansion, Arc::new(resolver))
    }

    /// Register a [`CustomResolver`] implementation shared with other owners.
    pub fn register_shared_custom_resolver(
        &self,
        expansion: &str,
        resolver: Arc<dyn CustomResolver>,
    ) -> bool {
        self.inner.custom.insert(expansion, resolver)
    }

    /// Remove the custom resolver for `expansion`. Returns whether one existed.
    pub fn unregister_custom_resolver(&self, expansion: &str) -> bool {
        self.inner.custom.remove(expansion)
    }

    pub fn has_custom_resolver(&self, expansion: &str) -> bool {
        self.inner.custom.contains(expansion)
    }

    pub fn parser(&self) -> &dyn PlaceholderParser {
        self.inner.parser.as_ref()
    }

    pub fn fallback(&self) -> Option<&str> {
        self.inner.fallback.as_deref()
    }

    pub fn preserves_unknown(&self) -> bool {
        self.inner.preserve_unknown
    }

    /// Parsed tokens of `text`, or `None` when there is nothing to resolve.
    fn tokens(&self, text: &str) -> Option<Vec<ParsedPlaceholder>> {
        if !self.inner.parser.contains_placeholders(text) {
            return None;
        }
        let tokens = self.inner.parser.find_all(text);
        (!tokens.is_empty()).then_some(tokens)
    }
}

impl ResolverInner {
    fn resolve_single(
        &self,
        token: &ParsedPlaceholder,
        context: &PlaceholderContext,
    ) -> PlaceholderResult {
        if token.is_relational() && !context.is_relational() {
            record_resolution("empty");
            return PlaceholderResult::Empty;
        }

        if let Some(resolver) = self.custom.get(token.expansion())
            && let Some(value) =
                custom::invoke(resolver.as_ref(), token.expansion(), context, token.identifier())
        {
            debug!(placeholder = token.full_key(), "resolved by custom resolver");
            record_resolution("custom");
            return PlaceholderResult::Value(value);
        }

        // A relational handler's value depends on the target, which a plain
        // token's cache key does not carry.
        if !token.is_relational()
            && self
                .registry
                .as_ref()
                .is_some_and(|r| r.is_relational(token.expansion(), token.identifier()))
        {
            debug!(
                placeholder = token.full_key(),
                "relational placeholder used without rel_ marker"
            );
            record_resolution("empty");
            return PlaceholderResult::Empty;
        }

        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::for_token(token, context));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(value) = cache.get(key) {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                debug!(placeholder = token.full_key(), "placeholder cache hit");
                record_resolution("cache");
                return PlaceholderResult::Cached(value);
            }
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
        }

        let Some(registry) = &self.registry else {
            record_resolution("empty");
            return PlaceholderResult::Empty;
        };

        let result = registry.resolve(token.expansion(), token.identifier(), context);
        match (&result, &self.cache, key) {
            (PlaceholderResult::Value(value), Some(cache), Some(key)) => {
                let ttl = registry.cache_ttl(token.expansion(), token.identifier());
                cache.put(key, value.clone(), ttl);
                record_resolution("registry");
            }
            (PlaceholderResult::Empty, _, _) => record_resolution("empty"),
            _ => record_resolution("registry"),
        }
        result
    }

    /// Replace tokens in `text`. `tokens` must be sorted by descending start.
    fn splice(
        &self,
        text: &str,
        tokens: &[ParsedPlaceholder],
        resolved: &HashMap<String, PlaceholderResult>,
        fallback: Option<&str>,
    ) -> String {
        let mut out = text.to_owned();
        for token in tokens {
            let range = token.start()..token.end();
            match resolved.get(token.full_key()).and_then(PlaceholderResult::value) {
                Some(value) => out.replace_range(range, value),
                None if self.preserve_unknown => {}
                None => out.replace_range(range, fallback.unwrap_or_default()),
            }
        }
        out
    }
}

fn record_resolution(source: &'static str) {
    metrics::counter!(telemetry::RESOLUTIONS_TOTAL, "source" => source).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ExpansionRegistry, PlaceholderHandler};

    fn resolver_with(values: &[(&str, &str, &'static str)]) -> PlaceholderResolver {
        let mut registry = ExpansionRegistry::new();
        for (expansion, id, value) in values {
            let value = *value;
            registry
                .register(PlaceholderHandler::exact(*expansion, *id, move |_| {
                    Ok(Some(value.to_owned()))
                }))
                .unwrap();
        }
        PlaceholderResolver::builder().registry(registry).build()
    }

    #[test]
    fn splice_handles_growing_and_shrinking_values() {
        let resolver = resolver_with(&[("x", "a", "a much longer value"), ("y", "b", "")]);
        let out = resolver.resolve("A %x_a% B %y_b% C", &PlaceholderContext::empty());
        assert_eq!(out, "A a much longer value B  C");
    }

    #[test]
    fn repeated_token_is_replaced_everywhere() {
        let resolver = resolver_with(&[("x", "a", "1")]);
        let out = resolver.resolve("%x_a%-%x_a%-%x_a%", &PlaceholderContext::empty());
        assert_eq!(out, "1-1-1");
    }

    #[test]
    fn token_free_text_is_borrowed() {
        let resolver = resolver_with(&[]);
        let out = resolver.resolve("no tokens, 100% sure", &PlaceholderContext::empty());
        assert!(matches!(out, Cow::Borrowed("no tokens, 100% sure")));
    }

    #[test]
    fn resolver_without_registry_uses_fallback() {
        let resolver = PlaceholderResolver::builder().fallback("?").build();
        let out = resolver.resolve("[%a_b%]", &PlaceholderContext::empty());
        assert_eq!(out, "[?]");
    }

    #[test]
    fn explicit_fallback_overrides_default() {
        let resolver = PlaceholderResolver::builder().fallback("?").build();
        let out = resolver.resolve_with_fallback("[%a_b%]", &PlaceholderContext::empty(), Some("-"));
        assert_eq!(out, "[-]");
        let out = resolver.resolve_with_fallback("[%a_b%]", &PlaceholderContext::empty(), None);
        assert_eq!(out, "[]");
    }
}
