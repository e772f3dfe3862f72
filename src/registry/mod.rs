//! Expansion registry: maps expansion names to value-producing handlers.
//!
//! The resolver only sees the [`PlaceholderRegistry`] trait. The bundled
//! [`ExpansionRegistry`] is built at startup from explicit
//! [`PlaceholderHandler`] registrations.
//!
//! # Lookup
//!
//! Within an expansion, a handler is chosen by identifier:
//! 1. exact identifier match
//! 2. longest matching prefix (the remainder is passed as `argument`)
//! 3. the expansion's catch-all handler
//!
//! # Gating
//!
//! Before a handler runs, the registry checks its metadata against the
//! context. A relational handler needs a relational context, an
//! online-only handler needs an online primary subject, and relational
//! constraints (same world, max distance) are checked through the
//! configured [`SubjectLocator`]. Any failed check yields an empty result.
//!
//! The registry only sees `(expansion, identifier)`, not the token form.
//! [`PlaceholderRegistry::is_relational`] lets the resolver refuse a plain
//! token that would reach a relational handler.
//!
//! # Failure boundary
//!
//! Handler errors and panics stop here: they are logged, counted under
//! [`HANDLER_FAILURES_TOTAL`](crate::telemetry::HANDLER_FAILURES_TOTAL) and
//! turned into [`PlaceholderResult::Empty`], so one broken handler cannot
//! break a resolve pass for unrelated tokens.

mod handler;
mod locator;

pub use handler::{
    HandlerFn, HandlerRequest, IdentifierPattern, PlaceholderHandler, RelationalConstraints,
};
pub use locator::{Location, SubjectLocator};

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::telemetry;
use crate::types::{CacheTtl, PlaceholderContext, PlaceholderResult};
use crate::{MimirError, Result};

/// Source of placeholder values consumed by the resolver.
///
/// Implementations never fail: unknown placeholders, declined or failing
/// handlers and gated-out requests all come back as
/// [`PlaceholderResult::Empty`].
pub trait PlaceholderRegistry: Send + Sync {
    /// Produce the value of `expansion_identifier` for `context`.
    fn resolve(
        &self,
        expansion: &str,
        identifier: &str,
        context: &PlaceholderContext,
    ) -> PlaceholderResult;

    /// How long a value of `expansion_identifier` may be cached.
    fn cache_ttl(&self, expansion: &str, identifier: &str) -> CacheTtl;

    /// Whether `expansion_identifier` is answered by a relational handler.
    ///
    /// Such placeholders are only resolved through `rel_` tokens, whose
    /// cache key carries both subjects.
    fn is_relational(&self, _expansion: &str, _identifier: &str) -> bool {
        false
    }
}

/// Handlers of one expansion.
#[derive(Debug, Default)]
struct Expansion {
    exact: HashMap<String, PlaceholderHandler>,
    /// Ordered longest prefix first.
    prefixes: Vec<(String, PlaceholderHandler)>,
    any: Option<PlaceholderHandler>,
}

impl Expansion {
    fn insert(&mut self, handler: PlaceholderHandler) -> bool {
        match handler.pattern.clone() {
            IdentifierPattern::Exact(id) => self.exact.insert(id, handler).is_some(),
            IdentifierPattern::Prefix(prefix) => {
                let replaced = match self.prefixes.iter_mut().find(|(p, _)| *p == prefix) {
                    Some(slot) => {
                        slot.1 = handler;
                        true
                    }
                    None => {
                        self.prefixes.push((prefix, handler));
                        false
                    }
                };
                self.prefixes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
                replaced
            }
            IdentifierPattern::Any => self.any.replace(handler).is_some(),
        }
    }

    fn lookup<'a>(&'a self, identifier: &'a str) -> Option<(&'a PlaceholderHandler, Option<&'a str>)> {
        if let Some(handler) = self.exact.get(identifier) {
            return Some((handler, None));
        }
        for (prefix, handler) in &self.prefixes {
            if let Some(rest) = identifier.strip_prefix(prefix.as_str()) {
                return Some((handler, Some(rest)));
            }
        }
        self.any.as_ref().map(|h| (h, None))
    }

    fn len(&self) -> usize {
        self.exact.len() + self.prefixes.len() + usize::from(self.any.is_some())
    }
}

/// Registry of placeholder handlers grouped by expansion.
///
/// Registration happens at startup through `&mut self`; once shared with a
/// resolver (behind an `Arc`) the registry is read-only.
///
/// ```rust
/// # use mimir::{ExpansionRegistry, PlaceholderContext, PlaceholderHandler, PlaceholderRegistry};
/// let mut registry = ExpansionRegistry::new();
/// registry
///     .register(PlaceholderHandler::exact("server", "name", |_| Ok(Some("Lobby".into()))))
///     .unwrap();
///
/// let result = registry.resolve("server", "name", &PlaceholderContext::empty());
/// assert_eq!(result.value(), Some("Lobby"));
/// ```
pub struct ExpansionRegistry {
    expansions: HashMap<String, Expansion>,
    default_ttl: CacheTtl,
    locator: Option<Arc<dyn SubjectLocator>>,
}

impl Default for ExpansionRegistry {
    fn default() -> Self {
        Self {
            expansions: HashMap::new(),
            default_ttl: CacheTtl::DEFAULT,
            locator: None,
        }
    }
}

impl ExpansionRegistry {
    /// Create an empty registry with [`CacheTtl::DEFAULT`] as default TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the TTL used for handlers that declare none.
    pub fn set_default_ttl(&mut self, ttl: CacheTtl) {
        self.default_ttl = ttl;
    }

    pub fn default_ttl(&self) -> CacheTtl {
        self.default_ttl
    }

    /// Set the locator used to check relational constraints.
    ///
    /// Without a locator, handlers that declare same-world or max-distance
    /// constraints never run.
    pub fn set_locator(&mut self, locator: Arc<dyn SubjectLocator>) {
        self.locator = Some(locator);
    }

    /// Register a handler, replacing any handler with the same expansion
    /// and pattern.
    pub fn register(&mut self, handler: PlaceholderHandler) -> Result<()> {
        validate(&handler)?;
        let expansion = handler.expansion.clone();
        let pattern = handler.pattern.clone();
        let replaced = self
            .expansions
            .entry(expansion.clone())
            .or_default()
            .insert(handler);
        if replaced {
            debug!(expansion = %expansion, pattern = ?pattern, "replaced placeholder handler");
        }
        Ok(())
    }

    /// Remove every handler of an expansion. Returns whether it existed.
    pub fn unregister_expansion(&mut self, expansion: &str) -> bool {
        self.expansions
            .remove(&expansion.to_ascii_lowercase())
            .is_some()
    }

    /// Registered expansion names, sorted.
    pub fn expansions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.expansions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Whether some handler would be selected for `expansion_identifier`.
    pub fn contains(&self, expansion: &str, identifier: &str) -> bool {
        self.find(expansion, identifier).is_some()
    }

    /// Total number of registered handlers.
    pub fn len(&self) -> usize {
        self.expansions.values().map(Expansion::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.expansions.is_empty()
    }

    fn find<'a>(
        &'a self,
        expansion: &str,
        identifier: &'a str,
    ) -> Option<(&'a PlaceholderHandler, Option<&'a str>)> {
        self.expansions
            .get(&expansion.to_ascii_lowercase())?
            .lookup(identifier)
    }

    /// Whether `handler`'s metadata admits `context`.
    fn admits(&self, handler: &PlaceholderHandler, context: &PlaceholderContext) -> bool {
        if handler.requires_online && !context.is_primary_online() {
            return false;
        }
        if !handler.relational {
            return true;
        }
        let Some((viewer, target)) = context.relation() else {
            return false;
        };
        if handler.constraints.is_unconstrained() {
            return true;
        }

        let Some(locator) = &self.locator else {
            return false;
        };
        let (Some(a), Some(b)) = (locator.locate(viewer), locator.locate(target)) else {
            return false;
        };
        if handler.constraints.same_world && a.world != b.world {
            return false;
        }
        match handler.constraints.max_distance {
            Some(max) => a.distance(&b).is_some_and(|d| d <= max),
            None => true,
        }
    }
}

impl PlaceholderRegistry for ExpansionRegistry {
    fn resolve(
        &self,
        expansion: &str,
        identifier: &str,
        context: &PlaceholderContext,
    ) -> PlaceholderResult {
        let Some((handler, argument)) = self.find(expansion, identifier) else {
            return PlaceholderResult::Empty;
        };
        if !self.admits(handler, context) {
            debug!(
                expansion = handler.expansion.as_str(),
                identifier, "placeholder handler gated out by context"
            );
            return PlaceholderResult::Empty;
        }

        let request = HandlerRequest {
            expansion: &handler.expansion,
            identifier,
            argument,
            context,
        };
        invoke(handler, &request)
    }

    fn cache_ttl(&self, expansion: &str, identifier: &str) -> CacheTtl {
        self.find(expansion, identifier)
            .and_then(|(handler, _)| handler.ttl)
            .unwrap_or(self.default_ttl)
    }

    fn is_relational(&self, expansion: &str, identifier: &str) -> bool {
        self.find(expansion, identifier)
            .is_some_and(|(handler, _)| handler.relational)
    }
}

/// Run a handler, converting errors and panics to an empty result.
fn invoke(handler: &PlaceholderHandler, request: &HandlerRequest<'_>) -> PlaceholderResult {
    match catch_unwind(AssertUnwindSafe(|| (handler.func)(request))) {
        Ok(Ok(value)) => PlaceholderResult::from(value),
        Ok(Err(e)) => {
            record_failure(request.expansion);
            warn!(
                expansion = request.expansion,
                identifier = request.identifier,
                error = %e,
                "placeholder handler failed"
            );
            PlaceholderResult::Empty
        }
        Err(_) => {
            record_failure(request.expansion);
            warn!(
                expansion = request.expansion,
                identifier = request.identifier,
                "placeholder handler panicked"
            );
            PlaceholderResult::Empty
        }
    }
}

pub(crate) fn record_failure(expansion: &str) {
    metrics::counter!(telemetry::HANDLER_FAILURES_TOTAL, "expansion" => expansion.to_owned())
        .increment(1);
}

fn validate(handler: &PlaceholderHandler) -> Result<()> {
    let name = handler.expansion.as_str();
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(MimirError::InvalidPattern(format!(
            "invalid expansion name {name:?}"
        )));
    }
    match &handler.pattern {
        IdentifierPattern::Exact(s) | IdentifierPattern::Prefix(s) if s.is_empty() => Err(
            MimirError::InvalidPattern(format!("empty identifier pattern for expansion {name:?}")),
        ),
        _ => Ok(()),
    }
}
