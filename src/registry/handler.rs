//! Handler definitions registered with an [`ExpansionRegistry`](super::ExpansionRegistry).

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::types::{CacheTtl, PlaceholderContext};

/// Arguments passed to a handler invocation.
#[derive(Debug, Clone, Copy)]
pub struct HandlerRequest<'a> {
    /// Expansion name, lowercased.
    pub expansion: &'a str,
    /// Full identifier as written in the token.
    pub identifier: &'a str,
    /// Remainder of the identifier after a [`IdentifierPattern::Prefix`] match.
    pub argument: Option<&'a str>,
    pub context: &'a PlaceholderContext,
}

/// Handler function: `Ok(Some(_))` resolves, `Ok(None)` declines.
///
/// Errors and panics are caught by the registry and treated as a decline.
pub type HandlerFn = Arc<dyn Fn(&HandlerRequest<'_>) -> Result<Option<String>> + Send + Sync>;

/// Which identifiers of an expansion a handler answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentifierPattern {
    /// Exactly this identifier.
    Exact(String),
    /// Any identifier starting with this prefix; the rest is the argument.
    Prefix(String),
    /// Every identifier not claimed by an exact or prefix handler.
    Any,
}

/// Constraints checked before a relational handler runs.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RelationalConstraints {
    /// Viewer and target must be in the same world.
    pub same_world: bool,
    /// Viewer and target must be within this distance (implies same world).
    pub max_distance: Option<f64>,
}

impl RelationalConstraints {
    pub fn is_unconstrained(&self) -> bool {
        !self.same_world && self.max_distance.is_none()
    }
}

/// A value-producing handler plus its registration metadata.
///
/// ```rust
/// # use mimir::{CacheTtl, PlaceholderHandler};
/// let handler = PlaceholderHandler::exact("player", "name", |req| {
///     Ok(req.context.primary_subject().map(|s| s.to_string()))
/// })
/// .ttl(CacheTtl::LONG)
/// .requires_online();
/// assert_eq!(handler.expansion(), "player");
/// ```
#[derive(Clone)]
pub struct PlaceholderHandler {
    pub(crate) expansion: String,
    pub(crate) pattern: IdentifierPattern,
    pub(crate) ttl: Option<CacheTtl>,
    pub(crate) relational: bool,
    pub(crate) requires_online: bool,
    pub(crate) constraints: RelationalConstraints,
    pub(crate) func: HandlerFn,
}

impl PlaceholderHandler {
    pub fn new<F>(expansion: impl Into<String>, pattern: IdentifierPattern, func: F) -> Self
    where
        F: Fn(&HandlerRequest<'_>) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            expansion: expansion.into().to_ascii_lowercase(),
            pattern,
            ttl: None,
            relational: false,
            requires_online: false,
            constraints: RelationalConstraints::default(),
            func: Arc::new(func),
        }
    }

    /// Handler for one identifier.
    pub fn exact<F>(expansion: impl Into<String>, identifier: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HandlerRequest<'_>) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self::new(expansion, IdentifierPattern::Exact(identifier.into()), func)
    }

    /// Handler for every identifier starting with `prefix`.
    pub fn prefix<F>(expansion: impl Into<String>, prefix: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HandlerRequest<'_>) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self::new(expansion, IdentifierPattern::Prefix(prefix.into()), func)
    }

    /// Catch-all handler for an expansion.
    pub fn any<F>(expansion: impl Into<String>, func: F) -> Self
    where
        F: Fn(&HandlerRequest<'_>) -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self::new(expansion, IdentifierPattern::Any, func)
    }

    /// Cache TTL for values this handler produces. Unset means the
    /// registry's default TTL.
    pub fn ttl(mut self, ttl: CacheTtl) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Only invoke this handler with a relational context.
    pub fn relational(mut self) -> Self {
        self.relational = true;
        self
    }

    /// Only invoke this handler while the primary subject is online.
    pub fn requires_online(mut self) -> Self {
        self.requires_online = true;
        self
    }

    /// Require viewer and target to share a world. Implies [`relational`](Self::relational).
    pub fn same_world(mut self) -> Self {
        self.relational = true;
        self.constraints.same_world = true;
        self
    }

    /// Require viewer and target within `distance`. Implies [`relational`](Self::relational).
    pub fn max_distance(mut self, distance: f64) -> Self {
        self.relational = true;
        self.constraints.max_distance = Some(distance);
        self
    }

    pub fn expansion(&self) -> &str {
        &self.expansion
    }

    pub fn pattern(&self) -> &IdentifierPattern {
        &self.pattern
    }

    pub fn cache_ttl(&self) -> Option<CacheTtl> {
        self.ttl
    }

    pub fn is_relational(&self) -> bool {
        self.relational
    }

    pub fn constraints(&self) -> RelationalConstraints {
        self.constraints
    }
}

impl fmt::Debug for PlaceholderHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaceholderHandler")
            .field("expansion", &self.expansion)
            .field("pattern", &self.pattern)
            .field("ttl", &self.ttl)
            .field("relational", &self.relational)
            .field("requires_online", &self.requires_online)
            .field("constraints", &self.constraints)
            .finish_non_exhaustive()
    }
}
