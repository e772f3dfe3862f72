//! Resolution context.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::SubjectId;
use crate::{MimirError, Result};

/// Immutable snapshot of the inputs a placeholder is resolved against.
///
/// A context is *relational* iff it carries a secondary subject (the
/// target, with the primary subject acting as viewer). Relational
/// placeholders only resolve against relational contexts.
///
/// Contexts are never mutated; the `with_*` methods return a modified copy.
///
/// ```rust
/// # use mimir::{PlaceholderContext, SubjectId};
/// let viewer = SubjectId::random();
/// let target = SubjectId::random();
///
/// let ctx = PlaceholderContext::of(viewer).with_data("world", "nether");
/// assert!(!ctx.is_relational());
///
/// let rel = ctx.with_relational(target).unwrap();
/// assert!(rel.is_relational());
/// assert_eq!(rel.data_str("world"), Some("nether"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderContext {
    primary: Option<SubjectId>,
    primary_online: bool,
    secondary: Option<SubjectId>,
    data: HashMap<String, Value>,
}

impl PlaceholderContext {
    /// A context with no subject at all (server-wide placeholders only).
    pub fn empty() -> Self {
        Self {
            primary: None,
            primary_online: false,
            secondary: None,
            data: HashMap::new(),
        }
    }

    /// A context for an online subject.
    pub fn of(subject: SubjectId) -> Self {
        Self {
            primary: Some(subject),
            primary_online: true,
            ..Self::empty()
        }
    }

    /// A context for a subject that is not currently online.
    pub fn offline(subject: SubjectId) -> Self {
        Self {
            primary: Some(subject),
            primary_online: false,
            ..Self::empty()
        }
    }

    /// A relational context: `viewer` looking at `target`.
    pub fn relational(viewer: SubjectId, target: SubjectId) -> Self {
        Self {
            secondary: Some(target),
            ..Self::of(viewer)
        }
    }

    pub fn builder() -> PlaceholderContextBuilder {
        PlaceholderContextBuilder::default()
    }

    pub fn primary_subject(&self) -> Option<SubjectId> {
        self.primary
    }

    pub fn is_primary_online(&self) -> bool {
        self.primary_online
    }

    pub fn secondary_subject(&self) -> Option<SubjectId> {
        self.secondary
    }

    pub fn is_relational(&self) -> bool {
        self.secondary.is_some()
    }

    /// Both subjects of a relational context, `(viewer, target)`.
    pub fn relation(&self) -> Option<(SubjectId, SubjectId)> {
        self.primary.zip(self.secondary)
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Side data as a string slice, if present and a JSON string.
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Side data deserialized into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent.
    pub fn data_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.data
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(MimirError::from)
    }

    pub fn data_keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Copy of this context with one side-data entry set.
    pub fn with_data(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.data.insert(key.into(), value.into());
        next
    }

    /// Copy of this context made relational against `target`.
    ///
    /// The primary subject becomes the viewer. Fails on a context without
    /// a primary subject, like the builder does.
    pub fn with_relational(&self, target: SubjectId) -> Result<Self> {
        if self.primary.is_none() {
            return Err(MimirError::InvalidContext(
                "relational target set without a primary subject".into(),
            ));
        }
        Ok(Self {
            secondary: Some(target),
            ..self.clone()
        })
    }

    /// Copy of this context with the secondary subject removed.
    pub fn without_relational(&self) -> Self {
        Self {
            secondary: None,
            ..self.clone()
        }
    }
}

impl Default for PlaceholderContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Builder for [`PlaceholderContext`].
#[derive(Debug, Default)]
pub struct PlaceholderContextBuilder {
    primary: Option<SubjectId>,
    online: Option<bool>,
    secondary: Option<SubjectId>,
    data: HashMap<String, Value>,
}

impl PlaceholderContextBuilder {
    pub fn subject(mut self, subject: SubjectId) -> Self {
        self.primary = Some(subject);
        self
    }

    /// Whether the primary subject is online (default: true when a subject is set).
    pub fn online(mut self, online: bool) -> Self {
        self.online = Some(online);
        self
    }

    pub fn target(mut self, target: SubjectId) -> Self {
        self.secondary = Some(target);
        self
    }

    pub fn data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Build the context.
    ///
    /// Fails if a target was set without a primary subject, or if the
    /// context was marked online without a subject.
    pub fn build(self) -> Result<PlaceholderContext> {
        if self.secondary.is_some() && self.primary.is_none() {
            return Err(MimirError::InvalidContext(
                "relational target set without a primary subject".into(),
            ));
        }
        if self.primary.is_none() && self.online == Some(true) {
            return Err(MimirError::InvalidContext(
                "online flag set without a primary subject".into(),
            ));
        }
        Ok(PlaceholderContext {
            primary_online: self.primary.is_some() && self.online.unwrap_or(true),
            primary: self.primary,
            secondary: self.secondary,
            data: self.data,
        })
    }
}
