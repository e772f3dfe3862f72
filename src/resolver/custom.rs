//! Runtime-registered custom resolvers.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use crate::Result;
use crate::registry::record_failure;
use crate::types::PlaceholderContext;

/// Resolver for a whole expansion, consulted before cache and registry.
///
/// Values from custom resolvers are never cached by the resolver.
/// `Ok(None)` passes the token on to the cache/registry path; errors and
/// panics are logged and treated the same way.
pub trait CustomResolver: Send + Sync {
    fn resolve(&self, context: &PlaceholderContext, identifier: &str) -> Result<Option<String>>;
}

impl<F> CustomResolver for F
where
    F: Fn(&PlaceholderContext, &str) -> Result<Option<String>> + Send + Sync,
{
    fn resolve(&self, context: &PlaceholderContext, identifier: &str) -> Result<Option<String>> {
        self(context, identifier)
    }
}

/// Concurrent expansion → custom resolver table.
///
/// Lookups clone the resolver handle out of the read lock, so a running
/// resolution works on a snapshot and never holds the lock while a
/// resolver runs.
#[derive(Default)]
pub(crate) struct CustomResolvers {
    table: RwLock<HashMap<String, Arc<dyn CustomResolver>>>,
}

impl CustomResolvers {
    pub(crate) fn insert(&self, expansion: &str, resolver: Arc<dyn CustomResolver>) -> bool {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(expansion.to_ascii_lowercase(), resolver)
            .is_some()
    }

    pub(crate) fn remove(&self, expansion: &str) -> bool {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&expansion.to_ascii_lowercase())
            .is_some()
    }

    pub(crate) fn get(&self, expansion: &str) -> Option<Arc<dyn CustomResolver>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        if table.is_empty() {
            return None;
        }
        table.get(&expansion.to_ascii_lowercase()).cloned()
    }

    pub(crate) fn contains(&self, expansion: &str) -> bool {
        self.get(expansion).is_some()
    }
}

/// Run a custom resolver, converting errors and panics to `None`.
pub(crate) fn invoke(
    resolver: &dyn CustomResolver,
    expansion: &str,
    context: &PlaceholderContext,
    identifier: &str,
) -> Option<String> {
    match catch_unwind(AssertUnwindSafe(|| resolver.resolve(context, identifier))) {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            record_failure(expansion);
            warn!(expansion, identifier, error = %e, "custom resolver failed");
            None
        }
        Err(_) => {
            record_failure(expansion);
            warn!(expansion, identifier, "custom resolver panicked");
            None
        }
    }
}
