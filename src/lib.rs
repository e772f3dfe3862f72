//! Mimir - placeholder resolution engine
//!
//! Resolves `%expansion_identifier%` tokens in text into values computed
//! per viewer. Expansions are contributed as handlers to a registry;
//! values are cached per subject (or per viewer/target pair for
//! relational placeholders) with a TTL chosen by the handler.
//!
//! # Example
//!
//! ```rust
//! use mimir::{
//!     CacheTtl, ExpansionRegistry, PlaceholderContext, PlaceholderHandler,
//!     PlaceholderResolver, SubjectId,
//! };
//! use mimir::cache::MemoryPlaceholderCache;
//!
//! # fn main() -> mimir::Result<()> {
//! let mut registry = ExpansionRegistry::new();
//! registry.register(
//!     PlaceholderHandler::exact("player", "name", |_| Ok(Some("Steve".into())))
//!         .ttl(CacheTtl::LONG),
//! )?;
//! registry.register(
//!     PlaceholderHandler::exact("factions", "rel_faction", |_| Ok(Some("Ally".into())))
//!         .relational(),
//! )?;
//!
//! let resolver = PlaceholderResolver::builder()
//!     .registry(registry)
//!     .cache(MemoryPlaceholderCache::default())
//!     .build();
//!
//! let ctx = PlaceholderContext::relational(SubjectId::random(), SubjectId::random());
//! let text = resolver.resolve(
//!     "Hello %player_name%, you have %rel_factions_rel_faction% standing.",
//!     &ctx,
//! );
//! assert_eq!(text, "Hello Steve, you have Ally standing.");
//! # Ok(())
//! # }
//! ```
//!
//! # Async Example
//!
//! ```rust,no_run
//! use mimir::{PlaceholderContext, PlaceholderResolver};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = PlaceholderResolver::builder().preserve_unknown(true).build();
//!     let text = resolver
//!         .resolve_async("%unknown_token% stays", &PlaceholderContext::empty())
//!         .await;
//!     assert_eq!(text, "%unknown_token% stays");
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod parser;
pub mod registry;
pub mod resolver;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use config::ResolverConfig;
pub use error::{MimirError, Result};
pub use parser::{DelimitedParser, PlaceholderParser};
pub use registry::{ExpansionRegistry, PlaceholderHandler, PlaceholderRegistry};
pub use resolver::{CustomResolver, PlaceholderResolver, PlaceholderResolverBuilder};

// Re-export all types
pub use types::{
    CacheTtl, ParsedPlaceholder, PlaceholderContext, PlaceholderContextBuilder, PlaceholderResult,
    SubjectId,
};
