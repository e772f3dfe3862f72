//! Resolver configuration loading.
//!
//! Configuration is read from TOML. Every field is optional:
//!
//! ```toml
//! fallback = "?"
//! preserve_unknown = false
//! delimiter = "%"
//!
//! [cache]
//! enabled = true
//! max_entries = 10000
//!
//! [registry]
//! default_ttl_ms = 30000
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::cache::{MemoryCacheConfig, MemoryPlaceholderCache};
use crate::parser::{DEFAULT_DELIMITER, DelimitedParser};
use crate::registry::ExpansionRegistry;
use crate::resolver::PlaceholderResolverBuilder;
use crate::types::CacheTtl;
use crate::{MimirError, Result};

/// Resolver configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Text substituted for unresolvable tokens (default: empty string).
    #[serde(default)]
    pub fallback: Option<String>,
    /// Keep unresolvable tokens verbatim (default: false).
    #[serde(default)]
    pub preserve_unknown: bool,
    /// Token delimiter (default: `%`).
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub registry: RegistrySection,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fallback: None,
            preserve_unknown: false,
            delimiter: default_delimiter(),
            cache: CacheSection::default(),
            registry: RegistrySection::default(),
        }
    }
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

/// Placeholder cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Whether resolved values are cached at all (default: true).
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Maximum cached values (default: 10,000).
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_entries() -> u64 {
    MemoryCacheConfig::default().max_entries
}

/// Registry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySection {
    /// TTL for handlers that declare none, in milliseconds (default: 30,000).
    #[serde(default)]
    pub default_ttl_ms: CacheTtl,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            default_ttl_ms: CacheTtl::DEFAULT,
        }
    }
}

impl ResolverConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ResolverConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        DelimitedParser::new(self.delimiter)?;
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(MimirError::Configuration(
                "cache.max_entries must be positive when the cache is enabled".into(),
            ));
        }
        Ok(())
    }

    /// Memory cache settings, or `None` when caching is disabled.
    pub fn memory_cache_config(&self) -> Option<MemoryCacheConfig> {
        self.cache
            .enabled
            .then(|| MemoryCacheConfig::new().max_entries(self.cache.max_entries))
    }

    /// An empty registry using the configured default TTL.
    pub fn registry(&self) -> ExpansionRegistry {
        let mut registry = ExpansionRegistry::new();
        registry.set_default_ttl(self.registry.default_ttl_ms);
        registry
    }

    /// A resolver builder with parser, cache, fallback and unknown-token
    /// handling applied. Add a registry before building.
    pub fn resolver_builder(&self) -> Result<PlaceholderResolverBuilder> {
        self.validate()?;
        let mut builder = PlaceholderResolverBuilder::new()
            .parser(DelimitedParser::new(self.delimiter)?)
            .preserve_unknown(self.preserve_unknown);
        if let Some(fallback) = &self.fallback {
            builder = builder.fallback(fallback.clone());
        }
        if let Some(cache) = self.memory_cache_config() {
            builder = builder.cache(MemoryPlaceholderCache::new(&cache));
        }
        Ok(builder)
    }
}
