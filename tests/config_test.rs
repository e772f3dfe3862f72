//! Tests for [`ResolverConfig`]: TOML loading and resolver construction.

use std::io::Write;

use mimir::{
    CacheTtl, MimirError, PlaceholderContext, PlaceholderHandler, ResolverConfig, SubjectId,
};

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
fallback = "N/A"
delimiter = "$"

[cache]
max_entries = 500

[registry]
default_ttl_ms = 5000
"#
    )
    .unwrap();

    let config = ResolverConfig::load(file.path()).unwrap();
    assert_eq!(config.fallback.as_deref(), Some("N/A"));
    assert_eq!(config.delimiter, '$');
    assert_eq!(config.cache.max_entries, 500);
    assert_eq!(config.registry.default_ttl_ms, CacheTtl::SHORT);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ResolverConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, MimirError::Io(_)));
}

#[test]
fn resolver_built_from_config() {
    let config = ResolverConfig::from_toml_str(
        r#"
fallback = "?"
delimiter = "$"
"#,
    )
    .unwrap();

    let mut registry = config.registry();
    registry
        .register(PlaceholderHandler::exact("player", "name", |_| {
            Ok(Some("Steve".into()))
        }))
        .unwrap();
    let resolver = config.resolver_builder().unwrap().registry(registry).build();

    let ctx = PlaceholderContext::of(SubjectId::random());
    assert_eq!(
        resolver.resolve("$player_name$ / $player_level$ / %player_name%", &ctx),
        "Steve / ? / %player_name%"
    );
    assert_eq!(resolver.fallback(), Some("?"));
}

#[test]
fn preserve_unknown_from_config() {
    let config = ResolverConfig::from_toml_str("preserve_unknown = true").unwrap();
    let resolver = config
        .resolver_builder()
        .unwrap()
        .registry(config.registry())
        .build();
    assert!(resolver.preserves_unknown());
    assert_eq!(
        resolver.resolve("%missing_value%", &PlaceholderContext::empty()),
        "%missing_value%"
    );
}

#[test]
fn default_ttl_applies_to_registry() {
    let config = ResolverConfig::from_toml_str("[registry]\ndefault_ttl_ms = 0\n").unwrap();
    assert_eq!(config.registry().default_ttl(), CacheTtl::NONE);
}

#[test]
fn unknown_fields_are_ignored() {
    let config = ResolverConfig::from_toml_str("something_else = 1").unwrap();
    assert!(config.cache.enabled);
}
