//! Tests for [`PlaceholderResolver::resolve_async`]: concurrent fan-out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use mimir::cache::{MemoryPlaceholderCache, PlaceholderCache};
use mimir::{
    ExpansionRegistry, MimirError, PlaceholderContext, PlaceholderHandler, PlaceholderResolver,
    SubjectId,
};

/// Handler that sleeps before answering, to shuffle completion order.
fn slow(expansion: &str, id: &str, value: &'static str, delay_ms: u64) -> PlaceholderHandler {
    PlaceholderHandler::exact(expansion, id, move |_| {
        thread::sleep(Duration::from_millis(delay_ms));
        Ok(Some(value.to_owned()))
    })
}

fn resolver() -> PlaceholderResolver {
    let mut registry = ExpansionRegistry::new();
    registry.register(slow("a", "x", "first, and long", 40)).unwrap();
    registry.register(slow("b", "x", "2", 5)).unwrap();
    registry.register(slow("c", "x", "third", 20)).unwrap();
    registry
        .register(slow("rel", "x", "pair", 1).relational())
        .unwrap();
    registry
        .register(PlaceholderHandler::exact("bad", "x", |_| {
            Err(MimirError::handler("nope"))
        }))
        .unwrap();
    PlaceholderResolver::builder()
        .registry(registry)
        .fallback("?")
        .build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_matches_sync_output() {
    let resolver = resolver();
    let ctx = PlaceholderContext::relational(SubjectId::random(), SubjectId::random());
    let text = "<%a_x%|%b_x%|%c_x%|%rel_rel_x%|%bad_x%|%missing_x%|%a_x%> 100%";

    let sync = resolver.resolve(text, &ctx).into_owned();
    let async_out = resolver.resolve_async(text, &ctx).await.into_owned();

    assert_eq!(sync, async_out);
    assert_eq!(sync, "<first, and long|2|third|pair|?|?|first, and long> 100%");
}

#[tokio::test]
async fn async_without_tokens_returns_input() {
    let resolver = resolver();
    let out = resolver
        .resolve_async("plain text", &PlaceholderContext::empty())
        .await;
    assert_eq!(out, "plain text");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn async_resolves_tokens_concurrently() {
    let mut registry = ExpansionRegistry::new();
    for id in ["a", "b", "c", "d"] {
        registry.register(slow("slow", id, "v", 200)).unwrap();
    }
    let resolver = PlaceholderResolver::builder().registry(registry).build();

    let start = Instant::now();
    let out = resolver
        .resolve_async(
            "%slow_a% %slow_b% %slow_c% %slow_d%",
            &PlaceholderContext::empty(),
        )
        .await;
    assert_eq!(out, "v v v v");
    // Sequential resolution would take at least 800ms.
    assert!(start.elapsed() < Duration::from_millis(700));
}

#[tokio::test]
async fn async_deduplicates_repeated_tokens() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut registry = ExpansionRegistry::new();
    registry
        .register(PlaceholderHandler::exact("a", "b", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Some("v".into()))
        }))
        .unwrap();
    let resolver = PlaceholderResolver::builder().registry(registry).build();

    let out = resolver
        .resolve_async("%a_b%%a_b%%a_b%", &PlaceholderContext::empty())
        .await;
    assert_eq!(out, "vvv");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn async_uses_custom_resolvers_and_cache() {
    let mut registry = ExpansionRegistry::new();
    registry
        .register(PlaceholderHandler::exact("player", "name", |_| {
            Ok(Some("Steve".into()))
        }))
        .unwrap();
    let cache = Arc::new(MemoryPlaceholderCache::default());
    let resolver = PlaceholderResolver::builder()
        .registry(registry)
        .shared_cache(cache.clone())
        .build();
    resolver.register_custom_resolver("menu", |_, id| Ok(Some(id.to_uppercase())));

    let subject = SubjectId::random();
    let out = resolver
        .resolve_async("%menu_title% %player_name%", &PlaceholderContext::of(subject))
        .await;
    assert_eq!(out, "TITLE Steve");

    assert_eq!(cache.get_subject(subject, "player_name").as_deref(), Some("Steve"));
    assert!(cache.get_subject(subject, "menu_title").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_async_calls_share_one_resolver() {
    let resolver = resolver();
    let mut handles = Vec::new();
    for _ in 0..16 {
        let resolver = resolver.clone();
        handles.push(tokio::spawn(async move {
            let ctx = PlaceholderContext::of(SubjectId::random());
            resolver
                .resolve_async("%b_x%-%c_x%", &ctx)
                .await
                .into_owned()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), "2-third");
    }
}
