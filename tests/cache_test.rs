//! Tests for [`MemoryPlaceholderCache`]: TTL-keyed placeholder storage.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mimir::CacheTtl;
use mimir::SubjectId;
use mimir::cache::{
    CacheKey, ManualClock, MemoryCacheConfig, MemoryPlaceholderCache, PlaceholderCache,
};

fn cache() -> (MemoryPlaceholderCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = MemoryPlaceholderCache::with_clock(&MemoryCacheConfig::default(), clock.clone());
    (cache, clock)
}

// =========================================================================
// TTL semantics
// =========================================================================

#[test]
fn subject_round_trip_then_expiry() {
    let (cache, clock) = cache();
    let subject = SubjectId::random();

    cache.put_subject(subject, "k", "v".into(), CacheTtl::from_secs(5));
    assert_eq!(cache.get_subject(subject, "k").as_deref(), Some("v"));

    clock.advance(Duration::from_millis(4_999));
    assert_eq!(cache.get_subject(subject, "k").as_deref(), Some("v"));

    clock.advance(Duration::from_millis(1));
    assert!(cache.get_subject(subject, "k").is_none());
}

#[test]
fn ttl_none_is_never_returned() {
    let (cache, _) = cache();
    let subject = SubjectId::random();
    cache.put_subject(subject, "k", "v".into(), CacheTtl::NONE);
    assert!(cache.get_subject(subject, "k").is_none());
    cache.put_global("g", "v".into(), CacheTtl::NONE);
    assert!(cache.get_global("g").is_none());
}

#[test]
fn miss_returns_none() {
    let (cache, _) = cache();
    assert!(cache.get_global("nothing").is_none());
    assert!(cache.is_empty());
}

// =========================================================================
// Keyspaces
// =========================================================================

#[test]
fn keyspaces_do_not_collide() {
    let (cache, _) = cache();
    let a = SubjectId::random();
    let b = SubjectId::random();

    cache.put_global("k", "global".into(), CacheTtl::MINUTE);
    cache.put_subject(a, "k", "subject".into(), CacheTtl::MINUTE);
    cache.put_relational(a, b, "k", "relational".into(), CacheTtl::MINUTE);

    assert_eq!(cache.get_global("k").as_deref(), Some("global"));
    assert_eq!(cache.get_subject(a, "k").as_deref(), Some("subject"));
    assert_eq!(cache.get_relational(a, b, "k").as_deref(), Some("relational"));
    assert!(cache.get_subject(b, "k").is_none());
    assert!(cache.get_relational(b, a, "k").is_none());
    assert_eq!(cache.len(), 3);
}

#[test]
fn overwrite_replaces_value() {
    let (cache, _) = cache();
    cache.put_global("k", "one".into(), CacheTtl::MINUTE);
    cache.put_global("k", "two".into(), CacheTtl::MINUTE);
    assert_eq!(cache.get_global("k").as_deref(), Some("two"));
}

// =========================================================================
// Invalidation
// =========================================================================

#[test]
fn invalidate_single_key() {
    let (cache, _) = cache();
    let key = CacheKey::Global("k".into());
    cache.put(key.clone(), "v".into(), CacheTtl::MINUTE);
    cache.invalidate(&key);
    assert!(cache.get(&key).is_none());
}

#[test]
fn invalidate_subject_drops_every_entry_mentioning_it() {
    let (cache, _) = cache();
    let gone = SubjectId::random();
    let stays = SubjectId::random();

    cache.put_global("server", "g".into(), CacheTtl::MINUTE);
    cache.put_subject(gone, "k", "v".into(), CacheTtl::MINUTE);
    cache.put_subject(stays, "k", "v".into(), CacheTtl::MINUTE);
    cache.put_relational(stays, gone, "r", "v".into(), CacheTtl::MINUTE);
    cache.put_relational(gone, stays, "r", "v".into(), CacheTtl::MINUTE);

    cache.invalidate_subject(gone).unwrap();

    assert!(cache.get_subject(gone, "k").is_none());
    assert!(cache.get_relational(stays, gone, "r").is_none());
    assert!(cache.get_relational(gone, stays, "r").is_none());
    assert!(cache.get_subject(stays, "k").is_some());
    assert!(cache.get_global("server").is_some());
}

#[test]
fn clear_empties_cache() {
    let (cache, _) = cache();
    cache.put_global("a", "v".into(), CacheTtl::MINUTE);
    cache.put_global("b", "v".into(), CacheTtl::MINUTE);
    cache.clear();
    assert!(cache.get_global("a").is_none());
    assert!(cache.is_empty());
}

// =========================================================================
// Wall-clock expiry
// =========================================================================

#[test]
fn system_clock_expiry() {
    let cache = MemoryPlaceholderCache::default();
    cache.put_global("k", "v".into(), CacheTtl::from_millis(20));
    assert!(cache.get_global("k").is_some());
    thread::sleep(Duration::from_millis(60));
    assert!(cache.get_global("k").is_none());
}

// =========================================================================
// Concurrency
// =========================================================================

#[test]
fn thread_safety() {
    let cache = Arc::new(MemoryPlaceholderCache::default());
    let subject = SubjectId::random();
    let mut handles = Vec::new();

    // Writers on distinct keys
    for i in 0..10 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            cache.put_subject(subject, &format!("k{i}"), format!("v{i}"), CacheTtl::MINUTE);
        }));
    }

    // Writers racing on one key
    for i in 0..10 {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            cache.put_global("shared", format!("w{i}"), CacheTtl::MINUTE);
            // Reads are either absent or a complete value.
            if let Some(v) = cache.get_global("shared") {
                assert!(v.starts_with('w'));
            }
        }));
    }

    for h in handles {
        h.join().expect("thread panicked");
    }

    for i in 0..10 {
        assert_eq!(
            cache.get_subject(subject, &format!("k{i}")),
            Some(format!("v{i}"))
        );
    }
    assert!(cache.get_global("shared").is_some());
}
