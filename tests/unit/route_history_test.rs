//! Unit tests for the RouteHistoryCache public API.
//!
//! Each test builds a cache over its own in-memory store, so tests never
//! share state. A shared `Arc` of the store lets tests inspect the raw
//! records the cache wrote.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use route_history::managers::route_history::{RouteHistoryCache, RouteHistoryTrait};
use route_history::services::clock::ManualClock;
use route_history::storage::{InMemoryStore, KeyValueStore};
use route_history::types::errors::StorageError;
use route_history::types::history::{FALLBACK_END, FALLBACK_NAME, FALLBACK_START};
use route_history::types::route::RoutePayload;
use route_history::types::settings::{HistorySettings, HISTORY_INDEX_KEY, MAX_HISTORY_ITEMS};

const START: i64 = 1_700_000_000_000;

/// Helper: a cache on a fresh store with a manual clock starting at `START`.
fn setup() -> (
    RouteHistoryCache<Arc<InMemoryStore>>,
    Arc<InMemoryStore>,
    Arc<ManualClock>,
) {
    setup_with(HistorySettings::default())
}

fn setup_with(
    settings: HistorySettings,
) -> (
    RouteHistoryCache<Arc<InMemoryStore>>,
    Arc<InMemoryStore>,
    Arc<ManualClock>,
) {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let cache = RouteHistoryCache::with_clock(store.clone(), settings, clock.clone());
    (cache, store, clock)
}

fn route(n: usize) -> RoutePayload {
    RoutePayload::new(&format!("Route {}", n), &[&format!("A{}", n), &format!("B{}", n)])
}

/// Store wrapper whose writes and deletes can be switched off.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("removes disabled".to_string()));
        }
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.inner.keys()
    }
}

// ─── add / list ───

#[test]
fn test_add_derives_display_fields() {
    let (mut cache, _, _) = setup();
    let payload = RoutePayload::new("Paris→Lyon", &["Paris", "Lyon"]);

    let id = cache.add(&payload).expect("add should succeed");

    let digits = id.strip_prefix("route_").expect("id should start with route_");
    assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

    let entries = cache.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
    assert_eq!(entries[0].name, "Paris→Lyon");
    assert_eq!(entries[0].start_location, "Paris");
    assert_eq!(entries[0].end_location, "Lyon");
    assert!(!entries[0].is_favorite);
}

#[test]
fn test_add_uses_clock_for_id_and_timestamp() {
    let (mut cache, _, _) = setup();
    let id = cache.add(&route(1)).unwrap();
    assert_eq!(id, format!("route_{}", START));
    assert_eq!(cache.list()[0].timestamp, START);
}

#[test]
fn test_add_without_label_or_locations_uses_fallbacks() {
    let (mut cache, _, _) = setup();
    let id = cache.add(&RoutePayload::default());
    assert!(id.is_some());

    let entry = &cache.list()[0];
    assert_eq!(entry.name, FALLBACK_NAME);
    assert_eq!(entry.start_location, FALLBACK_START);
    assert_eq!(entry.end_location, FALLBACK_END);
}

#[test]
fn test_list_is_newest_first() {
    let (mut cache, _, clock) = setup();
    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(cache.add(&route(n)).unwrap());
        clock.advance(10);
    }

    let listed: Vec<String> = cache.list().into_iter().map(|e| e.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[test]
fn test_same_millisecond_adds_get_distinct_ids() {
    let (mut cache, _, _) = setup();
    let a = cache.add(&route(1)).unwrap();
    let b = cache.add(&route(2)).unwrap();
    let c = cache.add(&route(3)).unwrap();

    assert_eq!(a, format!("route_{}", START));
    assert_eq!(b, format!("route_{}", START + 1));
    assert_eq!(c, format!("route_{}", START + 2));
    assert_eq!(cache.get(&a), Some(route(1)));
    assert_eq!(cache.get(&b), Some(route(2)));
}

#[test]
fn test_add_fails_softly_when_no_later_timestamp_exists() {
    let (mut cache, store, _) = setup();
    let newest = r#"[{"id":"route_9223372036854775807","timestamp":9223372036854775807,"name":"n","startLocation":"s","endLocation":"e"}]"#;
    store.set_item(HISTORY_INDEX_KEY, newest).unwrap();
    let before = cache.list();

    assert_eq!(cache.add(&route(1)), None);
    assert_eq!(cache.list(), before);
    assert_eq!(store.len(), 1);
    assert_eq!(store.get_item(HISTORY_INDEX_KEY).unwrap().as_deref(), Some(newest));
}

#[test]
fn test_list_empty_when_nothing_stored() {
    let (cache, _, _) = setup();
    assert!(cache.list().is_empty());
    assert!(cache.is_empty());
}

#[test]
fn test_list_empty_when_index_corrupt() {
    let (cache, store, _) = setup();
    store.set_item(HISTORY_INDEX_KEY, "{not json").unwrap();
    assert!(cache.list().is_empty());
}

#[test]
fn test_add_replaces_corrupt_index() {
    let (mut cache, store, _) = setup();
    store.set_item(HISTORY_INDEX_KEY, "[{\"broken\":").unwrap();

    let id = cache.add(&route(1)).unwrap();
    let entries = cache.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, id);
}

#[test]
fn test_index_persisted_in_camel_case() {
    let (mut cache, store, _) = setup();
    cache.add(&RoutePayload::new("Nantes→Rennes", &["Nantes", "Rennes"])).unwrap();

    let raw = store.get_item(HISTORY_INDEX_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value[0];
    assert_eq!(entry["startLocation"], "Nantes");
    assert_eq!(entry["endLocation"], "Rennes");
    assert_eq!(entry["isFavorite"], false);
    assert_eq!(entry["timestamp"], START);
}

#[test]
fn test_index_without_favorite_flag_reads_as_not_favorite() {
    let (cache, store, _) = setup();
    store
        .set_item(
            HISTORY_INDEX_KEY,
            r#"[{"id":"route_1","timestamp":1,"name":"n","startLocation":"s","endLocation":"e"}]"#,
        )
        .unwrap();

    let entries = cache.list();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_favorite);
}

// ─── capacity ───

#[test]
fn test_capacity_evicts_oldest_and_purges_its_route() {
    let (mut cache, store, clock) = setup();
    let mut ids = Vec::new();
    for n in 0..MAX_HISTORY_ITEMS {
        ids.push(cache.add(&route(n)).unwrap());
        clock.advance(1);
    }
    assert_eq!(cache.len(), MAX_HISTORY_ITEMS);

    let newest = cache.add(&route(99)).unwrap();
    let entries = cache.list();
    assert_eq!(entries.len(), MAX_HISTORY_ITEMS);
    assert_eq!(entries[0].id, newest);
    assert!(entries.iter().all(|e| e.id != ids[0]));
    assert!(entries.iter().any(|e| e.id == ids[1]));

    assert_eq!(cache.get(&ids[0]), None);
    assert_eq!(store.get_item(&ids[0]).unwrap(), None);
    // index + one record per entry
    assert_eq!(store.len(), MAX_HISTORY_ITEMS + 1);
}

#[test]
fn test_legacy_eviction_leaves_orphans_until_pruned() {
    let settings = HistorySettings {
        max_items: 3,
        purge_evicted_blobs: false,
        ..HistorySettings::default()
    };
    let (mut cache, store, clock) = setup_with(settings);
    let mut ids = Vec::new();
    for n in 0..5 {
        ids.push(cache.add(&route(n)).unwrap());
        clock.advance(1);
    }

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.get(&ids[0]), Some(route(0)));
    assert_eq!(cache.get(&ids[1]), Some(route(1)));

    assert_eq!(cache.prune_orphans(), 2);
    assert_eq!(cache.get(&ids[0]), None);
    assert_eq!(cache.get(&ids[1]), None);
    assert_eq!(cache.get(&ids[4]), Some(route(4)));
    assert_eq!(store.len(), 4);
    assert_eq!(cache.prune_orphans(), 0);
}

#[test]
fn test_prune_keeps_unrelated_keys() {
    let (mut cache, store, _) = setup();
    cache.add(&route(1)).unwrap();
    store.set_item("route_", "x").unwrap();
    store.set_item("route_abc", "x").unwrap();
    store.set_item("auth_token", "x").unwrap();
    store.set_item("route_42", "{}").unwrap();

    assert_eq!(cache.prune_orphans(), 1);
    assert!(store.get_item("route_42").unwrap().is_none());
    assert!(store.get_item("route_abc").unwrap().is_some());
    assert!(store.get_item("auth_token").unwrap().is_some());
    assert!(store.get_item(HISTORY_INDEX_KEY).unwrap().is_some());
}

#[test]
fn test_shrinking_capacity_applies_on_next_add() {
    let (mut cache, _, clock) = setup();
    for n in 0..6 {
        cache.add(&route(n)).unwrap();
        clock.advance(1);
    }
    cache.set_settings(HistorySettings {
        max_items: 2,
        ..HistorySettings::default()
    });
    assert_eq!(cache.len(), 6);

    cache.add(&route(6)).unwrap();
    let names: Vec<String> = cache.list().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["Route 6", "Route 5"]);
}

// ─── get ───

#[test]
fn test_get_returns_stored_payload() {
    let (mut cache, _, _) = setup();
    let payload = RoutePayload::new("Lille→Metz", &["Lille", "Reims", "Metz"]);
    let id = cache.add(&payload).unwrap();
    assert_eq!(cache.get(&id), Some(payload));
}

#[test]
fn test_get_missing_and_corrupt() {
    let (cache, store, _) = setup();
    assert_eq!(cache.get("route_1"), None);

    store.set_item("route_2", "not json").unwrap();
    assert_eq!(cache.get("route_2"), None);
}

#[test]
fn test_get_entry() {
    let (mut cache, _, _) = setup();
    let id = cache.add(&route(7)).unwrap();
    assert_eq!(cache.get_entry(&id).map(|e| e.name), Some("Route 7".to_string()));
    assert_eq!(cache.get_entry("route_0"), None);
}

// ─── remove ───

#[test]
fn test_remove_existing_entry() {
    let (mut cache, store, clock) = setup();
    let a = cache.add(&route(1)).unwrap();
    clock.advance(5);
    let b = cache.add(&route(2)).unwrap();

    assert!(cache.remove(&a));
    let entries = cache.list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, b);
    assert_eq!(store.get_item(&a).unwrap(), None);
}

#[test]
fn test_remove_unknown_id_changes_nothing() {
    let (mut cache, store, _) = setup();
    cache.add(&route(1)).unwrap();
    store.set_item("route_5", "{}").unwrap();
    let before = cache.list();

    assert!(!cache.remove("route_5"));
    assert_eq!(cache.list(), before);
    // Not indexed, so its record is left alone.
    assert!(store.get_item("route_5").unwrap().is_some());
}

#[test]
fn test_remove_succeeds_when_record_already_gone() {
    let (mut cache, store, _) = setup();
    let id = cache.add(&route(1)).unwrap();
    store.remove_item(&id).unwrap();

    assert!(cache.remove(&id));
    assert!(cache.list().is_empty());
}

// ─── favorites ───

#[test]
fn test_toggle_favorite_twice_restores_flag() {
    let (mut cache, _, _) = setup();
    let id = cache.add(&route(1)).unwrap();

    assert!(cache.toggle_favorite(&id));
    assert!(cache.list()[0].is_favorite);
    assert!(cache.toggle_favorite(&id));
    assert!(!cache.list()[0].is_favorite);
}

#[test]
fn test_toggle_favorite_unknown_id() {
    let (mut cache, store, _) = setup();
    cache.add(&route(1)).unwrap();
    let before = store.get_item(HISTORY_INDEX_KEY).unwrap();

    assert!(!cache.toggle_favorite("route_404"));
    assert_eq!(store.get_item(HISTORY_INDEX_KEY).unwrap(), before);
}

#[test]
fn test_list_favorites_preserves_order() {
    let (mut cache, _, clock) = setup();
    let mut ids = Vec::new();
    for n in 0..4 {
        ids.push(cache.add(&route(n)).unwrap());
        clock.advance(1);
    }
    cache.toggle_favorite(&ids[0]);
    cache.toggle_favorite(&ids[2]);

    let favorites: Vec<String> = cache.list_favorites().into_iter().map(|e| e.id).collect();
    assert_eq!(favorites, vec![ids[2].clone(), ids[0].clone()]);
}

#[test]
fn test_favorite_survives_later_adds() {
    let (mut cache, _, clock) = setup();
    let id = cache.add(&route(1)).unwrap();
    cache.toggle_favorite(&id);
    clock.advance(1);
    cache.add(&route(2)).unwrap();

    assert_eq!(cache.get_entry(&id).map(|e| e.is_favorite), Some(true));
}

// ─── clear ───

#[test]
fn test_clear_removes_everything() {
    let (mut cache, store, clock) = setup();
    let mut ids = Vec::new();
    for n in 0..3 {
        ids.push(cache.add(&route(n)).unwrap());
        clock.advance(1);
    }
    store.set_item("unrelated", "keep").unwrap();

    assert!(cache.clear());
    assert!(cache.list().is_empty());
    for id in &ids {
        assert_eq!(cache.get(id), None);
    }
    assert_eq!(store.get_item(HISTORY_INDEX_KEY).unwrap(), None);
    assert_eq!(store.get_item("unrelated").unwrap().as_deref(), Some("keep"));
}

#[test]
fn test_clear_on_empty_history() {
    let (mut cache, _, _) = setup();
    assert!(cache.clear());
}

// ─── storage failures ───

#[test]
fn test_add_fails_softly_when_quota_exceeded() {
    let store = Arc::new(InMemoryStore::with_quota(64));
    let mut cache = RouteHistoryCache::new(store.clone());

    let big = RoutePayload::new(&"x".repeat(200), &["A", "B"]);
    assert_eq!(cache.add(&big), None);
    assert!(cache.list().is_empty());
    assert!(store.is_empty());
}

#[test]
fn test_add_rolls_back_route_when_index_write_fails() {
    // The route record fits, the index written after it does not.
    let payload = RoutePayload::default();
    let route_bytes = "route_1700000000000".len() + "{}".len();
    let store = Arc::new(InMemoryStore::with_quota(route_bytes + 10));
    let clock = Arc::new(ManualClock::new(START));
    let mut cache = RouteHistoryCache::with_clock(store.clone(), HistorySettings::default(), clock);

    assert_eq!(cache.add(&payload), None);
    assert!(store.is_empty());
}

#[test]
fn test_operations_degrade_when_writes_fail() {
    let store = Arc::new(FlakyStore::default());
    let clock = Arc::new(ManualClock::new(START));
    let mut cache = RouteHistoryCache::with_clock(store.clone(), HistorySettings::default(), clock);
    let id = cache.add(&route(1)).unwrap();

    store.fail_writes.store(true, Ordering::SeqCst);
    assert_eq!(cache.add(&route(2)), None);
    assert!(!cache.toggle_favorite(&id));
    assert!(!cache.remove(&id));

    // Reads still work and nothing changed.
    let entries = cache.list();
    assert_eq!(entries.len(), 1);
    assert!(!entries[0].is_favorite);
    assert_eq!(cache.get(&id), Some(route(1)));
}

#[test]
fn test_clear_reports_failure_when_removes_fail() {
    let store = Arc::new(FlakyStore::default());
    let mut cache = RouteHistoryCache::new(store.clone());
    cache.add(&route(1)).unwrap();

    store.fail_removes.store(true, Ordering::SeqCst);
    assert!(!cache.clear());
    assert_eq!(cache.prune_orphans(), 0);

    store.fail_removes.store(false, Ordering::SeqCst);
    assert!(cache.clear());
    assert!(cache.list().is_empty());
}

#[test]
fn test_remove_reports_true_when_only_record_delete_fails() {
    let store = Arc::new(FlakyStore::default());
    let mut cache = RouteHistoryCache::new(store.clone());
    let id = cache.add(&route(1)).unwrap();

    store.fail_removes.store(true, Ordering::SeqCst);
    assert!(cache.remove(&id));
    assert!(cache.list().is_empty());
    assert!(store.get_item(&id).unwrap().is_some());
}

// ─── sharing a store ───

#[test]
fn test_two_caches_on_one_store_see_each_other() {
    let store = Arc::new(InMemoryStore::new());
    let mut first = RouteHistoryCache::new(store.clone());
    let second = RouteHistoryCache::new(store.clone());

    let id = first.add(&route(1)).unwrap();
    assert_eq!(second.get_entry(&id).map(|e| e.name), Some("Route 1".to_string()));
}

#[test]
fn test_custom_index_key() {
    let settings = HistorySettings {
        index_key: "trips".to_string(),
        ..HistorySettings::default()
    };
    let (mut cache, store, _) = setup_with(settings);
    cache.add(&route(1)).unwrap();

    assert!(store.get_item("trips").unwrap().is_some());
    assert!(store.get_item(HISTORY_INDEX_KEY).unwrap().is_none());
}
