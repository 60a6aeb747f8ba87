//! Integration Tests for the Bounded TTL Cache
//!
//! Exercises the public surface end to end: TTL, eviction tracking,
//! freeze-dry persistence and the archiver.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use cache_cow::cache::{BoundedStore, EvictionListener, ExpiringEntry, LruStore};
use parking_lot::Mutex;
use cache_cow::{
    BoundedTtlCache, CacheArchiver, CacheConfig, CacheError, CacheLocation, Caching, FreezeDried,
    ManualClock,
};

// == Helper Functions ==

const LIFETIME: Duration = Duration::from_secs(60);

fn create_test_cache() -> (BoundedTtlCache<String, String>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = BoundedTtlCache::new(clock.clone(), Some(LIFETIME), 0);
    (cache, clock)
}

fn insert_some_entries(cache: &impl Caching<Key = String, Value = String>) -> HashSet<String> {
    (0..15)
        .map(|i| {
            cache.insert(i.to_string(), format!("{}", i * 7 - 50));
            i.to_string()
        })
        .collect()
}

// == TTL Tests ==

#[test]
fn test_ttl_boundary_is_inclusive() {
    let (cache, clock) = create_test_cache();
    cache.insert("any".to_string(), "hello".to_string());

    clock.advance(LIFETIME - Duration::from_secs(1));
    assert_eq!(cache.value(&"any".to_string()), Some("hello".to_string()));

    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.value(&"any".to_string()), None);
    assert!(cache.keys().is_empty());
}

#[test]
fn test_remove_and_clear_through_trait() {
    let (cache, _) = create_test_cache();
    let keys = insert_some_entries(&cache);
    assert_eq!(cache.keys(), keys);

    Caching::remove_value(&cache, &"3".to_string());
    assert_eq!(cache.value(&"3".to_string()), None);
    assert!(!cache.keys().contains("3"));

    Caching::clear(&cache);
    assert!(Caching::is_empty(&cache));
    assert_eq!(cache.value(&"4".to_string()), None);
}

#[test]
fn test_from_config() {
    let config = CacheConfig::default()
        .with_entry_lifetime(Duration::from_secs(30))
        .with_count_limit(4);
    let cache: BoundedTtlCache<u32, u32> = BoundedTtlCache::from_config(&config);

    for i in 0..10 {
        cache.insert(i, i * i);
    }

    assert_eq!(cache.count_limit(), 4);
    assert_eq!(cache.entry_lifetime(), Some(Duration::from_secs(30)));
    assert_eq!(cache.keys(), HashSet::from([6, 7, 8, 9]));
    assert_eq!(cache.stats().evictions, 6);
}

// == Eviction Notification Tests ==

type Entry = ExpiringEntry<String, u8>;
type ListenerSlot = Arc<Mutex<Option<Arc<dyn EvictionListener<Entry>>>>>;

/// Store that keeps a copy of every entry it is given and shares its eviction
/// listener, so a test can deliver notifications from outside the cache.
struct RecordingStore {
    inner: LruStore<String, Entry>,
    history: Arc<Mutex<Vec<Entry>>>,
    listener: ListenerSlot,
}

impl RecordingStore {
    fn new() -> (Self, Arc<Mutex<Vec<Entry>>>, ListenerSlot) {
        let history = Arc::new(Mutex::new(Vec::new()));
        let listener: ListenerSlot = Arc::new(Mutex::new(None));
        let store = Self {
            inner: LruStore::new(0),
            history: Arc::clone(&history),
            listener: Arc::clone(&listener),
        };
        (store, history, listener)
    }
}

impl BoundedStore<String, Entry> for RecordingStore {
    fn set(&mut self, key: String, value: Entry) {
        self.history.lock().push(value.clone());
        self.inner.set(key, value)
    }

    fn get(&mut self, key: &String) -> Option<&Entry> {
        self.inner.get(key)
    }

    fn peek(&self, key: &String) -> Option<&Entry> {
        self.inner.peek(key)
    }

    fn remove(&mut self, key: &String) -> Option<Entry> {
        self.inner.remove(key)
    }

    fn remove_all(&mut self) {
        self.inner.remove_all()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn count_limit(&self) -> usize {
        self.inner.count_limit()
    }

    fn set_eviction_listener(&mut self, listener: Arc<dyn EvictionListener<Entry>>) {
        *self.listener.lock() = Some(listener);
    }
}

fn notify(slot: &ListenerSlot, entry: &Entry) {
    let listener = slot.lock().clone();
    if let Some(listener) = listener {
        listener.on_evicted(entry);
    }
}

#[test]
fn test_late_eviction_notice_keeps_reinserted_key() {
    let (store, history, listener) = RecordingStore::new();
    let cache = BoundedTtlCache::with_store(store, Arc::new(ManualClock::default()), None);

    cache.insert("x".to_string(), 1);
    cache.insert("x".to_string(), 2);
    let first = history.lock()[0].clone();

    notify(&listener, &first);

    assert_eq!(cache.value(&"x".to_string()), Some(2));
    assert_eq!(cache.keys(), HashSet::from(["x".to_string()]));
    assert_eq!(cache.count(), 1);
}

#[test]
fn test_eviction_notices_race_with_reinsert() {
    let (store, history, listener) = RecordingStore::new();
    let cache = Arc::new(BoundedTtlCache::with_store(
        store,
        Arc::new(ManualClock::default()),
        None,
    ));
    for i in 0..100u8 {
        cache.insert(format!("k{}", i), i);
    }
    let originals: Vec<Entry> = history.lock().clone();

    let notifier = std::thread::spawn(move || {
        for entry in &originals {
            notify(&listener, entry);
        }
    });
    let inserter = {
        let cache = Arc::clone(&cache);
        std::thread::spawn(move || {
            for i in 0..100u8 {
                cache.insert(format!("k{}", i), i.wrapping_add(100));
            }
        })
    };
    notifier.join().unwrap();
    inserter.join().unwrap();

    assert_eq!(cache.count(), 100);
    for i in 0..100u8 {
        assert_eq!(cache.value(&format!("k{}", i)), Some(i.wrapping_add(100)));
    }
    assert!(cache.stats().evictions <= 100);
}

// == Persistence Tests ==

#[test]
fn test_freeze_dry_file_round_trip() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let location = CacheLocation::at(dir.path());
    let (cache, clock) = create_test_cache();
    insert_some_entries(&cache);

    cache.freeze_dry().save_to_file("people", None, &location)?;
    let snapshot = FreezeDried::<String, String>::read_from_file("people", None, &location)?;
    let thawed = BoundedTtlCache::reconstruct(snapshot, clock, Some(LIFETIME), 0);

    assert_eq!(thawed.keys(), cache.keys());
    for key in thawed.keys() {
        assert_eq!(thawed.value(&key), cache.value(&key));
    }
    Ok(())
}

#[test]
fn test_read_from_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let location = CacheLocation::at(dir.path());

    let result = FreezeDried::<String, String>::read_from_file("nobody", Some("group"), &location);
    assert!(matches!(result, Err(CacheError::FileNotFound(_))));
}

#[tokio::test]
async fn test_archiver_saves_and_loads() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let archiver = CacheArchiver::new("archived", Some("team".to_string()))
        .with_location(CacheLocation::at(dir.path()));
    let (cache, _) = create_test_cache();
    insert_some_entries(&cache);

    let path = archiver.save(&cache).await?;
    assert_eq!(path, dir.path().join("team").join("archived.cache"));

    let config = CacheConfig::default().with_count_limit(100);
    let loaded: BoundedTtlCache<String, String> = archiver.load_with_config(&config).await?;
    assert_eq!(loaded.count_limit(), 100);
    assert_eq!(loaded.freeze_dry(), cache.freeze_dry());
    Ok(())
}
