use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use radview_cache::events::{TEXTURE_CACHE_FULL, TEXTURE_EVICTED};
use radview_cache::{CacheStats, EventDispatcher, GpuTexture, TextureCache, TextureCacheError};
use serde_json::{json, Value};

/// Records `(event name, payload)` pairs delivered through a dispatcher.
fn recording_dispatcher() -> (Arc<EventDispatcher>, Arc<Mutex<Vec<(String, Value)>>>) {
    let dispatcher = Arc::new(EventDispatcher::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in [TEXTURE_EVICTED, TEXTURE_CACHE_FULL] {
        let log = Arc::clone(&log);
        dispatcher.add_event_listener(name, move |event| {
            log.lock().push((event.name().to_string(), event.payload()));
        });
    }

    (dispatcher, log)
}

fn texture(size: u64) -> GpuTexture {
    GpuTexture::new(size, size)
}

#[test]
fn eviction_scenario_emits_listener_payloads() {
    let (dispatcher, log) = recording_dispatcher();
    let cache = TextureCache::with_notifier(100, dispatcher);

    cache.insert("img1", texture(60)).unwrap();
    cache.insert("img2", texture(50)).unwrap();

    assert_eq!(cache.image_ids(), vec!["img2"]);
    assert_eq!(
        cache.stats(),
        CacheStats {
            capacity_bytes: 100,
            total_bytes: 50,
            count: 1
        }
    );
    assert_eq!(
        *log.lock(),
        vec![
            ("texture-evicted".to_string(), json!({ "imageId": "img1" })),
            (
                "texture-cache-full".to_string(),
                json!({ "capacityBytes": 100, "totalBytes": 50, "count": 1 })
            ),
        ]
    );
}

#[test]
fn recently_read_texture_survives_capacity_reduction() {
    let (dispatcher, log) = recording_dispatcher();
    let cache = TextureCache::with_notifier(300, dispatcher);

    cache.insert("A", texture(100)).unwrap();
    cache.insert("B", texture(100)).unwrap();
    cache.insert("C", texture(100)).unwrap();
    assert!(cache.get("A").unwrap().is_some());

    cache.set_capacity(250);

    assert!(cache.contains("A"));
    assert!(!cache.contains("B"));
    assert!(cache.contains("C"));

    let log = log.lock();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].1, json!({ "imageId": "B" }));
}

#[test]
fn remove_missing_on_empty_cache_fails() {
    let cache = TextureCache::new(100);
    assert_eq!(
        cache.remove("missing").unwrap_err(),
        TextureCacheError::NotFound("missing".to_string())
    );
}

#[test]
fn duplicate_insert_keeps_first_texture() {
    let cache = TextureCache::new(1000);
    cache.insert("img", GpuTexture::new("first", 10)).unwrap();

    assert_eq!(
        cache.insert("img", GpuTexture::new("second", 20)),
        Err(TextureCacheError::DuplicateKey("img".to_string()))
    );

    let texture = cache.get("img").unwrap().unwrap();
    assert_eq!(texture.handle::<&str>(), Some(&"first"));
    assert_eq!(texture.size_in_bytes(), 10);
}

#[test]
fn cache_is_shareable_across_threads() {
    let cache = Arc::new(TextureCache::new(64 * 100));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..200 {
                    let id = format!("t{t}-img{i}");
                    cache.insert(id.as_str(), texture(64)).unwrap();
                    let _ = cache.get(&id).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.count, 100);
    assert_eq!(stats.total_bytes, 64 * 100);
}

/// Reference LRU model: most recently used id at the back.
#[derive(Default)]
struct Model {
    sizes: HashMap<String, u64>,
    recency: Vec<String>,
    capacity: u64,
}

impl Model {
    fn total(&self) -> u64 {
        self.sizes.values().sum()
    }

    fn bump(&mut self, id: &str) {
        self.recency.retain(|other| other != id);
        self.recency.push(id.to_string());
    }

    fn evict(&mut self) -> Vec<String> {
        let mut evicted = Vec::new();
        while self.total() > self.capacity {
            let id = self.recency.remove(0);
            self.sizes.remove(&id);
            evicted.push(id);
        }
        evicted
    }
}

#[test]
fn random_operations_match_lru_model() {
    let mut rng = StdRng::seed_from_u64(0x7e57);
    let (dispatcher, log) = recording_dispatcher();
    let cache = TextureCache::with_notifier(400, dispatcher);
    let mut model = Model {
        capacity: 400,
        ..Model::default()
    };

    for _ in 0..2_000 {
        let id = format!("img{}", rng.gen_range(0..24));
        let mut expected_evictions = Vec::new();

        match rng.gen_range(0..10) {
            0..=3 => {
                let size = rng.gen_range(1..=120);
                let result = cache.insert(id.as_str(), texture(size));
                if model.sizes.contains_key(&id) {
                    assert_eq!(result, Err(TextureCacheError::DuplicateKey(id.clone())));
                } else {
                    result.unwrap();
                    model.sizes.insert(id.clone(), size);
                    model.bump(&id);
                    expected_evictions = model.evict();
                }
            }
            4..=6 => {
                let hit = cache.get(&id).unwrap().map(|t| t.size_in_bytes());
                assert_eq!(hit, model.sizes.get(&id).copied());
                if hit.is_some() {
                    model.bump(&id);
                }
            }
            7 => match cache.remove(&id) {
                Ok(removed) => {
                    assert_eq!(Some(removed.size_in_bytes()), model.sizes.remove(&id));
                    model.recency.retain(|other| other != &id);
                }
                Err(err) => {
                    assert_eq!(err, TextureCacheError::NotFound(id.clone()));
                    assert!(!model.sizes.contains_key(&id));
                }
            },
            8 => {
                let capacity = rng.gen_range(0..=600);
                cache.set_capacity(capacity);
                model.capacity = capacity;
                expected_evictions = model.evict();
            }
            _ => {
                if rng.gen_bool(0.1) {
                    cache.purge_all();
                    model.sizes.clear();
                    model.recency.clear();
                }
            }
        }

        let events: Vec<(String, Value)> = log.lock().drain(..).collect();
        let evicted: Vec<String> = events
            .iter()
            .filter(|(name, _)| name == TEXTURE_EVICTED)
            .map(|(_, payload)| payload["imageId"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(evicted, expected_evictions);

        let full_count = events.iter().filter(|(name, _)| name == TEXTURE_CACHE_FULL).count();
        assert_eq!(full_count, usize::from(!expected_evictions.is_empty()));

        let stats = cache.stats();
        assert_eq!(stats.count, model.sizes.len());
        assert_eq!(stats.total_bytes, model.total());
        assert!(stats.total_bytes <= stats.capacity_bytes);

        let mut most_recent_first = model.recency.clone();
        most_recent_first.reverse();
        assert_eq!(cache.image_ids(), most_recent_first);
    }
}
