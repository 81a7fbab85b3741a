//! GPU texture cache with LRU eviction
//!
//! Keeps rendered image textures resident in VRAM up to a byte budget. When an
//! insert or a capacity change pushes usage over the budget, the least
//! recently used textures are evicted and listeners are notified.

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::TextureCacheConfig;
use crate::error::TextureCacheError;
use crate::events::{CacheEvent, NoopNotifier, Notifier};
use crate::eviction::evict_to_fit;
use crate::stats::{CacheMetrics, CacheStats};
use crate::store::TextureStore;
use crate::texture::{GpuTexture, TextureRef};

/// GPU texture cache with LRU eviction
///
/// Thread-safe VRAM cache keyed by image id. All bookkeeping sits behind one
/// mutex that is held for the whole of each call, and notifications are sent
/// only after it has been released.
///
/// Share it between render surfaces by wrapping it in an `Arc`.
///
/// # Example
///
/// ```
/// use radview_cache::{GpuTexture, TextureCache};
///
/// // 256 MB budget
/// let cache = TextureCache::new(256 * 1024 * 1024);
///
/// // let handle = upload_texture(...);
/// let handle = 42u32;
/// cache.insert("wadouri:ct/1.dcm", GpuTexture::new(handle, 512 * 512 * 4)).unwrap();
///
/// if let Some(texture) = cache.get("wadouri:ct/1.dcm").unwrap() {
///     assert_eq!(texture.handle::<u32>(), Some(&42));
/// }
///
/// let stats = cache.stats();
/// println!("VRAM used: {} / {} bytes", stats.total_bytes, stats.capacity_bytes);
/// ```
pub struct TextureCache {
    store: Mutex<TextureStore>,
    notifier: Arc<dyn Notifier>,
}

impl TextureCache {
    /// Create a cache with the given VRAM budget and no listeners
    pub fn new(capacity_bytes: u64) -> Self {
        Self::with_notifier(capacity_bytes, Arc::new(NoopNotifier))
    }

    /// Create a cache that reports evictions to `notifier`
    pub fn with_notifier(capacity_bytes: u64, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store: Mutex::new(TextureStore::new(capacity_bytes)),
            notifier,
        }
    }

    /// Create a cache from a loaded configuration
    pub fn from_config(config: &TextureCacheConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_notifier(config.capacity_bytes, notifier)
    }

    /// Store a texture under `image_id`
    ///
    /// Fails with [`TextureCacheError::InvalidArgument`] for an empty id or a
    /// size that would overflow the byte total, and with
    /// [`TextureCacheError::DuplicateKey`] if the id is already cached; the
    /// rejected texture is dropped and the cache is left unchanged.
    ///
    /// On success, least recently used textures (possibly including this one,
    /// if it alone exceeds the budget) are evicted until usage fits.
    pub fn insert(
        &self,
        image_id: impl Into<String>,
        texture: GpuTexture,
    ) -> Result<(), TextureCacheError> {
        let image_id = image_id.into();
        validate_image_id(&image_id)?;

        let events = {
            let mut store = self.store.lock();
            let size_in_bytes = texture.size_in_bytes();
            store.insert(image_id.clone(), texture)?;
            if size_in_bytes > store.capacity_bytes() {
                warn!(
                    image_id = %image_id,
                    size_in_bytes,
                    capacity_bytes = store.capacity_bytes(),
                    "texture larger than the whole cache"
                );
            }
            evict_to_fit(&mut store)
        };

        self.dispatch(events);
        Ok(())
    }

    /// Retrieve a texture and mark it as most recently used
    ///
    /// A miss is `Ok(None)`, not an error. The returned [`TextureRef`] holds
    /// the cache lock until dropped.
    pub fn get(&self, image_id: &str) -> Result<Option<TextureRef<'_>>, TextureCacheError> {
        validate_image_id(image_id)?;

        let store = self.store.lock();
        match MutexGuard::try_map(store, |store| store.touch(image_id)) {
            Ok(guard) => Ok(Some(TextureRef { guard })),
            Err(mut store) => {
                store.metrics.misses += 1;
                Ok(None)
            }
        }
    }

    /// Remove a texture and hand it back to the caller
    ///
    /// Fails with [`TextureCacheError::NotFound`] if nothing is cached under
    /// `image_id`. No notification is sent for explicit removals.
    pub fn remove(&self, image_id: &str) -> Result<GpuTexture, TextureCacheError> {
        validate_image_id(image_id)?;

        let mut store = self.store.lock();
        let entry = store
            .remove(image_id)
            .ok_or_else(|| TextureCacheError::NotFound(image_id.to_string()))?;
        Ok(entry.texture)
    }

    /// Drop every cached texture
    pub fn purge_all(&self) {
        let mut store = self.store.lock();
        debug!(count = store.len(), "purging texture cache");
        store.clear();
    }

    /// Update the VRAM budget
    ///
    /// If the new budget is smaller than current usage, textures are evicted
    /// until usage fits.
    pub fn set_capacity(&self, capacity_bytes: u64) {
        let events = {
            let mut store = self.store.lock();
            debug!(
                from = store.capacity_bytes(),
                to = capacity_bytes,
                "texture cache capacity changed"
            );
            store.set_capacity_bytes(capacity_bytes);
            evict_to_fit(&mut store)
        };

        self.dispatch(events);
    }

    /// Snapshot of the byte budget and entry count
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Hit, miss and eviction counters since creation
    pub fn metrics(&self) -> CacheMetrics {
        self.store.lock().metrics
    }

    /// Check if a texture is cached without updating its recency
    pub fn contains(&self, image_id: &str) -> bool {
        self.store.lock().contains(image_id)
    }

    /// Cached image ids, most recently used first
    pub fn image_ids(&self) -> Vec<String> {
        self.store.lock().ids_by_recency()
    }

    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current VRAM budget in bytes
    pub fn capacity(&self) -> u64 {
        self.store.lock().capacity_bytes()
    }

    /// Current VRAM usage in bytes
    pub fn total_bytes(&self) -> u64 {
        self.store.lock().total_bytes()
    }

    fn dispatch(&self, events: Vec<CacheEvent>) {
        for event in &events {
            self.notifier.notify(event);
        }
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        self.store.lock().assert_consistent();
    }
}

impl Default for TextureCache {
    /// Create a cache with the default 256 MB budget
    fn default() -> Self {
        Self::from_config(&TextureCacheConfig::default(), Arc::new(NoopNotifier))
    }
}

fn validate_image_id(image_id: &str) -> Result<(), TextureCacheError> {
    if image_id.trim().is_empty() {
        return Err(TextureCacheError::InvalidArgument(
            "image id must not be empty".to_string(),
        ));
    }
    Ok(())
}
