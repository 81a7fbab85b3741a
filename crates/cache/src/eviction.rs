//! Least-recently-used eviction under a byte budget.

use tracing::{debug, info};

use crate::events::CacheEvent;
use crate::store::TextureStore;

/// Evict textures until usage is back within capacity
///
/// Does nothing unless the store is strictly over budget. Otherwise the
/// entries are ordered most recently used first and popped from the tail
/// until usage fits, which may leave the store empty when a single texture is
/// larger than the whole budget.
///
/// Returns the notifications for the pass: one `TextureEvicted` per removed
/// entry in eviction order, then a single `TextureCacheFull` carrying the
/// post-purge stats. The caller delivers them once the store lock is released.
pub(crate) fn evict_to_fit(store: &mut TextureStore) -> Vec<CacheEvent> {
    if !store.is_over_budget() {
        return Vec::new();
    }

    store.sort_by_recency();

    let mut events = Vec::new();
    // Every iteration removes one entry, so zero-byte textures cannot stall this.
    while store.is_over_budget() {
        let Some(entry) = store.pop_least_recent() else {
            break;
        };
        debug!(
            image_id = %entry.image_id,
            size_in_bytes = entry.size_in_bytes,
            "evicted texture"
        );
        store.metrics.evictions += 1;
        events.push(CacheEvent::TextureEvicted {
            image_id: entry.image_id,
        });
        // The texture handle is dropped here, releasing the GPU resource.
    }

    if events.is_empty() {
        return events;
    }

    let stats = store.stats();
    info!(
        capacity_bytes = stats.capacity_bytes,
        total_bytes = stats.total_bytes,
        count = stats.count,
        evicted = events.len(),
        "texture cache full"
    );
    events.push(CacheEvent::TextureCacheFull(stats));
    events
}
