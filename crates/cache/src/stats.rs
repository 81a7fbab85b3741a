//! Cache usage snapshots.

use serde::Serialize;

/// Point-in-time view of the byte budget.
///
/// This is also the payload of the `texture-cache-full` notification, so it
/// serializes with the camelCase field names listeners expect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Maximum VRAM allowed (bytes)
    pub capacity_bytes: u64,

    /// VRAM used by cached textures (bytes)
    pub total_bytes: u64,

    /// Number of textures currently in cache
    pub count: usize,
}

impl CacheStats {
    /// Calculate VRAM utilization (0.0 when capacity is zero)
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            self.total_bytes as f64 / self.capacity_bytes as f64
        }
    }
}

/// Lifetime counters of cache traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheMetrics {
    /// Number of `get` calls that found their texture
    pub hits: u64,

    /// Number of `get` calls that found nothing
    pub misses: u64,

    /// Number of textures evicted due to VRAM pressure
    pub evictions: u64,
}

impl CacheMetrics {
    /// Calculate the cache hit rate (0.0 to 1.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
