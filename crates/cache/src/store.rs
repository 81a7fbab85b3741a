//! Entry bookkeeping behind [`TextureCache`](crate::TextureCache).
//!
//! `TextureStore` owns the id -> entry map, an ordered list of the same ids
//! used for recency sorting, and the byte counters. It is not thread-safe on
//! its own; the cache keeps it behind a single mutex so that an eviction pass
//! is never observed half-done.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Instant;

use crate::error::TextureCacheError;
use crate::stats::{CacheMetrics, CacheStats};
use crate::texture::GpuTexture;

/// One cached image-id -> texture binding.
#[derive(Debug)]
pub(crate) struct CachedEntry {
    pub(crate) image_id: String,
    pub(crate) texture: GpuTexture,
    /// Charged against the budget; copied from the texture at insertion.
    pub(crate) size_in_bytes: u64,
    pub(crate) last_accessed: Instant,
    /// Logical clock value of the last access, breaks `Instant` ties.
    pub(crate) access_seq: u64,
}

impl CachedEntry {
    /// Sort key for retention, greatest is kept longest.
    ///
    /// Zero-byte entries rank above everything else: evicting them never
    /// brings usage down.
    fn retention_key(&self) -> (bool, Instant, u64) {
        (self.size_in_bytes == 0, self.last_accessed, self.access_seq)
    }
}

#[derive(Debug)]
pub(crate) struct TextureStore {
    /// Lookup table, one entry per image id
    entries: HashMap<String, CachedEntry>,

    /// Same ids as `entries`. Insertion order until an eviction pass sorts
    /// it by recency (most recent first).
    order: Vec<String>,

    /// Sum of `size_in_bytes` over `entries`
    total_bytes: u64,

    capacity_bytes: u64,

    /// Logical access clock
    clock: u64,

    pub(crate) metrics: CacheMetrics,
}

impl TextureStore {
    pub(crate) fn new(capacity_bytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
            total_bytes: 0,
            capacity_bytes,
            clock: 0,
            metrics: CacheMetrics::default(),
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Add a new entry. Fails without touching anything if the id is taken
    /// or the byte total would overflow.
    pub(crate) fn insert(
        &mut self,
        image_id: String,
        texture: GpuTexture,
    ) -> Result<(), TextureCacheError> {
        if self.entries.contains_key(&image_id) {
            return Err(TextureCacheError::DuplicateKey(image_id));
        }

        let size_in_bytes = texture.size_in_bytes();
        let total_bytes = self.total_bytes.checked_add(size_in_bytes).ok_or_else(|| {
            TextureCacheError::InvalidArgument(format!(
                "size of {image_id} ({size_in_bytes} bytes) overflows the cache byte total"
            ))
        })?;

        let access_seq = self.tick();
        let entry = CachedEntry {
            image_id: image_id.clone(),
            texture,
            size_in_bytes,
            last_accessed: Instant::now(),
            access_seq,
        };

        self.entries.insert(image_id.clone(), entry);
        self.order.push(image_id);
        self.total_bytes = total_bytes;
        Ok(())
    }

    /// Refresh the recency of `image_id` and return its texture.
    ///
    /// Counts a hit when found; misses are counted by the caller.
    pub(crate) fn touch(&mut self, image_id: &str) -> Option<&mut GpuTexture> {
        if !self.entries.contains_key(image_id) {
            return None;
        }

        let access_seq = self.tick();
        self.metrics.hits += 1;
        let entry = self.entries.get_mut(image_id)?;
        entry.last_accessed = Instant::now();
        entry.access_seq = access_seq;
        Some(&mut entry.texture)
    }

    pub(crate) fn remove(&mut self, image_id: &str) -> Option<CachedEntry> {
        let entry = self.entries.remove(image_id)?;
        if let Some(pos) = self.order.iter().position(|id| id == image_id) {
            self.order.remove(pos);
        }
        self.total_bytes -= entry.size_in_bytes;
        Some(entry)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }

    pub(crate) fn contains(&self, image_id: &str) -> bool {
        self.entries.contains_key(image_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub(crate) fn capacity_bytes(&self) -> u64 {
        self.capacity_bytes
    }

    pub(crate) fn set_capacity_bytes(&mut self, capacity_bytes: u64) {
        self.capacity_bytes = capacity_bytes;
    }

    /// Strictly over budget; sitting exactly at capacity is fine.
    pub(crate) fn is_over_budget(&self) -> bool {
        self.total_bytes > self.capacity_bytes
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats {
            capacity_bytes: self.capacity_bytes,
            total_bytes: self.total_bytes,
            count: self.entries.len(),
        }
    }

    /// Sort the ordered list most-recent-first. Stable, so equal keys keep
    /// their current relative order.
    pub(crate) fn sort_by_recency(&mut self) {
        let entries = &self.entries;
        self.order
            .sort_by_cached_key(|id| Reverse(entries.get(id).map(CachedEntry::retention_key)));
    }

    /// Remove the entry at the tail of the ordered list.
    pub(crate) fn pop_least_recent(&mut self) -> Option<CachedEntry> {
        let image_id = self.order.pop()?;
        let entry = self.entries.remove(&image_id);
        debug_assert!(entry.is_some(), "ordered list out of sync for {image_id}");
        let entry = entry?;
        self.total_bytes -= entry.size_in_bytes;
        Some(entry)
    }

    /// Image ids ordered most recently used first, without reordering the store.
    ///
    /// Pure recency: unlike the eviction order, zero-byte entries get no
    /// special rank here.
    pub(crate) fn ids_by_recency(&self) -> Vec<String> {
        let mut entries: Vec<&CachedEntry> = self.entries.values().collect();
        entries.sort_by_key(|entry| Reverse((entry.last_accessed, entry.access_seq)));
        entries.into_iter().map(|entry| entry.image_id.clone()).collect()
    }

    /// Check the map/list consistency and byte accounting.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        use std::collections::HashSet;

        let listed: HashSet<&String> = self.order.iter().collect();
        assert_eq!(listed.len(), self.order.len(), "duplicate ids in ordered list");
        let mapped: HashSet<&String> = self.entries.keys().collect();
        assert_eq!(listed, mapped, "ordered list and map disagree");

        let sum: u64 = self.entries.values().map(|entry| entry.size_in_bytes).sum();
        assert_eq!(sum, self.total_bytes, "byte total out of sync");

        for (id, entry) in &self.entries {
            assert_eq!(id, &entry.image_id);
        }
    }
}
