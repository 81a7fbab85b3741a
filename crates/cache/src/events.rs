//! Cache notifications and a small listener registry to deliver them.
//!
//! The cache only needs a "notify" capability ([`Notifier`]). Rendering code
//! usually plugs in an [`EventDispatcher`], registers listeners by event name
//! and gets called back after every eviction pass.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use radview_cache::events::{EventDispatcher, TEXTURE_EVICTED};
//! use radview_cache::{GpuTexture, TextureCache};
//!
//! let dispatcher = Arc::new(EventDispatcher::new());
//! dispatcher.add_event_listener(TEXTURE_EVICTED, |event| {
//!     println!("evicted: {:?}", event.image_id());
//! });
//!
//! let cache = TextureCache::with_notifier(100, dispatcher.clone());
//! cache.insert("img1", GpuTexture::new(1u32, 60)).unwrap();
//! cache.insert("img2", GpuTexture::new(2u32, 50)).unwrap(); // evicts img1
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::stats::CacheStats;

/// Event name emitted once per texture removed by the eviction policy.
pub const TEXTURE_EVICTED: &str = "texture-evicted";

/// Event name emitted once per eviction pass that removed at least one texture.
pub const TEXTURE_CACHE_FULL: &str = "texture-cache-full";

/// A notification emitted by the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    /// The eviction policy dropped this texture to get back under budget.
    TextureEvicted { image_id: String },
    /// An eviction pass finished; carries the post-purge snapshot.
    TextureCacheFull(CacheStats),
}

impl CacheEvent {
    /// The event name listeners subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            CacheEvent::TextureEvicted { .. } => TEXTURE_EVICTED,
            CacheEvent::TextureCacheFull(_) => TEXTURE_CACHE_FULL,
        }
    }

    /// The event payload as a JSON object.
    ///
    /// `texture-evicted` carries `{ imageId }`, `texture-cache-full` carries
    /// `{ capacityBytes, totalBytes, count }`.
    pub fn payload(&self) -> Value {
        match self {
            CacheEvent::TextureEvicted { image_id } => json!({ "imageId": image_id }),
            CacheEvent::TextureCacheFull(stats) => json!({
                "capacityBytes": stats.capacity_bytes,
                "totalBytes": stats.total_bytes,
                "count": stats.count,
            }),
        }
    }

    /// The evicted image id, for `TextureEvicted` events.
    pub fn image_id(&self) -> Option<&str> {
        match self {
            CacheEvent::TextureEvicted { image_id } => Some(image_id),
            CacheEvent::TextureCacheFull(_) => None,
        }
    }
}

/// Fire-and-forget sink for cache notifications.
///
/// The cache calls `notify` after it has released its internal lock, so an
/// implementation may call back into the cache.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: &CacheEvent);
}

/// A [`Notifier`] that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &CacheEvent) {}
}

/// A [`Notifier`] backed by a closure.
pub struct FnNotifier<F>(pub F);

impl<F> Notifier for FnNotifier<F>
where
    F: Fn(&CacheEvent) + Send + Sync,
{
    fn notify(&self, event: &CacheEvent) {
        (self.0)(event)
    }
}

type Listener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

/// Registry of listeners keyed by event name.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events named `event_name`.
    ///
    /// Listeners for the same name run in registration order.
    pub fn add_event_listener<F>(&self, event_name: &str, callback: F)
    where
        F: Fn(&CacheEvent) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .entry(event_name.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Invoke every listener registered for `event.name()`.
    ///
    /// Does nothing when no listener is registered.
    pub fn dispatch_event(&self, event: &CacheEvent) {
        // Listeners may register further listeners, so call them unlocked.
        let listeners = match self.listeners.read().get(event.name()) {
            Some(listeners) if !listeners.is_empty() => listeners.clone(),
            _ => return,
        };

        for listener in listeners {
            listener(event);
        }
    }

    /// Number of listeners registered for `event_name`.
    pub fn listener_count(&self, event_name: &str) -> usize {
        self.listeners
            .read()
            .get(event_name)
            .map_or(0, |listeners| listeners.len())
    }
}

impl Notifier for EventDispatcher {
    fn notify(&self, event: &CacheEvent) {
        self.dispatch_event(event);
    }
}
