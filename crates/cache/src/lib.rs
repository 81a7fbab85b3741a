//! Radview Texture Cache
//!
//! Bounded VRAM cache for image textures with LRU eviction and eviction
//! notifications.

mod cache;
mod eviction;
mod store;

pub mod config;
pub mod error;
pub mod events;
pub mod stats;
pub mod texture;

pub use cache::TextureCache;
pub use config::TextureCacheConfig;
pub use error::{ConfigError, TextureCacheError};
pub use events::{CacheEvent, EventDispatcher, Notifier};
pub use stats::{CacheMetrics, CacheStats};
pub use texture::{GpuTexture, TextureRef};
