//! Opaque GPU texture handles stored by the cache.

use std::any::Any;
use std::fmt;
use std::ops::Deref;

use parking_lot::MappedMutexGuard;

/// GPU texture handle
///
/// Wraps a platform-specific texture object (WebGL, Metal, wgpu, ...) together
/// with the number of bytes it occupies in VRAM. The cache never looks inside
/// the handle; it only charges `size_in_bytes` against its budget.
pub struct GpuTexture {
    /// Opaque handle to the GPU texture (platform-specific)
    handle: Box<dyn Any + Send>,

    /// VRAM usage in bytes, fixed at construction
    size_in_bytes: u64,
}

impl GpuTexture {
    /// Create a new GPU texture handle
    ///
    /// # Arguments
    ///
    /// * `handle` - Platform-specific GPU texture object
    /// * `size_in_bytes` - VRAM charged against the cache budget
    pub fn new<T: Any + Send>(handle: T, size_in_bytes: u64) -> Self {
        Self {
            handle: Box::new(handle),
            size_in_bytes,
        }
    }

    /// VRAM usage of this texture in bytes
    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }

    /// Get a reference to the underlying texture handle
    ///
    /// Returns `None` if the type doesn't match.
    pub fn handle<T: Any>(&self) -> Option<&T> {
        self.handle.downcast_ref::<T>()
    }

    /// Get a mutable reference to the underlying texture handle
    pub fn handle_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.handle.downcast_mut::<T>()
    }

    /// Consume the texture and take back ownership of the handle
    ///
    /// On a type mismatch the texture is returned unchanged.
    pub fn into_handle<T: Any>(self) -> Result<T, Self> {
        let size_in_bytes = self.size_in_bytes;
        self.handle
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|handle| Self {
                handle,
                size_in_bytes,
            })
    }
}

impl fmt::Debug for GpuTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuTexture")
            .field("size_in_bytes", &self.size_in_bytes)
            .finish_non_exhaustive()
    }
}

/// Reference to a cached GPU texture
///
/// Holds the cache lock for as long as it lives, so the texture cannot be
/// evicted or removed while it is being read. Drop it before calling any
/// other method on the same cache from the same thread.
pub struct TextureRef<'a> {
    pub(crate) guard: MappedMutexGuard<'a, GpuTexture>,
}

impl Deref for TextureRef<'_> {
    type Target = GpuTexture;

    fn deref(&self) -> &GpuTexture {
        &self.guard
    }
}

impl fmt::Debug for TextureRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextureRef").field(&*self.guard).finish()
    }
}
