//! Error types for the texture cache and its configuration.

use std::io;

/// Errors returned by [`TextureCache`](crate::TextureCache) operations.
///
/// A call that returns one of these leaves the cache exactly as it was
/// before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureCacheError {
    /// Malformed or missing input, e.g. an empty image id.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `insert` was called with an image id that is already cached.
    #[error("image id already in cache: {0}")]
    DuplicateKey(String),

    /// The operation targeted an image id that is not cached.
    #[error("image id not in cache: {0}")]
    NotFound(String),
}

/// Errors that can occur while loading or saving cache configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration key held a value that is not a non-negative integer.
    #[error("invalid value for configuration key {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    /// The platform has no per-user configuration directory.
    #[error("unable to resolve configuration directory")]
    NoConfigDirectory,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}
