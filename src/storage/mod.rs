//! Object storage
//!
//! Uploaded media lives in one flat bucket. The bucket is reached through
//! [`ObjectStore`] so the resolver does not care where bytes are kept.

pub mod local;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use local::LocalObjectStore;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Paths of every object at the bucket root. Nested prefixes are not
    /// listed.
    async fn list(&self) -> Result<Vec<String>>;

    /// Retrievable URL for an object path
    async fn resolve_url(&self, path: &str) -> Result<String>;

    /// Store `bytes` under `name`, replacing any existing object
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Returns `false` when the object did not exist
    async fn delete(&self, name: &str) -> Result<bool>;
}

pub type DynObjectStore = Arc<dyn ObjectStore>;

/// Reject names that would escape the flat namespace
pub fn is_valid_object_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.starts_with('.')
}
