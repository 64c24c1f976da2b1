//! Storage asset model

use serde::{Deserialize, Serialize};

/// An uploaded object and the URL it can be fetched from. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageAsset {
    /// Last segment of the storage path
    pub name: String,
    pub url: String,
}

impl StorageAsset {
    /// Build an asset from its storage path (`folder/photo.jpg` -> `photo.jpg`)
    pub fn from_path(path: &str, url: String) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        Self { name, url }
    }
}
