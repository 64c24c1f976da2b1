//! Media reference resolver
//!
//! Lists every object in the flat media bucket and resolves each one to a
//! retrievable URL. Resolutions run concurrently. Uploads and deletes go
//! through here too so the cached listing stays fresh.

use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::MemoryCache;
use crate::config::StorageConfig;
use crate::models::StorageAsset;
use crate::storage::{is_valid_object_name, DynObjectStore};

const LISTING_KEY: &str = "media:listing";

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0}")]
    Validation(String),

    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub struct MediaResolver {
    store: DynObjectStore,
    config: Arc<StorageConfig>,
    cache: Option<MemoryCache>,
}

impl MediaResolver {
    /// Build a resolver; a zero `listing_cache_ttl_seconds` disables caching
    pub fn new(store: DynObjectStore, config: Arc<StorageConfig>) -> Self {
        let cache = (config.listing_cache_ttl_seconds > 0)
            .then(|| MemoryCache::new(Duration::from_secs(config.listing_cache_ttl_seconds)));
        Self {
            store,
            config,
            cache,
        }
    }

    /// Every asset in the bucket as `{name, url}`
    pub async fn list_assets(&self) -> Result<Vec<StorageAsset>, MediaError> {
        if let Some(cache) = &self.cache {
            match cache.get::<Vec<StorageAsset>>(LISTING_KEY).await {
                Ok(Some(assets)) => return Ok(assets),
                Ok(None) => {}
                Err(e) => tracing::warn!("Ignoring unreadable media listing cache: {:#}", e),
            }
        }

        let paths = self.store.list().await?;
        let store = &self.store;
        let assets = try_join_all(paths.iter().map(|path| async move {
            let url = store.resolve_url(path).await?;
            Ok::<_, anyhow::Error>(StorageAsset::from_path(path, url))
        }))
        .await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(LISTING_KEY, &assets).await {
                tracing::warn!("Failed to cache media listing: {:#}", e);
            }
        }
        Ok(assets)
    }

    /// Validate and store an upload under a generated `<uuid>.<ext>` name
    pub async fn upload(&self, content_type: &str, bytes: &[u8]) -> Result<StorageAsset, MediaError> {
        if !self.config.is_type_allowed(content_type) {
            return Err(MediaError::Validation(format!(
                "Invalid file type: {}. Allowed types: {}",
                content_type,
                self.config.allowed_types.join(", ")
            )));
        }
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(MediaError::Validation(format!(
                "File too large. Maximum size: {} MB",
                self.config.max_file_size / 1024 / 1024
            )));
        }
        if bytes.is_empty() {
            return Err(MediaError::Validation("File is empty".to_string()));
        }

        let name = format!(
            "{}.{}",
            uuid::Uuid::new_v4(),
            self.config.get_extension(content_type)
        );
        self.store.put(&name, bytes).await?;
        self.invalidate().await;

        let url = self.store.resolve_url(&name).await?;
        tracing::info!("Stored upload {} ({} bytes)", name, bytes.len());
        Ok(StorageAsset { name, url })
    }

    pub async fn delete(&self, name: &str) -> Result<(), MediaError> {
        if !is_valid_object_name(name) {
            return Err(MediaError::Validation(format!("Invalid asset name: {}", name)));
        }
        if !self.store.delete(name).await? {
            return Err(MediaError::NotFound(name.to_string()));
        }
        self.invalidate().await;
        Ok(())
    }

    async fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.delete(LISTING_KEY).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalObjectStore, ObjectStore};
    use anyhow::Result;
    use async_trait::async_trait;

    fn config(ttl: u64) -> Arc<StorageConfig> {
        Arc::new(StorageConfig {
            listing_cache_ttl_seconds: ttl,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_list_resolves_every_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path(), "/uploads"));
        store.put("lunch.png", b"png").await.unwrap();
        store.put("nap time.jpg", b"jpg").await.unwrap();

        let resolver = MediaResolver::new(store, config(0));
        let assets = resolver.list_assets().await.unwrap();
        assert_eq!(
            assets,
            vec![
                StorageAsset {
                    name: "lunch.png".into(),
                    url: "/uploads/lunch.png".into()
                },
                StorageAsset {
                    name: "nap time.jpg".into(),
                    url: "/uploads/nap%20time.jpg".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_upload_validates_type_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path(), "/uploads"));
        let mut small = StorageConfig::default();
        small.max_file_size = 4;
        let resolver = MediaResolver::new(store, Arc::new(small));

        assert!(matches!(
            resolver.upload("application/pdf", b"%PDF").await,
            Err(MediaError::Validation(_))
        ));
        assert!(matches!(
            resolver.upload("image/png", b"too many bytes").await,
            Err(MediaError::Validation(_))
        ));

        let asset = resolver.upload("image/png", b"png").await.unwrap();
        assert!(asset.name.ends_with(".png"));
        assert_eq!(asset.url, format!("/uploads/{}", asset.name));
    }

    #[tokio::test]
    async fn test_cached_listing_invalidated_by_upload_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalObjectStore::new(dir.path(), "/uploads"));
        let resolver = MediaResolver::new(store.clone(), config(300));

        assert!(resolver.list_assets().await.unwrap().is_empty());

        // Written behind the resolver's back: the cached listing still wins
        store.put("sneaky.gif", b"gif").await.unwrap();
        assert!(resolver.list_assets().await.unwrap().is_empty());

        let uploaded = resolver.upload("image/jpeg", b"jpg").await.unwrap();
        assert_eq!(resolver.list_assets().await.unwrap().len(), 2);

        resolver.delete(&uploaded.name).await.unwrap();
        let names: Vec<_> = resolver
            .list_assets()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["sneaky.gif"]);
    }

    #[tokio::test]
    async fn test_delete_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = MediaResolver::new(
            Arc::new(LocalObjectStore::new(dir.path(), "/uploads")),
            config(0),
        );
        assert!(matches!(
            resolver.delete("ghost.png").await,
            Err(MediaError::NotFound(_))
        ));
        assert!(matches!(
            resolver.delete("../config.yml").await,
            Err(MediaError::Validation(_))
        ));
    }

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn list(&self) -> Result<Vec<String>> {
            Ok(vec!["a.png".to_string(), "b.png".to_string()])
        }

        async fn resolve_url(&self, path: &str) -> Result<String> {
            if path == "b.png" {
                anyhow::bail!("no download URL for {}", path);
            }
            Ok(format!("/uploads/{}", path))
        }

        async fn put(&self, _name: &str, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _name: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_one_failed_resolution_fails_listing() {
        let resolver = MediaResolver::new(Arc::new(FailingStore), config(0));
        assert!(matches!(
            resolver.list_assets().await,
            Err(MediaError::Storage(_))
        ));
    }
}
