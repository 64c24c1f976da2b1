//! Filesystem-backed object store
//!
//! Objects are plain files in one directory, served over HTTP under
//! `public_url` by the static file route.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{is_valid_object_name, ObjectStore};
use crate::config::StorageConfig;

pub struct LocalObjectStore {
    root: PathBuf,
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.path.clone(), config.public_url.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, name: &str) -> Result<PathBuf> {
        if !is_valid_object_name(name) {
            anyhow::bail!("Invalid object name: {}", name);
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {:?}", self.root));
            }
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .context("Failed to read storage entry")?
        {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_valid_object_name(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn resolve_url(&self, path: &str) -> Result<String> {
        let name = path.rsplit('/').next().unwrap_or(path);
        Ok(format!("{}/{}", self.public_url, urlencoding::encode(name)))
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.object_path(name)?;
        fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create storage directory {:?}", self.root))?;
        fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let path = self.object_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to delete {:?}", path)),
        }
    }
}
