//! Durable blob storage for uploaded profile photos.
//!
//! `put` takes a store-relative key (`profile_pics/{student_id}_{filename}`)
//! and returns an opaque reference the caller can later hand to `get`. The
//! local backend uses the absolute file path as the reference.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset key: {0}")]
    InvalidKey(String),
    #[error("failed to write asset {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read asset {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub trait AssetStore: Send + Sync {
    /// Store `bytes` under `key` and return a dereferenceable reference.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, AssetError>;

    /// Fetch back the bytes behind a reference previously returned by `put`.
    fn get(&self, reference: &str) -> Result<Vec<u8>, AssetError>;
}

/// Filesystem-backed [`AssetStore`] rooted at a single directory.
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }
}

impl AssetStore for LocalAssetStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, AssetError> {
        let rel = Path::new(key);
        // keys must stay inside the store root
        let traversal = rel.is_absolute()
            || rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || traversal {
            return Err(AssetError::InvalidKey(key.to_string()));
        }

        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| AssetError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&path, bytes).map_err(|source| AssetError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path.to_string_lossy().into_owned())
    }

    fn get(&self, reference: &str) -> Result<Vec<u8>, AssetError> {
        let path = PathBuf::from(reference);
        std::fs::read(&path).map_err(|source| AssetError::Read { path, source })
    }
}
