//! Blob Store Adapters
//!
//! `FsBlobStore` keeps artifact bytes in a flat directory with
//! uuid-salted filenames so repeated uploads of the same file never
//! collide. `MemoryBlobStore` is for tests and records deletes so
//! rollback behavior can be observed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use floorgraph_storage::{Result, StorageError};

use crate::ports::BlobStore;

/// Filesystem-backed blob store
#[derive(Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn sanitize(name: &str) -> String {
        let cleaned: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if cleaned.is_empty() {
            "artifact".to_string()
        } else {
            cleaned
        }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        let file_name = format!("{}-{}", Uuid::new_v4(), Self::sanitize(suggested_name));
        let path = self.root.join(&file_name);
        fs::write(&path, bytes)?;
        info!(
            "Stored artifact blob: {} ({} bytes)",
            path.display(),
            bytes.len()
        );
        Ok(file_name)
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        let path = self.root.join(reference);
        fs::remove_file(&path)?;
        debug!("Deleted artifact blob: {}", path.display());
        Ok(())
    }
}

/// In-memory blob store (for testing)
///
/// `deleted` keeps every reference ever deleted, including re-deletes,
/// so tests can assert cleanup happened.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    deleted: Arc<RwLock<Vec<String>>>,
    fail_deletes: Arc<RwLock<bool>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `delete` calls fail (for rollback-path tests)
    pub fn fail_deletes(&self, fail: bool) {
        *self.fail_deletes.write().unwrap() = fail;
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.blobs.read().unwrap().contains_key(reference)
    }

    pub fn deleted_refs(&self) -> Vec<String> {
        self.deleted.read().unwrap().clone()
    }

    pub fn blob_count(&self) -> usize {
        self.blobs.read().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<String> {
        let reference = format!("{}-{}", Uuid::new_v4(), suggested_name);
        self.blobs
            .write()
            .unwrap()
            .insert(reference.clone(), bytes.to_vec());
        Ok(reference)
    }

    async fn delete(&self, reference: &str) -> Result<()> {
        if *self.fail_deletes.read().unwrap() {
            warn!("Simulated blob delete failure: {}", reference);
            return Err(StorageError::database(format!(
                "Blob delete failed: {}",
                reference
            )));
        }
        self.blobs.write().unwrap().remove(reference);
        self.deleted.write().unwrap().push(reference.to_string());
        Ok(())
    }
}
