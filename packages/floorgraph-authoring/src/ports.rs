//! Collaborator Ports
//!
//! The authoring services depend on three external systems behind
//! traits: the floor directory (which floors exist), the blob store
//! (artifact bytes), and the fingerprint source (radio calibration
//! data). Each ships with an in-memory adapter for tests and for
//! deployments where the collaborator is co-located.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use floorgraph_storage::{Fingerprint, FloorId, Result};

/// Floor directory port: answers whether a floor exists.
///
/// Version creation refuses to attach artifacts to unknown floors.
#[async_trait]
pub trait FloorDirectory: Send + Sync {
    async fn floor_exists(&self, floor_id: FloorId) -> Result<bool>;
}

/// Blob store port for artifact bytes.
///
/// `put` returns an opaque reference the store can later `delete`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<String>;
    async fn delete(&self, reference: &str) -> Result<()>;
}

/// Source of radio calibration fingerprints for a floor
#[async_trait]
pub trait FingerprintSource: Send + Sync {
    async fn list_fingerprints(&self, floor_id: FloorId) -> Result<Vec<Fingerprint>>;
}

/// Fixed set of known floors (testing, or static site configs)
#[derive(Clone, Default)]
pub struct StaticFloorDirectory {
    floors: Arc<RwLock<HashSet<FloorId>>>,
}

impl StaticFloorDirectory {
    pub fn new(floors: impl IntoIterator<Item = FloorId>) -> Self {
        Self {
            floors: Arc::new(RwLock::new(floors.into_iter().collect())),
        }
    }

    pub fn add_floor(&self, floor_id: FloorId) {
        self.floors.write().unwrap().insert(floor_id);
    }
}

#[async_trait]
impl FloorDirectory for StaticFloorDirectory {
    async fn floor_exists(&self, floor_id: FloorId) -> Result<bool> {
        Ok(self.floors.read().unwrap().contains(&floor_id))
    }
}

/// In-memory fingerprint source (for testing)
#[derive(Clone, Default)]
pub struct MemoryFingerprintSource {
    fingerprints: Arc<RwLock<Vec<Fingerprint>>>,
}

impl MemoryFingerprintSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, fingerprint: Fingerprint) {
        self.fingerprints.write().unwrap().push(fingerprint);
    }
}

#[async_trait]
impl FingerprintSource for MemoryFingerprintSource {
    async fn list_fingerprints(&self, floor_id: FloorId) -> Result<Vec<Fingerprint>> {
        Ok(self
            .fingerprints
            .read()
            .unwrap()
            .iter()
            .filter(|f| f.floor_id == floor_id)
            .cloned()
            .collect())
    }
}
