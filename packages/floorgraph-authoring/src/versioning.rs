//! Version Manager
//!
//! Creates floor plan versions: floor lookup, duplicate pre-flight,
//! artifact bytes first, then the metadata row. If the row insert fails
//! after the bytes were written, the blob is deleted best-effort; a
//! cleanup failure is logged and swallowed so the caller always sees
//! the original error.

use std::sync::Arc;
use tracing::{info, warn};

use floorgraph_storage::{
    ArtifactKind, FloorId, FloorPlanVersion, MapStore, NewVersionRecord, Result, StorageError,
    VersionId, VersionPatch,
};

use crate::ports::{BlobStore, FloorDirectory};

/// Input for creating a floor plan version
#[derive(Debug, Clone)]
pub struct NewVersion {
    pub floor_id: FloorId,
    pub version_number: i32,
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub kind: ArtifactKind,
    /// (width, height) in pixels; `None` for PDF artifacts
    pub pixel_size: Option<(f64, f64)>,
    pub scale: f64,
    pub change_notes: Option<String>,
    pub created_by: Option<String>,
}

/// Version lifecycle service
pub struct VersionManager {
    store: Arc<dyn MapStore>,
    blobs: Arc<dyn BlobStore>,
    floors: Arc<dyn FloorDirectory>,
}

impl VersionManager {
    pub fn new(
        store: Arc<dyn MapStore>,
        blobs: Arc<dyn BlobStore>,
        floors: Arc<dyn FloorDirectory>,
    ) -> Self {
        Self {
            store,
            blobs,
            floors,
        }
    }

    /// Create a new version for a floor
    ///
    /// The artifact bytes land in the blob store before the metadata
    /// row exists, so a crash between the two steps leaves an orphaned
    /// blob rather than a version row pointing at nothing.
    pub async fn create_version(&self, input: NewVersion) -> Result<FloorPlanVersion> {
        if !self.floors.floor_exists(input.floor_id).await? {
            return Err(StorageError::floor_not_found(input.floor_id));
        }

        // Pre-flight before any bytes are written; the store re-checks
        // under its own lock.
        if self
            .store
            .find_version(input.floor_id, input.version_number)
            .await?
            .is_some()
        {
            return Err(StorageError::duplicate_version(
                input.floor_id,
                input.version_number,
            ));
        }

        let file_size = input.bytes.len() as u64;
        let artifact_ref = self.blobs.put(&input.bytes, &input.file_name).await?;

        let record = NewVersionRecord {
            floor_id: input.floor_id,
            version_number: input.version_number,
            artifact_ref: artifact_ref.clone(),
            artifact_kind: input.kind,
            file_size: Some(file_size),
            pixel_size: input.pixel_size,
            scale: input.scale,
            change_notes: input.change_notes,
            created_by: input.created_by,
        };

        match self.store.insert_version(record).await {
            Ok(version) => {
                info!(
                    "Created floor plan version: floor={} version={} artifact={}",
                    version.floor_id, version.version_number, version.artifact_ref
                );
                Ok(version)
            }
            Err(err) => {
                // Best-effort cleanup of the just-written blob
                if let Err(cleanup_err) = self.blobs.delete(&artifact_ref).await {
                    warn!(
                        "Failed to clean up artifact blob {} after insert error: {}",
                        artifact_ref, cleanup_err
                    );
                }
                Err(err)
            }
        }
    }

    /// Look up a version within a floor
    ///
    /// A version id belonging to a different floor is treated as
    /// absent, so callers cannot reach across floors by id.
    pub async fn get_version(
        &self,
        floor_id: FloorId,
        version_id: VersionId,
    ) -> Result<Option<FloorPlanVersion>> {
        Ok(self
            .store
            .get_version(version_id)
            .await?
            .filter(|v| v.floor_id == floor_id))
    }

    /// All versions of a floor, newest version number first
    pub async fn list_versions(&self, floor_id: FloorId) -> Result<Vec<FloorPlanVersion>> {
        if !self.floors.floor_exists(floor_id).await? {
            return Err(StorageError::floor_not_found(floor_id));
        }
        self.store.list_versions(floor_id).await
    }

    /// Update a version's mutable metadata
    pub async fn update_metadata(
        &self,
        version_id: VersionId,
        patch: VersionPatch,
    ) -> Result<FloorPlanVersion> {
        self.store.update_version(version_id, &patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MemoryBlobStore;
    use crate::ports::StaticFloorDirectory;
    use floorgraph_storage::{ErrorKind, InMemoryMapStore};

    fn manager() -> (VersionManager, Arc<MemoryBlobStore>, StaticFloorDirectory) {
        let store = Arc::new(InMemoryMapStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let floors = StaticFloorDirectory::new([1]);
        let manager = VersionManager::new(store, blobs.clone(), Arc::new(floors.clone()));
        (manager, blobs, floors)
    }

    fn new_version(floor_id: FloorId, version_number: i32) -> NewVersion {
        NewVersion {
            floor_id,
            version_number,
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
            file_name: "lobby.png".into(),
            kind: ArtifactKind::Image,
            pixel_size: Some((640.0, 480.0)),
            scale: 0.02,
            change_notes: None,
            created_by: Some("erin".into()),
        }
    }

    #[tokio::test]
    async fn test_create_version() {
        let (manager, blobs, _) = manager();
        let version = manager.create_version(new_version(1, 1)).await.unwrap();

        assert_eq!(version.floor_id, 1);
        assert_eq!(version.file_size, Some(4));
        assert!(blobs.contains(&version.artifact_ref));
    }

    #[tokio::test]
    async fn test_get_version_is_scoped_to_floor() {
        let store = Arc::new(InMemoryMapStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let manager = VersionManager::new(
            store,
            blobs,
            Arc::new(StaticFloorDirectory::new([1, 2])),
        );
        let version = manager.create_version(new_version(1, 1)).await.unwrap();

        let found = manager.get_version(1, version.id).await.unwrap();
        assert_eq!(found.map(|v| v.id), Some(version.id));

        // Same id through another floor reads as absent
        assert!(manager.get_version(2, version.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_floor_writes_nothing() {
        let (manager, blobs, _) = manager();
        let err = manager.create_version(new_version(42, 1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::FloorNotFound);
        assert_eq!(blobs.blob_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_preflight_writes_nothing() {
        let (manager, blobs, _) = manager();
        manager.create_version(new_version(1, 1)).await.unwrap();
        assert_eq!(blobs.blob_count(), 1);

        let err = manager.create_version(new_version(1, 1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateVersion);
        assert_eq!(blobs.blob_count(), 1);
    }

    struct BlindDirectory;
    #[async_trait::async_trait]
    impl crate::ports::FloorDirectory for BlindDirectory {
        async fn floor_exists(&self, _floor_id: FloorId) -> Result<bool> {
            Ok(true)
        }
    }

    /// Store wrapper whose `find_version` always reports the pair as
    /// free, so the duplicate surfaces from the insert itself (after
    /// the blob is written)
    struct RacingStore {
        inner: Arc<InMemoryMapStore>,
    }
    #[async_trait::async_trait]
    impl MapStore for RacingStore {
        async fn insert_version(
            &self,
            record: NewVersionRecord,
        ) -> Result<FloorPlanVersion> {
            self.inner.insert_version(record).await
        }
        async fn get_version(
            &self,
            version_id: VersionId,
        ) -> Result<Option<FloorPlanVersion>> {
            self.inner.get_version(version_id).await
        }
        async fn find_version(
            &self,
            _floor_id: FloorId,
            _version_number: i32,
        ) -> Result<Option<FloorPlanVersion>> {
            // Stale read: pretend the pair is free
            Ok(None)
        }
        async fn list_versions(&self, floor_id: FloorId) -> Result<Vec<FloorPlanVersion>> {
            self.inner.list_versions(floor_id).await
        }
        async fn update_version(
            &self,
            version_id: VersionId,
            patch: &VersionPatch,
        ) -> Result<FloorPlanVersion> {
            self.inner.update_version(version_id, patch).await
        }
        async fn insert_poi(
            &self,
            record: floorgraph_storage::NewPoi,
        ) -> Result<floorgraph_storage::PointOfInterest> {
            self.inner.insert_poi(record).await
        }
        async fn get_poi(
            &self,
            poi_id: floorgraph_storage::PoiId,
        ) -> Result<Option<floorgraph_storage::PointOfInterest>> {
            self.inner.get_poi(poi_id).await
        }
        async fn list_pois(
            &self,
            version_id: VersionId,
        ) -> Result<Vec<floorgraph_storage::PointOfInterest>> {
            self.inner.list_pois(version_id).await
        }
        async fn update_poi(
            &self,
            poi_id: floorgraph_storage::PoiId,
            patch: &floorgraph_storage::PoiPatch,
        ) -> Result<floorgraph_storage::PointOfInterest> {
            self.inner.update_poi(poi_id, patch).await
        }
        async fn deactivate_poi(&self, poi_id: floorgraph_storage::PoiId) -> Result<()> {
            self.inner.deactivate_poi(poi_id).await
        }
        async fn insert_node(
            &self,
            record: floorgraph_storage::NewNode,
        ) -> Result<floorgraph_storage::RoutingNode> {
            self.inner.insert_node(record).await
        }
        async fn get_node(
            &self,
            node_id: floorgraph_storage::NodeId,
        ) -> Result<Option<floorgraph_storage::RoutingNode>> {
            self.inner.get_node(node_id).await
        }
        async fn list_nodes(
            &self,
            version_id: VersionId,
        ) -> Result<Vec<floorgraph_storage::RoutingNode>> {
            self.inner.list_nodes(version_id).await
        }
        async fn deactivate_node(&self, node_id: floorgraph_storage::NodeId) -> Result<()> {
            self.inner.deactivate_node(node_id).await
        }
        async fn insert_edge(
            &self,
            record: floorgraph_storage::NewEdge,
        ) -> Result<floorgraph_storage::RoutingEdge> {
            self.inner.insert_edge(record).await
        }
        async fn list_edges(
            &self,
            version_id: VersionId,
        ) -> Result<Vec<floorgraph_storage::RoutingEdge>> {
            self.inner.list_edges(version_id).await
        }
        async fn deactivate_edge(&self, edge_id: floorgraph_storage::EdgeId) -> Result<()> {
            self.inner.deactivate_edge(edge_id).await
        }
        async fn insert_publishing(
            &self,
            record: floorgraph_storage::NewPublishing,
        ) -> Result<floorgraph_storage::MapPublishing> {
            self.inner.insert_publishing(record).await
        }
        async fn get_publishing(
            &self,
            publishing_id: floorgraph_storage::PublishingId,
        ) -> Result<Option<floorgraph_storage::MapPublishing>> {
            self.inner.get_publishing(publishing_id).await
        }
        async fn update_publishing(
            &self,
            publishing_id: floorgraph_storage::PublishingId,
            status: floorgraph_storage::PublishingStatus,
            review_notes: Option<String>,
            published_by: Option<String>,
        ) -> Result<floorgraph_storage::MapPublishing> {
            self.inner
                .update_publishing(publishing_id, status, review_notes, published_by)
                .await
        }
        async fn list_publishing(
            &self,
            floor_id: FloorId,
        ) -> Result<Vec<floorgraph_storage::MapPublishing>> {
            self.inner.list_publishing(floor_id).await
        }
        async fn current_publishing(
            &self,
            floor_id: FloorId,
        ) -> Result<Option<floorgraph_storage::MapPublishing>> {
            self.inner.current_publishing(floor_id).await
        }
        async fn promote_to_current(
            &self,
            publishing_id: floorgraph_storage::PublishingId,
        ) -> Result<floorgraph_storage::MapPublishing> {
            self.inner.promote_to_current(publishing_id).await
        }
    }

    #[tokio::test]
    async fn test_blob_rolled_back_on_insert_error() {
        // The shared store already holds (2, 1); the racing manager's
        // stale pre-flight misses it, so the duplicate surfaces from
        // the insert after the blob is written.
        let store = Arc::new(InMemoryMapStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let first = VersionManager::new(
            store.clone(),
            blobs.clone(),
            Arc::new(StaticFloorDirectory::new([2])),
        );
        first.create_version(new_version(2, 1)).await.unwrap();

        let racing = VersionManager::new(
            Arc::new(RacingStore { inner: store }),
            blobs.clone(),
            Arc::new(BlindDirectory),
        );
        let err = racing.create_version(new_version(2, 1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateVersion);

        // The racing upload's blob was cleaned up, the winner's kept
        assert_eq!(blobs.blob_count(), 1);
        assert_eq!(blobs.deleted_refs().len(), 1);
    }

    #[tokio::test]
    async fn test_cleanup_failure_does_not_mask_insert_error() {
        let store = Arc::new(InMemoryMapStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let manager = VersionManager::new(
            store.clone(),
            blobs.clone(),
            Arc::new(StaticFloorDirectory::new([2])),
        );
        manager.create_version(new_version(2, 1)).await.unwrap();

        let racing = VersionManager::new(
            Arc::new(RacingStore { inner: store }),
            blobs.clone(),
            Arc::new(BlindDirectory),
        );
        blobs.fail_deletes(true);

        let err = racing.create_version(new_version(2, 1)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateVersion);

        // Cleanup failed, so the orphaned blob remains, but the caller
        // still sees the duplicate error
        assert_eq!(blobs.blob_count(), 2);
        assert!(blobs.deleted_refs().is_empty());
    }
}
