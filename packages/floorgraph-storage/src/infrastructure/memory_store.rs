///! In-Memory Map Store (for testing)
///!
///! HashMap-based implementation with the same relational invariants
///! as the SQLite adapter. NOT for production use.
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::models::{
    EdgeId, FloorId, FloorPlanVersion, MapPublishing, NodeId, PointOfInterest, PoiId, PoiPatch,
    PublishingId, PublishingStatus, RoutingEdge, RoutingNode, VersionId, VersionPatch,
};
use crate::domain::ports::{MapStore, NewEdge, NewNode, NewPoi, NewPublishing, NewVersionRecord};
use crate::error::{Result, StorageError};

#[derive(Clone)]
pub struct InMemoryMapStore {
    versions: Arc<RwLock<HashMap<VersionId, FloorPlanVersion>>>,
    pois: Arc<RwLock<HashMap<PoiId, PointOfInterest>>>,
    nodes: Arc<RwLock<HashMap<NodeId, RoutingNode>>>,
    edges: Arc<RwLock<HashMap<EdgeId, RoutingEdge>>>,
    publishing: Arc<RwLock<HashMap<PublishingId, MapPublishing>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryMapStore {
    pub fn new() -> Self {
        Self {
            versions: Arc::new(RwLock::new(HashMap::new())),
            pois: Arc::new(RwLock::new(HashMap::new())),
            nodes: Arc::new(RwLock::new(HashMap::new())),
            edges: Arc::new(RwLock::new(HashMap::new())),
            publishing: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }

    fn alloc_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn require_version(&self, version_id: VersionId) -> Result<()> {
        if self.versions.read().unwrap().contains_key(&version_id) {
            Ok(())
        } else {
            Err(StorageError::version_not_found(version_id))
        }
    }
}

impl Default for InMemoryMapStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MapStore for InMemoryMapStore {
    async fn insert_version(&self, record: NewVersionRecord) -> Result<FloorPlanVersion> {
        let mut versions = self.versions.write().unwrap();

        // Scan under the write lock so two concurrent inserts of the
        // same pair cannot both pass the check.
        if versions
            .values()
            .any(|v| v.floor_id == record.floor_id && v.version_number == record.version_number)
        {
            return Err(StorageError::duplicate_version(
                record.floor_id,
                record.version_number,
            ));
        }

        let version = FloorPlanVersion {
            id: self.alloc_id(),
            floor_id: record.floor_id,
            version_number: record.version_number,
            artifact_ref: record.artifact_ref,
            artifact_kind: record.artifact_kind,
            file_size: record.file_size,
            pixel_size: record.pixel_size,
            scale: record.scale,
            change_notes: record.change_notes,
            created_by: record.created_by,
            is_active: true,
            created_at: Utc::now(),
        };
        versions.insert(version.id, version.clone());
        Ok(version)
    }

    async fn get_version(&self, version_id: VersionId) -> Result<Option<FloorPlanVersion>> {
        Ok(self.versions.read().unwrap().get(&version_id).cloned())
    }

    async fn find_version(
        &self,
        floor_id: FloorId,
        version_number: i32,
    ) -> Result<Option<FloorPlanVersion>> {
        Ok(self
            .versions
            .read()
            .unwrap()
            .values()
            .find(|v| v.floor_id == floor_id && v.version_number == version_number)
            .cloned())
    }

    async fn list_versions(&self, floor_id: FloorId) -> Result<Vec<FloorPlanVersion>> {
        let mut versions: Vec<FloorPlanVersion> = self
            .versions
            .read()
            .unwrap()
            .values()
            .filter(|v| v.floor_id == floor_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        Ok(versions)
    }

    async fn update_version(
        &self,
        version_id: VersionId,
        patch: &VersionPatch,
    ) -> Result<FloorPlanVersion> {
        let mut versions = self.versions.write().unwrap();
        let version = versions
            .get_mut(&version_id)
            .ok_or_else(|| StorageError::version_not_found(version_id))?;

        if let Some(scale) = patch.scale {
            version.scale = scale;
        }
        if let Some(ref notes) = patch.change_notes {
            version.change_notes = Some(notes.clone());
        }
        if let Some(is_active) = patch.is_active {
            version.is_active = is_active;
        }
        Ok(version.clone())
    }

    async fn insert_poi(&self, record: NewPoi) -> Result<PointOfInterest> {
        self.require_version(record.version_id)?;

        let poi = PointOfInterest {
            id: self.alloc_id(),
            version_id: record.version_id,
            name: record.name,
            category: record.category,
            poi_type: record.poi_type,
            x: record.x,
            y: record.y,
            description: record.description,
            properties: record.properties,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.pois.write().unwrap().insert(poi.id, poi.clone());
        Ok(poi)
    }

    async fn get_poi(&self, poi_id: PoiId) -> Result<Option<PointOfInterest>> {
        Ok(self.pois.read().unwrap().get(&poi_id).cloned())
    }

    async fn list_pois(&self, version_id: VersionId) -> Result<Vec<PointOfInterest>> {
        let mut pois: Vec<PointOfInterest> = self
            .pois
            .read()
            .unwrap()
            .values()
            .filter(|p| p.version_id == version_id && p.is_active)
            .cloned()
            .collect();
        pois.sort_by_key(|p| p.id);
        Ok(pois)
    }

    async fn update_poi(&self, poi_id: PoiId, patch: &PoiPatch) -> Result<PointOfInterest> {
        let mut pois = self.pois.write().unwrap();
        let poi = pois
            .get_mut(&poi_id)
            .ok_or_else(|| StorageError::poi_not_found(poi_id))?;

        if let Some(ref name) = patch.name {
            poi.name = name.clone();
        }
        if let Some(ref category) = patch.category {
            poi.category = category.clone();
        }
        if let Some(ref poi_type) = patch.poi_type {
            poi.poi_type = poi_type.clone();
        }
        if let Some(x) = patch.x {
            poi.x = x;
        }
        if let Some(y) = patch.y {
            poi.y = y;
        }
        if let Some(ref description) = patch.description {
            poi.description = Some(description.clone());
        }
        if let Some(ref properties) = patch.properties {
            poi.properties = properties.clone();
        }
        if let Some(is_active) = patch.is_active {
            poi.is_active = is_active;
        }
        poi.updated_at = Some(Utc::now());
        Ok(poi.clone())
    }

    async fn deactivate_poi(&self, poi_id: PoiId) -> Result<()> {
        let mut pois = self.pois.write().unwrap();
        let poi = pois
            .get_mut(&poi_id)
            .ok_or_else(|| StorageError::poi_not_found(poi_id))?;
        poi.is_active = false;
        poi.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn insert_node(&self, record: NewNode) -> Result<RoutingNode> {
        self.require_version(record.version_id)?;

        let node = RoutingNode {
            id: self.alloc_id(),
            version_id: record.version_id,
            x: record.x,
            y: record.y,
            kind: record.kind,
            properties: record.properties,
            is_active: true,
            created_at: Utc::now(),
        };
        self.nodes.write().unwrap().insert(node.id, node.clone());
        Ok(node)
    }

    async fn get_node(&self, node_id: NodeId) -> Result<Option<RoutingNode>> {
        Ok(self.nodes.read().unwrap().get(&node_id).cloned())
    }

    async fn list_nodes(&self, version_id: VersionId) -> Result<Vec<RoutingNode>> {
        let mut nodes: Vec<RoutingNode> = self
            .nodes
            .read()
            .unwrap()
            .values()
            .filter(|n| n.version_id == version_id && n.is_active)
            .cloned()
            .collect();
        nodes.sort_by_key(|n| n.id);
        Ok(nodes)
    }

    async fn deactivate_node(&self, node_id: NodeId) -> Result<()> {
        let mut nodes = self.nodes.write().unwrap();
        let node = nodes
            .get_mut(&node_id)
            .ok_or_else(|| StorageError::node_not_found(node_id))?;
        node.is_active = false;
        Ok(())
    }

    async fn insert_edge(&self, record: NewEdge) -> Result<RoutingEdge> {
        self.require_version(record.version_id)?;

        if record.distance < 0.0 {
            return Err(StorageError::invalid_reference(format!(
                "Edge distance must be >= 0, got {}",
                record.distance
            )));
        }

        {
            let nodes = self.nodes.read().unwrap();
            for node_id in [record.from_node_id, record.to_node_id] {
                match nodes.get(&node_id) {
                    None => {
                        return Err(StorageError::invalid_reference(format!(
                            "Edge endpoint node {} does not exist",
                            node_id
                        )));
                    }
                    Some(node) if !node.is_active => {
                        return Err(StorageError::invalid_reference(format!(
                            "Edge endpoint node {} is inactive",
                            node_id
                        )));
                    }
                    Some(node) if node.version_id != record.version_id => {
                        return Err(StorageError::invalid_reference(format!(
                            "Edge endpoint node {} belongs to version {}, edge targets version {}",
                            node_id, node.version_id, record.version_id
                        )));
                    }
                    Some(_) => {}
                }
            }
        }

        let edge = RoutingEdge {
            id: self.alloc_id(),
            version_id: record.version_id,
            from_node_id: record.from_node_id,
            to_node_id: record.to_node_id,
            distance: record.distance,
            travel_time: record.travel_time,
            kind: record.kind,
            is_bidirectional: record.is_bidirectional,
            properties: record.properties,
            is_active: true,
            created_at: Utc::now(),
        };
        self.edges.write().unwrap().insert(edge.id, edge.clone());
        Ok(edge)
    }

    async fn list_edges(&self, version_id: VersionId) -> Result<Vec<RoutingEdge>> {
        let mut edges: Vec<RoutingEdge> = self
            .edges
            .read()
            .unwrap()
            .values()
            .filter(|e| e.version_id == version_id && e.is_active)
            .cloned()
            .collect();
        edges.sort_by_key(|e| e.id);
        Ok(edges)
    }

    async fn deactivate_edge(&self, edge_id: EdgeId) -> Result<()> {
        let mut edges = self.edges.write().unwrap();
        let edge = edges
            .get_mut(&edge_id)
            .ok_or_else(|| StorageError::edge_not_found(edge_id))?;
        edge.is_active = false;
        Ok(())
    }

    async fn insert_publishing(&self, record: NewPublishing) -> Result<MapPublishing> {
        self.require_version(record.version_id)?;

        let publishing = MapPublishing {
            id: self.alloc_id(),
            floor_id: record.floor_id,
            version_id: record.version_id,
            status: record.status,
            published_at: None,
            published_by: record.published_by,
            review_notes: None,
            validation: record.validation,
            is_current: false,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.publishing
            .write()
            .unwrap()
            .insert(publishing.id, publishing.clone());
        Ok(publishing)
    }

    async fn get_publishing(&self, publishing_id: PublishingId) -> Result<Option<MapPublishing>> {
        Ok(self.publishing.read().unwrap().get(&publishing_id).cloned())
    }

    async fn update_publishing(
        &self,
        publishing_id: PublishingId,
        status: PublishingStatus,
        review_notes: Option<String>,
        published_by: Option<String>,
    ) -> Result<MapPublishing> {
        let mut publishing = self.publishing.write().unwrap();
        let record = publishing
            .get_mut(&publishing_id)
            .ok_or_else(|| StorageError::publishing_not_found(publishing_id))?;

        if !record.status.can_transition_to(status) {
            return Err(StorageError::invalid_transition(record.status, status));
        }

        record.status = status;
        if review_notes.is_some() {
            record.review_notes = review_notes;
        }
        if published_by.is_some() {
            record.published_by = published_by;
        }
        record.updated_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn list_publishing(&self, floor_id: FloorId) -> Result<Vec<MapPublishing>> {
        let mut records: Vec<MapPublishing> = self
            .publishing
            .read()
            .unwrap()
            .values()
            .filter(|p| p.floor_id == floor_id)
            .cloned()
            .collect();
        // created_at alone is not a total order under bursts, so the
        // insert-ordered id breaks ties.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn current_publishing(&self, floor_id: FloorId) -> Result<Option<MapPublishing>> {
        Ok(self
            .publishing
            .read()
            .unwrap()
            .values()
            .find(|p| p.floor_id == floor_id && p.is_current)
            .cloned())
    }

    async fn promote_to_current(&self, publishing_id: PublishingId) -> Result<MapPublishing> {
        // Single write lock over the whole map keeps the demote+promote
        // pair atomic under concurrent callers.
        let mut publishing = self.publishing.write().unwrap();

        let target = publishing
            .get(&publishing_id)
            .ok_or_else(|| StorageError::publishing_not_found(publishing_id))?
            .clone();

        if !target.status.can_transition_to(PublishingStatus::Published) {
            return Err(StorageError::invalid_transition(
                target.status,
                PublishingStatus::Published,
            ));
        }

        let now = Utc::now();
        for record in publishing.values_mut() {
            if record.floor_id == target.floor_id && record.is_current && record.id != publishing_id
            {
                record.is_current = false;
                record.status = PublishingStatus::Archived;
                record.updated_at = Some(now);
            }
        }

        let record = publishing
            .get_mut(&publishing_id)
            .ok_or_else(|| StorageError::publishing_not_found(publishing_id))?;
        record.status = PublishingStatus::Published;
        record.is_current = true;
        record.published_at = Some(now);
        record.updated_at = Some(now);
        Ok(record.clone())
    }
}
