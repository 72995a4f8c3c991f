//! Map Store Port (Trait Interface)
//!
//! Port/Adapter pattern for backend flexibility:
//! - Development/production: SQLite (zero-config, single file)
//! - Testing: InMemory (fast unit tests)
//!
//! Relational invariants (unique version pairs, edge endpoint checks,
//! the one-current-per-floor rule) live in the adapters so every
//! backend enforces them identically.

use async_trait::async_trait;

use super::models::{
    ArtifactKind, EdgeId, EdgeKind, FloorId, FloorPlanVersion, MapPublishing, NodeId, NodeKind,
    PointOfInterest, PoiId, PoiPatch, PublishingId, PublishingStatus, RoutingEdge, RoutingNode,
    VersionId, VersionPatch,
};
use crate::error::Result;

/// Input record for creating a floor plan version. The store assigns
/// `id`, `is_active` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewVersionRecord {
    pub floor_id: FloorId,
    pub version_number: i32,
    pub artifact_ref: String,
    pub artifact_kind: ArtifactKind,
    pub file_size: Option<u64>,
    pub pixel_size: Option<(f64, f64)>,
    pub scale: f64,
    pub change_notes: Option<String>,
    pub created_by: Option<String>,
}

/// Input record for creating a POI
#[derive(Debug, Clone)]
pub struct NewPoi {
    pub version_id: VersionId,
    pub name: String,
    pub category: String,
    pub poi_type: String,
    pub x: f64,
    pub y: f64,
    pub description: Option<String>,
    pub properties: serde_json::Value,
}

/// Input record for creating a routing node
#[derive(Debug, Clone)]
pub struct NewNode {
    pub version_id: VersionId,
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    pub properties: serde_json::Value,
}

/// Input record for creating a routing edge
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub version_id: VersionId,
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    pub distance: f64,
    pub travel_time: Option<f64>,
    pub kind: EdgeKind,
    pub is_bidirectional: bool,
    pub properties: serde_json::Value,
}

/// Input record for creating a publishing record
#[derive(Debug, Clone)]
pub struct NewPublishing {
    pub floor_id: FloorId,
    pub version_id: VersionId,
    pub status: PublishingStatus,
    pub published_by: Option<String>,
    pub validation: serde_json::Value,
}

/// Map Store Port (Primary Interface)
///
/// All storage backends must implement this trait
#[async_trait]
pub trait MapStore: Send + Sync {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Floor Plan Versions
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a new version
    ///
    /// Rejects an existing (floor_id, version_number) pair with
    /// `DuplicateVersion`; nothing is persisted in that case.
    async fn insert_version(&self, record: NewVersionRecord) -> Result<FloorPlanVersion>;

    /// Get version by ID
    async fn get_version(&self, version_id: VersionId) -> Result<Option<FloorPlanVersion>>;

    /// Look up a version by its (floor_id, version_number) pair
    async fn find_version(
        &self,
        floor_id: FloorId,
        version_number: i32,
    ) -> Result<Option<FloorPlanVersion>>;

    /// List all versions of a floor, version_number descending
    async fn list_versions(&self, floor_id: FloorId) -> Result<Vec<FloorPlanVersion>>;

    /// Apply a patch to a version's mutable fields
    async fn update_version(
        &self,
        version_id: VersionId,
        patch: &VersionPatch,
    ) -> Result<FloorPlanVersion>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Points of Interest
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a POI; the owning version must exist
    async fn insert_poi(&self, record: NewPoi) -> Result<PointOfInterest>;

    /// Get POI by ID (active or not)
    async fn get_poi(&self, poi_id: PoiId) -> Result<Option<PointOfInterest>>;

    /// List active POIs of a version, id ascending
    async fn list_pois(&self, version_id: VersionId) -> Result<Vec<PointOfInterest>>;

    /// Apply a patch to a POI; bumps `updated_at`
    async fn update_poi(&self, poi_id: PoiId, patch: &PoiPatch) -> Result<PointOfInterest>;

    /// Soft-delete a POI
    async fn deactivate_poi(&self, poi_id: PoiId) -> Result<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Routing Nodes
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a routing node; the owning version must exist
    async fn insert_node(&self, record: NewNode) -> Result<RoutingNode>;

    /// Get node by ID (active or not)
    async fn get_node(&self, node_id: NodeId) -> Result<Option<RoutingNode>>;

    /// List active nodes of a version, id ascending
    async fn list_nodes(&self, version_id: VersionId) -> Result<Vec<RoutingNode>>;

    /// Soft-delete a node. Dependent edges are left untouched; the
    /// validator reports them as dangling.
    async fn deactivate_node(&self, node_id: NodeId) -> Result<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Routing Edges
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a routing edge
    ///
    /// Both endpoints must be existing, active nodes owned by the same
    /// version as the edge, and `distance` must be >= 0; otherwise
    /// `InvalidReference` and nothing is persisted.
    async fn insert_edge(&self, record: NewEdge) -> Result<RoutingEdge>;

    /// List active edges of a version, id ascending
    async fn list_edges(&self, version_id: VersionId) -> Result<Vec<RoutingEdge>>;

    /// Soft-delete an edge
    async fn deactivate_edge(&self, edge_id: EdgeId) -> Result<()>;

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Publishing
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Insert a publishing record (`is_current` starts false)
    async fn insert_publishing(&self, record: NewPublishing) -> Result<MapPublishing>;

    /// Get publishing record by ID
    async fn get_publishing(&self, publishing_id: PublishingId) -> Result<Option<MapPublishing>>;

    /// Transition a publishing record's status
    ///
    /// Rejects transitions `can_transition_to` disallows with
    /// `InvalidTransition`. Notes and publisher label are overwritten
    /// when given.
    async fn update_publishing(
        &self,
        publishing_id: PublishingId,
        status: PublishingStatus,
        review_notes: Option<String>,
        published_by: Option<String>,
    ) -> Result<MapPublishing>;

    /// List a floor's publishing records, newest first
    async fn list_publishing(&self, floor_id: FloorId) -> Result<Vec<MapPublishing>>;

    /// The floor's current published record, if any
    async fn current_publishing(&self, floor_id: FloorId) -> Result<Option<MapPublishing>>;

    /// Promote an Approved record to the floor's current published map
    ///
    /// Atomically sets the record to Published with `is_current = true`
    /// and `published_at = now`, and demotes whichever record was
    /// current for the floor to Archived with `is_current = false`.
    /// Concurrent promotions serialize; at most one record per floor is
    /// ever current.
    async fn promote_to_current(&self, publishing_id: PublishingId) -> Result<MapPublishing>;
}
