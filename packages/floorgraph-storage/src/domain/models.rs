//! Map Domain Models
//!
//! Versioned floor-plan artifacts with:
//! - Unique (floor_id, version_number) pairs per floor
//! - Soft Delete (`is_active` flag, reads filter, writes flip)
//! - Per-version POI and routing graph ownership
//! - Publishing lifecycle (draft → review → approved → published → archived)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Floor ID (assigned by the floor directory, opaque here)
pub type FloorId = i64;

/// Floor plan version ID (primary key)
pub type VersionId = i64;

/// POI ID (primary key)
pub type PoiId = i64;

/// Routing node ID (primary key)
pub type NodeId = i64;

/// Routing edge ID (primary key)
pub type EdgeId = i64;

/// Publishing record ID (primary key)
pub type PublishingId = i64;

/// Artifact kind (what the blob reference points at)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Raster floor plan (png, jpeg, ...)
    Image,
    /// PDF floor plan (no pixel size)
    Pdf,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Pdf => "pdf",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(ArtifactKind::Image),
            "pdf" => Some(ArtifactKind::Pdf),
            _ => None,
        }
    }
}

/// Floor Plan Version Entity
///
/// One immutable artifact per version; only `scale`, `change_notes`
/// and `is_active` are mutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorPlanVersion {
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Identity
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// Version ID (primary key)
    pub id: VersionId,

    /// Floor ID (foreign key into the floor directory)
    pub floor_id: FloorId,

    /// Version number (unique per floor)
    pub version_number: i32,

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Artifact
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// Opaque blob store reference for the uploaded bytes
    pub artifact_ref: String,

    /// Artifact kind
    pub artifact_kind: ArtifactKind,

    /// Uploaded file size in bytes, if known
    pub file_size: Option<u64>,

    /// (width, height) in pixels; `None` for PDF artifacts
    pub pixel_size: Option<(f64, f64)>,

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Metadata (mutable)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    /// Meters-per-pixel calibration factor (default 1.0)
    pub scale: f64,

    /// Free-text notes describing this revision
    pub change_notes: Option<String>,

    /// Uploader label (opaque, no authn semantics)
    pub created_by: Option<String>,

    /// Soft delete flag
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Point of Interest Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// POI ID (primary key)
    pub id: PoiId,

    /// Owning version ID (foreign key)
    pub version_id: VersionId,

    /// Display name
    pub name: String,

    /// Category (e.g., "room", "facility", "exit")
    pub category: String,

    /// Finer-grained type within the category
    pub poi_type: String,

    /// X coordinate in the version's coordinate space
    pub x: f64,

    /// Y coordinate in the version's coordinate space
    pub y: f64,

    /// Optional long description
    pub description: Option<String>,

    /// Flexible JSON attributes
    pub properties: serde_json::Value,

    /// Soft delete flag
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp (set on update, never on insert)
    pub updated_at: Option<DateTime<Utc>>,
}

/// Routing Node Kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain corridor junction
    Junction,
    /// Point where wayfinding instructions branch
    DecisionPoint,
    /// Node anchoring a POI to the graph
    PoiConnection,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Junction => "junction",
            NodeKind::DecisionPoint => "decision_point",
            NodeKind::PoiConnection => "poi_connection",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "junction" => Some(NodeKind::Junction),
            "decision_point" => Some(NodeKind::DecisionPoint),
            "poi_connection" => Some(NodeKind::PoiConnection),
            _ => None,
        }
    }
}

/// Routing Node Entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingNode {
    /// Node ID (primary key)
    pub id: NodeId,

    /// Owning version ID (foreign key)
    pub version_id: VersionId,

    /// X coordinate
    pub x: f64,

    /// Y coordinate
    pub y: f64,

    /// Node kind
    pub kind: NodeKind,

    /// Flexible JSON attributes
    pub properties: serde_json::Value,

    /// Soft delete flag
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Routing Edge Kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Walkway,
    Elevator,
    Stairs,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Walkway => "walkway",
            EdgeKind::Elevator => "elevator",
            EdgeKind::Stairs => "stairs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "walkway" => Some(EdgeKind::Walkway),
            "elevator" => Some(EdgeKind::Elevator),
            "stairs" => Some(EdgeKind::Stairs),
            _ => None,
        }
    }
}

/// Routing Edge Entity
///
/// Both endpoints must be existing, active nodes of the same version;
/// the store rejects anything else with `InvalidReference`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingEdge {
    /// Edge ID (primary key)
    pub id: EdgeId,

    /// Owning version ID (foreign key)
    pub version_id: VersionId,

    /// Source node ID
    pub from_node_id: NodeId,

    /// Target node ID
    pub to_node_id: NodeId,

    /// Length in meters (>= 0)
    pub distance: f64,

    /// Traversal time in seconds, if measured
    pub travel_time: Option<f64>,

    /// Edge kind
    pub kind: EdgeKind,

    /// Traversable both ways (default true)
    pub is_bidirectional: bool,

    /// Flexible JSON attributes
    pub properties: serde_json::Value,

    /// Soft delete flag
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Publishing lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishingStatus {
    Draft,
    Review,
    Approved,
    Published,
    Archived,
}

impl PublishingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishingStatus::Draft => "draft",
            PublishingStatus::Review => "review",
            PublishingStatus::Approved => "approved",
            PublishingStatus::Published => "published",
            PublishingStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(PublishingStatus::Draft),
            "review" => Some(PublishingStatus::Review),
            "approved" => Some(PublishingStatus::Approved),
            "published" => Some(PublishingStatus::Published),
            "archived" => Some(PublishingStatus::Archived),
            _ => None,
        }
    }

    /// Allowed status transitions. Archived is terminal; a rejected
    /// review goes back to Draft.
    pub fn can_transition_to(&self, next: PublishingStatus) -> bool {
        use PublishingStatus::*;
        matches!(
            (self, next),
            (Draft, Review)
                | (Review, Approved)
                | (Review, Draft)
                | (Approved, Published)
                | (Published, Archived)
        )
    }
}

impl std::fmt::Display for PublishingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Map Publishing Entity
///
/// One record per publish attempt. At most one record per floor has
/// `is_current = true`; the store's promote operation maintains that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapPublishing {
    /// Publishing ID (primary key)
    pub id: PublishingId,

    /// Floor ID (foreign key into the floor directory)
    pub floor_id: FloorId,

    /// Version being published (foreign key)
    pub version_id: VersionId,

    /// Lifecycle status
    pub status: PublishingStatus,

    /// Set when the record is promoted to current
    pub published_at: Option<DateTime<Utc>>,

    /// Publisher label (opaque)
    pub published_by: Option<String>,

    /// Reviewer notes from approve/reject
    pub review_notes: Option<String>,

    /// Frozen validation snapshot taken at publish time
    pub validation: serde_json::Value,

    /// Whether this record is the floor's current published map
    pub is_current: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update for a floor plan version. `None` fields are left
/// untouched; everything not listed here is immutable after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionPatch {
    pub scale: Option<f64>,
    pub change_notes: Option<String>,
    pub is_active: Option<bool>,
}

/// Partial update for a point of interest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoiPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub poi_type: Option<String>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub description: Option<String>,
    pub properties: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// Single WiFi observation within a fingerprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiReading {
    /// Access point BSSID
    pub bssid: String,

    /// Received signal strength (dBm)
    pub rssi: i32,
}

/// Calibration fingerprint captured at a known coordinate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fingerprint {
    pub id: i64,
    pub floor_id: FloorId,
    pub x: f64,
    pub y: f64,
    pub device_model: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub wifi_scans: Vec<WifiReading>,
}

/// One projected point in a floor's radio map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadioMapPoint {
    pub x: f64,
    pub y: f64,
    pub wifi_scans: Vec<WifiReading>,
}

/// Radio map for a floor: every fingerprint projected as-is, duplicates
/// preserved. Consumers dedup/aggregate downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioMap {
    pub floor_id: FloorId,
    pub points: Vec<RadioMapPoint>,
}
