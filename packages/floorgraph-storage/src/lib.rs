//! floorgraph-storage - Persistent store for floor-plan map versions
//!
//! ## Core Principles
//!
//! 1. **Versioned floors**: a floor's map history is a sequence of
//!    immutable artifact versions; `(floor_id, version_number)` is unique
//! 2. **Per-version ownership**: POIs, routing nodes and routing edges
//!    belong to exactly one version and never cross version boundaries
//! 3. **Soft delete**: rows are deactivated, never removed; list reads
//!    filter on `is_active`, direct gets do not
//! 4. **One current map per floor**: promotion atomically swaps the
//!    floor's current publishing record
//!
//! ## Usage
//!
//! ```rust,ignore
//! use floorgraph_storage::{MapStore, SqliteMapStore, NewVersionRecord};
//!
//! let store = SqliteMapStore::new("maps.db")?;
//!
//! // 1. Record an uploaded floor plan version
//! let version = store.insert_version(record).await?;
//!
//! // 2. Author its POIs and routing graph
//! let poi = store.insert_poi(new_poi).await?;
//! let node = store.insert_node(new_node).await?;
//! let edge = store.insert_edge(new_edge).await?;
//!
//! // 3. Publish and promote
//! let publishing = store.insert_publishing(new_publishing).await?;
//! store.promote_to_current(publishing.id).await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use error::{ErrorKind, Result, StorageError};

// Domain re-exports
pub use domain::models::{
    ArtifactKind, EdgeId, EdgeKind, Fingerprint, FloorId, FloorPlanVersion, MapPublishing, NodeId,
    NodeKind, PointOfInterest, PoiId, PoiPatch, PublishingId, PublishingStatus, RadioMap,
    RadioMapPoint, RoutingEdge, RoutingNode, VersionId, VersionPatch, WifiReading,
};
pub use domain::ports::{MapStore, NewEdge, NewNode, NewPoi, NewPublishing, NewVersionRecord};

pub use infrastructure::InMemoryMapStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteMapStore;
