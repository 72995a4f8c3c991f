//! floorgraph-authoring - Floor-plan map lifecycle services
//!
//! Built on the `floorgraph-storage` store port, this crate covers
//! everything between an uploaded floor plan and a floor's current
//! published map:
//!
//! - [`versioning::VersionManager`]: artifact upload + version rows,
//!   with blob rollback if the metadata insert fails
//! - [`validation::MapValidator`]: routing graph completeness and
//!   connectivity checks; invalid is a value, not an error
//! - [`publishing::PublishingCoordinator`]: publish / approve / reject
//!   / promote, one current map per floor
//! - [`radio_map::RadioMapIndex`]: fingerprint projection for
//!   positioning consumers
//!
//! External systems (floor directory, blob store, fingerprint source)
//! sit behind the traits in [`ports`].

pub mod artifact;
pub mod ports;
pub mod publishing;
pub mod radio_map;
pub mod validation;
pub mod versioning;

pub use artifact::{FsBlobStore, MemoryBlobStore};
pub use ports::{
    BlobStore, FingerprintSource, FloorDirectory, MemoryFingerprintSource, StaticFloorDirectory,
};
pub use publishing::{PublishWorkflow, PublishingCoordinator};
pub use radio_map::RadioMapIndex;
pub use validation::{validate, GraphStatistics, MapValidator, ValidationIssue, ValidationResult};
pub use versioning::{NewVersion, VersionManager};
