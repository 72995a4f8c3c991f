//! Publishing Coordinator
//!
//! Drives a version through the publishing lifecycle: publish runs
//! validation and parks the record in Review (valid) or Draft
//! (invalid) with the validation result frozen onto it; approve,
//! reject and promote move it on from there. Promotion delegates to
//! the store so the one-current-per-floor swap stays atomic.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use floorgraph_storage::{
    FloorId, MapPublishing, MapStore, NewPublishing, PublishingId, PublishingStatus, Result,
    StorageError, VersionId,
};

use crate::validation::{MapValidator, ValidationResult};

/// What came out of a publish call: the frozen validation, the status
/// the record landed in, and what the author should do next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishWorkflow {
    pub publishing_id: PublishingId,
    pub version_id: VersionId,
    pub floor_id: FloorId,
    pub validation: ValidationResult,
    pub status: PublishingStatus,
    pub next_steps: Vec<String>,
}

pub struct PublishingCoordinator {
    store: Arc<dyn MapStore>,
    validator: MapValidator,
}

impl PublishingCoordinator {
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        let validator = MapValidator::new(store.clone());
        Self { store, validator }
    }

    /// Validate a version and open a publishing record for it
    ///
    /// An invalid map is not an error: the record lands in Draft with
    /// fix-it next steps. A valid map lands in Review.
    pub async fn publish(
        &self,
        version_id: VersionId,
        published_by: Option<String>,
    ) -> Result<PublishWorkflow> {
        let version = self
            .store
            .get_version(version_id)
            .await?
            .ok_or_else(|| StorageError::version_not_found(version_id))?;

        let validation = self.validator.validate_version(version_id).await?;

        let (status, next_steps) = if validation.is_valid {
            (
                PublishingStatus::Review,
                vec![
                    "Review map".to_string(),
                    "Approve for publishing".to_string(),
                ],
            )
        } else {
            (
                PublishingStatus::Draft,
                vec![
                    "Fix validation errors".to_string(),
                    "Re-validate map".to_string(),
                ],
            )
        };

        let record = self
            .store
            .insert_publishing(NewPublishing {
                floor_id: version.floor_id,
                version_id,
                status,
                published_by,
                validation: serde_json::to_value(&validation)?,
            })
            .await?;

        info!(
            "Opened publishing record {}: floor={} version={} status={}",
            record.id, record.floor_id, version_id, status
        );

        Ok(PublishWorkflow {
            publishing_id: record.id,
            version_id,
            floor_id: record.floor_id,
            validation,
            status,
            next_steps,
        })
    }

    /// Review → Approved
    pub async fn approve(
        &self,
        publishing_id: PublishingId,
        reviewer: String,
        notes: Option<String>,
    ) -> Result<MapPublishing> {
        self.store
            .update_publishing(
                publishing_id,
                PublishingStatus::Approved,
                notes,
                Some(reviewer),
            )
            .await
    }

    /// Review → Draft (send back to the author)
    pub async fn reject(
        &self,
        publishing_id: PublishingId,
        reviewer: String,
        notes: Option<String>,
    ) -> Result<MapPublishing> {
        self.store
            .update_publishing(publishing_id, PublishingStatus::Draft, notes, Some(reviewer))
            .await
    }

    /// Approved → Published, swapping the floor's current map
    pub async fn promote(&self, publishing_id: PublishingId) -> Result<MapPublishing> {
        let record = self.store.promote_to_current(publishing_id).await?;
        info!(
            "Promoted publishing record {} to current for floor {}",
            record.id, record.floor_id
        );
        Ok(record)
    }

    /// A floor's publishing history, newest first
    pub async fn history(&self, floor_id: FloorId) -> Result<Vec<MapPublishing>> {
        self.store.list_publishing(floor_id).await
    }

    /// The floor's current published record, if any
    pub async fn current(&self, floor_id: FloorId) -> Result<Option<MapPublishing>> {
        self.store.current_publishing(floor_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_storage::{
        ArtifactKind, EdgeKind, ErrorKind, InMemoryMapStore, NewEdge, NewNode, NewPoi,
        NewVersionRecord, NodeKind,
    };
    use serde_json::json;

    async fn version_with_graph(store: &InMemoryMapStore, floor_id: FloorId) -> VersionId {
        let version = store
            .insert_version(NewVersionRecord {
                floor_id,
                version_number: 1,
                artifact_ref: "plan.png".into(),
                artifact_kind: ArtifactKind::Image,
                file_size: None,
                pixel_size: None,
                scale: 1.0,
                change_notes: None,
                created_by: None,
            })
            .await
            .unwrap();

        store
            .insert_poi(NewPoi {
                version_id: version.id,
                name: "Lobby".into(),
                category: "room".into(),
                poi_type: "lobby".into(),
                x: 0.0,
                y: 0.0,
                description: None,
                properties: json!({}),
            })
            .await
            .unwrap();

        let a = store
            .insert_node(NewNode {
                version_id: version.id,
                x: 0.0,
                y: 0.0,
                kind: NodeKind::Junction,
                properties: json!({}),
            })
            .await
            .unwrap();
        let b = store
            .insert_node(NewNode {
                version_id: version.id,
                x: 1.0,
                y: 0.0,
                kind: NodeKind::Junction,
                properties: json!({}),
            })
            .await
            .unwrap();
        store
            .insert_edge(NewEdge {
                version_id: version.id,
                from_node_id: a.id,
                to_node_id: b.id,
                distance: 1.0,
                travel_time: None,
                kind: EdgeKind::Walkway,
                is_bidirectional: true,
                properties: json!({}),
            })
            .await
            .unwrap();

        version.id
    }

    async fn empty_version(store: &InMemoryMapStore, floor_id: FloorId) -> VersionId {
        store
            .insert_version(NewVersionRecord {
                floor_id,
                version_number: 1,
                artifact_ref: "plan.png".into(),
                artifact_kind: ArtifactKind::Image,
                file_size: None,
                pixel_size: None,
                scale: 1.0,
                change_notes: None,
                created_by: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_publish_valid_version_goes_to_review() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = version_with_graph(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store.clone());

        let workflow = coordinator
            .publish(version_id, Some("frank".into()))
            .await
            .unwrap();

        assert_eq!(workflow.status, PublishingStatus::Review);
        assert!(workflow.validation.is_valid);
        assert_eq!(
            workflow.next_steps,
            vec!["Review map", "Approve for publishing"]
        );

        let record = store
            .get_publishing(workflow.publishing_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, PublishingStatus::Review);
        assert!(!record.is_current);
        assert_eq!(record.validation["is_valid"], json!(true));
    }

    #[tokio::test]
    async fn test_publish_invalid_version_goes_to_draft() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = empty_version(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store.clone());

        let workflow = coordinator.publish(version_id, None).await.unwrap();

        assert_eq!(workflow.status, PublishingStatus::Draft);
        assert!(!workflow.validation.is_valid);
        assert_eq!(
            workflow.next_steps,
            vec!["Fix validation errors", "Re-validate map"]
        );

        // The frozen snapshot carries the findings
        let record = store
            .get_publishing(workflow.publishing_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            record.validation["errors"][0]["code"],
            json!("no_routing_nodes")
        );
    }

    #[tokio::test]
    async fn test_publish_unknown_version() {
        let store = Arc::new(InMemoryMapStore::new());
        let coordinator = PublishingCoordinator::new(store);
        let err = coordinator.publish(123, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::VersionNotFound);
    }

    #[tokio::test]
    async fn test_approve_then_promote() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = version_with_graph(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store.clone());

        let workflow = coordinator.publish(version_id, None).await.unwrap();
        let approved = coordinator
            .approve(workflow.publishing_id, "grace".into(), Some("ok".into()))
            .await
            .unwrap();
        assert_eq!(approved.status, PublishingStatus::Approved);
        assert_eq!(approved.published_by.as_deref(), Some("grace"));

        let published = coordinator.promote(workflow.publishing_id).await.unwrap();
        assert_eq!(published.status, PublishingStatus::Published);
        assert!(published.is_current);

        let current = coordinator.current(1).await.unwrap().unwrap();
        assert_eq!(current.id, workflow.publishing_id);
    }

    #[tokio::test]
    async fn test_reject_sends_back_to_draft() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = version_with_graph(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store);

        let workflow = coordinator.publish(version_id, None).await.unwrap();
        let rejected = coordinator
            .reject(
                workflow.publishing_id,
                "heidi".into(),
                Some("scale looks off".into()),
            )
            .await
            .unwrap();

        assert_eq!(rejected.status, PublishingStatus::Draft);
        assert_eq!(rejected.review_notes.as_deref(), Some("scale looks off"));
    }

    #[tokio::test]
    async fn test_promote_without_approval_rejected() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = version_with_graph(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store);

        let workflow = coordinator.publish(version_id, None).await.unwrap();
        let err = coordinator
            .promote(workflow.publishing_id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidTransition);
    }

    #[tokio::test]
    async fn test_history_is_newest_first_and_read_only() {
        let store = Arc::new(InMemoryMapStore::new());
        let version_id = version_with_graph(&store, 1).await;
        let coordinator = PublishingCoordinator::new(store);

        let first = coordinator.publish(version_id, None).await.unwrap();
        let second = coordinator.publish(version_id, None).await.unwrap();

        let history = coordinator.history(1).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.publishing_id);
        assert_eq!(history[1].id, first.publishing_id);
        assert_eq!(history[1].status, PublishingStatus::Review);
    }
}
