//! Routing Graph Validator
//!
//! Pure connectivity and completeness checks over a version's active
//! POIs, nodes and edges. The result is a value: an invalid map is a
//! normal outcome, never an error. Results serialize into the frozen
//! validation snapshot on publishing records, so the whole tree is
//! `Serialize + PartialEq` and deterministic for identical inputs.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use floorgraph_storage::{
    EdgeId, MapStore, NodeId, PointOfInterest, Result, RoutingEdge, RoutingNode, StorageError,
    VersionId,
};

/// A single finding, fatal or advisory depending on which list it
/// lands in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ValidationIssue {
    NoPois,
    NoRoutingNodes,
    NoEdges,
    EdgesWithInactiveEndpoint { edge_ids: Vec<EdgeId> },
    DisconnectedNodes { node_ids: Vec<NodeId> },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::NoPois => write!(f, "No Points of Interest defined"),
            ValidationIssue::NoRoutingNodes => write!(f, "No routing nodes defined"),
            ValidationIssue::NoEdges => write!(f, "Routing nodes exist but no edges defined"),
            ValidationIssue::EdgesWithInactiveEndpoint { edge_ids } => {
                write!(
                    f,
                    "Edges reference missing or inactive nodes: {}",
                    format_ids(edge_ids)
                )
            }
            ValidationIssue::DisconnectedNodes { node_ids } => {
                write!(
                    f,
                    "Routing nodes disconnected from the main graph: {}",
                    format_ids(node_ids)
                )
            }
        }
    }
}

fn format_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Graph size summary, computed on every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub poi_count: usize,
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes reachable from the first node over usable edges
    pub main_component_size: usize,
}

/// Outcome of one validation run. `is_valid` holds exactly when
/// `errors` is empty; warnings never block publishing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    pub statistics: GraphStatistics,
}

/// Validate a version's graph from already-fetched active sets.
///
/// Checks, in order: POI presence, node presence (fatal when absent),
/// edge presence, endpoint liveness, and single-component
/// connectivity via undirected BFS from the first node. Edges whose
/// endpoints are missing from the active node set are reported and
/// excluded from the reachability graph.
pub fn validate(
    pois: &[PointOfInterest],
    nodes: &[RoutingNode],
    edges: &[RoutingEdge],
) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if pois.is_empty() {
        warnings.push(ValidationIssue::NoPois);
    }

    if nodes.is_empty() {
        errors.push(ValidationIssue::NoRoutingNodes);
    } else if edges.is_empty() {
        warnings.push(ValidationIssue::NoEdges);
    }

    let node_ids: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

    let mut dangling_edges: Vec<EdgeId> = edges
        .iter()
        .filter(|e| !node_ids.contains(&e.from_node_id) || !node_ids.contains(&e.to_node_id))
        .map(|e| e.id)
        .collect();
    dangling_edges.sort_unstable();
    if !dangling_edges.is_empty() {
        warnings.push(ValidationIssue::EdgesWithInactiveEndpoint {
            edge_ids: dangling_edges,
        });
    }

    let mut main_component_size = 0;
    if let Some(start) = nodes.first() {
        // Undirected adjacency over usable edges only; one-way edges
        // still count for reachability
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in edges {
            if node_ids.contains(&edge.from_node_id) && node_ids.contains(&edge.to_node_id) {
                adjacency
                    .entry(edge.from_node_id)
                    .or_default()
                    .push(edge.to_node_id);
                adjacency
                    .entry(edge.to_node_id)
                    .or_default()
                    .push(edge.from_node_id);
            }
        }

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(start.id);
        queue.push_back(start.id);
        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = adjacency.get(&current) {
                for &neighbor in neighbors {
                    if visited.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        main_component_size = visited.len();

        let mut disconnected: Vec<NodeId> = nodes
            .iter()
            .filter(|n| !visited.contains(&n.id))
            .map(|n| n.id)
            .collect();
        disconnected.sort_unstable();
        if !disconnected.is_empty() {
            warnings.push(ValidationIssue::DisconnectedNodes {
                node_ids: disconnected,
            });
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        statistics: GraphStatistics {
            poi_count: pois.len(),
            node_count: nodes.len(),
            edge_count: edges.len(),
            main_component_size,
        },
    }
}

/// Store-backed validator: fetches a version's active sets and
/// delegates to [`validate`]
pub struct MapValidator {
    store: Arc<dyn MapStore>,
}

impl MapValidator {
    pub fn new(store: Arc<dyn MapStore>) -> Self {
        Self { store }
    }

    pub async fn validate_version(&self, version_id: VersionId) -> Result<ValidationResult> {
        if self.store.get_version(version_id).await?.is_none() {
            return Err(StorageError::version_not_found(version_id));
        }

        let pois = self.store.list_pois(version_id).await?;
        let nodes = self.store.list_nodes(version_id).await?;
        let edges = self.store.list_edges(version_id).await?;

        let result = validate(&pois, &nodes, &edges);
        debug!(
            "Validated version {}: valid={} errors={} warnings={}",
            version_id,
            result.is_valid,
            result.errors.len(),
            result.warnings.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use floorgraph_storage::{EdgeKind, NodeKind};
    use serde_json::json;

    fn poi(id: i64, version_id: VersionId) -> PointOfInterest {
        PointOfInterest {
            id,
            version_id,
            name: format!("poi-{}", id),
            category: "room".into(),
            poi_type: "office".into(),
            x: 0.0,
            y: 0.0,
            description: None,
            properties: json!({}),
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn node(id: NodeId, version_id: VersionId) -> RoutingNode {
        RoutingNode {
            id,
            version_id,
            x: id as f64,
            y: 0.0,
            kind: NodeKind::Junction,
            properties: json!({}),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn edge(id: EdgeId, version_id: VersionId, from: NodeId, to: NodeId) -> RoutingEdge {
        RoutingEdge {
            id,
            version_id,
            from_node_id: from,
            to_node_id: to,
            distance: 1.0,
            travel_time: None,
            kind: EdgeKind::Walkway,
            is_bidirectional: true,
            properties: json!({}),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_graph_is_fatal() {
        let result = validate(&[], &[], &[]);

        assert!(!result.is_valid);
        assert_eq!(result.errors, vec![ValidationIssue::NoRoutingNodes]);
        assert_eq!(result.warnings, vec![ValidationIssue::NoPois]);
        assert_eq!(result.statistics.node_count, 0);
        assert_eq!(result.statistics.main_component_size, 0);
    }

    #[test]
    fn test_nodes_without_edges_is_valid_with_warnings() {
        let nodes = vec![node(1, 7), node(2, 7), node(3, 7)];
        let result = validate(&[poi(10, 7)], &nodes, &[]);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.contains(&ValidationIssue::NoEdges));
        assert!(result
            .warnings
            .contains(&ValidationIssue::DisconnectedNodes {
                node_ids: vec![2, 3]
            }));
        assert_eq!(result.statistics.main_component_size, 1);
    }

    #[test]
    fn test_isolated_node_flagged() {
        // A-B, B-C connected; D isolated
        let nodes = vec![node(1, 7), node(2, 7), node(3, 7), node(4, 7)];
        let edges = vec![edge(10, 7, 1, 2), edge(11, 7, 2, 3)];
        let result = validate(&[poi(20, 7)], &nodes, &edges);

        assert!(result.is_valid);
        assert_eq!(
            result.warnings,
            vec![ValidationIssue::DisconnectedNodes { node_ids: vec![4] }]
        );
        assert_eq!(result.statistics.main_component_size, 3);
    }

    #[test]
    fn test_dangling_edge_excluded_from_reachability() {
        // Edge 11 references node 9 which is not in the active set, so
        // it is flagged and must not connect node 3
        let nodes = vec![node(1, 7), node(2, 7), node(3, 7)];
        let edges = vec![edge(10, 7, 1, 2), edge(11, 7, 3, 9)];
        let result = validate(&[poi(20, 7)], &nodes, &edges);

        assert!(result.is_valid);
        assert!(result
            .warnings
            .contains(&ValidationIssue::EdgesWithInactiveEndpoint { edge_ids: vec![11] }));
        assert!(result
            .warnings
            .contains(&ValidationIssue::DisconnectedNodes { node_ids: vec![3] }));
        assert_eq!(result.statistics.edge_count, 2);
        assert_eq!(result.statistics.main_component_size, 2);
    }

    #[test]
    fn test_fully_connected_graph_is_clean() {
        let nodes = vec![node(1, 7), node(2, 7), node(3, 7)];
        let edges = vec![edge(10, 7, 1, 2), edge(11, 7, 2, 3)];
        let result = validate(&[poi(20, 7)], &nodes, &edges);

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.statistics.main_component_size, 3);
    }

    #[test]
    fn test_validation_is_deterministic() {
        let nodes = vec![node(1, 7), node(2, 7), node(3, 7), node(4, 7)];
        let edges = vec![edge(10, 7, 1, 2), edge(11, 7, 3, 9)];

        let first = validate(&[], &nodes, &edges);
        let second = validate(&[], &nodes, &edges);
        assert_eq!(first, second);
    }

    #[test]
    fn test_issue_serialization_shape() {
        let issue = ValidationIssue::DisconnectedNodes {
            node_ids: vec![4, 7],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["code"], "disconnected_nodes");
        assert_eq!(json["node_ids"], json!([4, 7]));

        assert_eq!(
            issue.to_string(),
            "Routing nodes disconnected from the main graph: 4, 7"
        );
    }

    #[tokio::test]
    async fn test_validator_requires_existing_version() {
        use floorgraph_storage::InMemoryMapStore;

        let validator = MapValidator::new(Arc::new(InMemoryMapStore::new()));
        let err = validator.validate_version(99).await.unwrap_err();
        assert_eq!(err.kind, floorgraph_storage::ErrorKind::VersionNotFound);
    }
}
