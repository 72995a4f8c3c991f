///! SQLite Map Store
///!
///! File-based persistent storage using SQLite.
///! One schema, five tables, invariants enforced in the adapter with a
///! UNIQUE index as backstop for the version pair.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::domain::models::{
    ArtifactKind, EdgeId, EdgeKind, FloorId, FloorPlanVersion, MapPublishing, NodeId, NodeKind,
    PointOfInterest, PoiId, PoiPatch, PublishingId, PublishingStatus, RoutingEdge, RoutingNode,
    VersionId, VersionPatch,
};
use crate::domain::ports::{MapStore, NewEdge, NewNode, NewPoi, NewPublishing, NewVersionRecord};
use crate::error::{Result, StorageError};

const VERSION_COLUMNS: &str = "id, floor_id, version_number, artifact_ref, artifact_kind, \
     file_size, pixel_width, pixel_height, scale, change_notes, created_by, is_active, created_at";

const POI_COLUMNS: &str = "id, version_id, name, category, poi_type, x, y, description, \
     properties, is_active, created_at, updated_at";

const NODE_COLUMNS: &str = "id, version_id, x, y, kind, properties, is_active, created_at";

const EDGE_COLUMNS: &str = "id, version_id, from_node_id, to_node_id, distance, travel_time, \
     kind, is_bidirectional, properties, is_active, created_at";

const PUBLISHING_COLUMNS: &str = "id, floor_id, version_id, status, published_at, published_by, \
     review_notes, validation, is_current, created_at, updated_at";

fn timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(ts, 0).unwrap_or_default()
}

fn opt_timestamp(ts: Option<i64>) -> Option<DateTime<Utc>> {
    ts.map(timestamp)
}

fn json_column(text: Option<String>) -> serde_json::Value {
    text.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Null)
}

fn map_version(row: &Row<'_>) -> rusqlite::Result<FloorPlanVersion> {
    let kind: String = row.get(4)?;
    let file_size: Option<i64> = row.get(5)?;
    let pixel_width: Option<f64> = row.get(6)?;
    let pixel_height: Option<f64> = row.get(7)?;
    Ok(FloorPlanVersion {
        id: row.get(0)?,
        floor_id: row.get(1)?,
        version_number: row.get(2)?,
        artifact_ref: row.get(3)?,
        artifact_kind: ArtifactKind::parse(&kind).unwrap_or(ArtifactKind::Image),
        file_size: file_size.map(|s| s as u64),
        pixel_size: pixel_width.zip(pixel_height),
        scale: row.get(8)?,
        change_notes: row.get(9)?,
        created_by: row.get(10)?,
        is_active: row.get(11)?,
        created_at: timestamp(row.get(12)?),
    })
}

fn map_poi(row: &Row<'_>) -> rusqlite::Result<PointOfInterest> {
    let properties: Option<String> = row.get(8)?;
    let updated_at: Option<i64> = row.get(11)?;
    Ok(PointOfInterest {
        id: row.get(0)?,
        version_id: row.get(1)?,
        name: row.get(2)?,
        category: row.get(3)?,
        poi_type: row.get(4)?,
        x: row.get(5)?,
        y: row.get(6)?,
        description: row.get(7)?,
        properties: json_column(properties),
        is_active: row.get(9)?,
        created_at: timestamp(row.get(10)?),
        updated_at: opt_timestamp(updated_at),
    })
}

fn map_node(row: &Row<'_>) -> rusqlite::Result<RoutingNode> {
    let kind: String = row.get(4)?;
    let properties: Option<String> = row.get(5)?;
    Ok(RoutingNode {
        id: row.get(0)?,
        version_id: row.get(1)?,
        x: row.get(2)?,
        y: row.get(3)?,
        kind: NodeKind::parse(&kind).unwrap_or(NodeKind::Junction),
        properties: json_column(properties),
        is_active: row.get(6)?,
        created_at: timestamp(row.get(7)?),
    })
}

fn map_edge(row: &Row<'_>) -> rusqlite::Result<RoutingEdge> {
    let kind: String = row.get(6)?;
    let properties: Option<String> = row.get(8)?;
    Ok(RoutingEdge {
        id: row.get(0)?,
        version_id: row.get(1)?,
        from_node_id: row.get(2)?,
        to_node_id: row.get(3)?,
        distance: row.get(4)?,
        travel_time: row.get(5)?,
        kind: EdgeKind::parse(&kind).unwrap_or(EdgeKind::Walkway),
        is_bidirectional: row.get(7)?,
        properties: json_column(properties),
        is_active: row.get(9)?,
        created_at: timestamp(row.get(10)?),
    })
}

fn map_publishing(row: &Row<'_>) -> rusqlite::Result<MapPublishing> {
    let status: String = row.get(3)?;
    let published_at: Option<i64> = row.get(4)?;
    let validation: Option<String> = row.get(7)?;
    let updated_at: Option<i64> = row.get(10)?;
    Ok(MapPublishing {
        id: row.get(0)?,
        floor_id: row.get(1)?,
        version_id: row.get(2)?,
        status: PublishingStatus::parse(&status).unwrap_or(PublishingStatus::Draft),
        published_at: opt_timestamp(published_at),
        published_by: row.get(5)?,
        review_notes: row.get(6)?,
        validation: json_column(validation),
        is_current: row.get(8)?,
        created_at: timestamp(row.get(9)?),
        updated_at: opt_timestamp(updated_at),
    })
}

/// SQLite-based MapStore implementation
#[derive(Clone)]
pub struct SqliteMapStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteMapStore {
    /// Create a new SQLite store at the given path
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS floor_plan_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                floor_id INTEGER NOT NULL,
                version_number INTEGER NOT NULL,
                artifact_ref TEXT NOT NULL,
                artifact_kind TEXT NOT NULL,
                file_size INTEGER,
                pixel_width REAL,
                pixel_height REAL,
                scale REAL NOT NULL DEFAULT 1.0,
                change_notes TEXT,
                created_by TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_versions_floor_number
             ON floor_plan_versions(floor_id, version_number)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS points_of_interest (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                category TEXT NOT NULL,
                poi_type TEXT NOT NULL,
                x REAL NOT NULL,
                y REAL NOT NULL,
                description TEXT,
                properties TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                FOREIGN KEY (version_id) REFERENCES floor_plan_versions(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_pois_version
             ON points_of_interest(version_id, is_active)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS routing_nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version_id INTEGER NOT NULL,
                x REAL NOT NULL,
                y REAL NOT NULL,
                kind TEXT NOT NULL,
                properties TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (version_id) REFERENCES floor_plan_versions(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_nodes_version
             ON routing_nodes(version_id, is_active)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS routing_edges (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                version_id INTEGER NOT NULL,
                from_node_id INTEGER NOT NULL,
                to_node_id INTEGER NOT NULL,
                distance REAL NOT NULL,
                travel_time REAL,
                kind TEXT NOT NULL,
                is_bidirectional BOOLEAN NOT NULL DEFAULT 1,
                properties TEXT,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (version_id) REFERENCES floor_plan_versions(id),
                FOREIGN KEY (from_node_id) REFERENCES routing_nodes(id),
                FOREIGN KEY (to_node_id) REFERENCES routing_nodes(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_edges_version
             ON routing_edges(version_id, is_active)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS map_publishing (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                floor_id INTEGER NOT NULL,
                version_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                published_at INTEGER,
                published_by TEXT,
                review_notes TEXT,
                validation TEXT,
                is_current BOOLEAN NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER,
                FOREIGN KEY (version_id) REFERENCES floor_plan_versions(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_publishing_floor
             ON map_publishing(floor_id, is_current)",
            [],
        )?;

        Ok(())
    }

    fn require_version(conn: &Connection, version_id: VersionId) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM floor_plan_versions WHERE id = ?1",
                params![version_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            Ok(())
        } else {
            Err(StorageError::version_not_found(version_id))
        }
    }
}

#[async_trait]
impl MapStore for SqliteMapStore {
    async fn insert_version(&self, record: NewVersionRecord) -> Result<FloorPlanVersion> {
        let conn = self.conn.lock().unwrap();

        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM floor_plan_versions WHERE floor_id = ?1 AND version_number = ?2",
                params![record.floor_id, record.version_number],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::duplicate_version(
                record.floor_id,
                record.version_number,
            ));
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO floor_plan_versions
             (floor_id, version_number, artifact_ref, artifact_kind, file_size,
              pixel_width, pixel_height, scale, change_notes, created_by, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11)",
            params![
                record.floor_id,
                record.version_number,
                &record.artifact_ref,
                record.artifact_kind.as_str(),
                record.file_size.map(|s| s as i64),
                record.pixel_size.map(|(w, _)| w),
                record.pixel_size.map(|(_, h)| h),
                record.scale,
                &record.change_notes,
                &record.created_by,
                now.timestamp(),
            ],
        )?;

        Ok(FloorPlanVersion {
            id: conn.last_insert_rowid(),
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
            created_at: timestamp(now.timestamp()),
        })
    }

    async fn get_version(&self, version_id: VersionId) -> Result<Option<FloorPlanVersion>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM floor_plan_versions WHERE id = ?1",
                    VERSION_COLUMNS
                ),
                params![version_id],
                map_version,
            )
            .optional()?;
        Ok(result)
    }

    async fn find_version(
        &self,
        floor_id: FloorId,
        version_number: i32,
    ) -> Result<Option<FloorPlanVersion>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM floor_plan_versions
                     WHERE floor_id = ?1 AND version_number = ?2",
                    VERSION_COLUMNS
                ),
                params![floor_id, version_number],
                map_version,
            )
            .optional()?;
        Ok(result)
    }

    async fn list_versions(&self, floor_id: FloorId) -> Result<Vec<FloorPlanVersion>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM floor_plan_versions
             WHERE floor_id = ?1 ORDER BY version_number DESC",
            VERSION_COLUMNS
        ))?;
        let versions = stmt
            .query_map(params![floor_id], map_version)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(versions)
    }

    async fn update_version(
        &self,
        version_id: VersionId,
        patch: &VersionPatch,
    ) -> Result<FloorPlanVersion> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        let mut version = tx
            .query_row(
                &format!(
                    "SELECT {} FROM floor_plan_versions WHERE id = ?1",
                    VERSION_COLUMNS
                ),
                params![version_id],
                map_version,
            )
            .optional()?
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

        tx.execute(
            "UPDATE floor_plan_versions SET scale = ?1, change_notes = ?2, is_active = ?3
             WHERE id = ?4",
            params![
                version.scale,
                &version.change_notes,
                version.is_active,
                version_id
            ],
        )?;
        tx.commit()?;
        Ok(version)
    }

    async fn insert_poi(&self, record: NewPoi) -> Result<PointOfInterest> {
        let conn = self.conn.lock().unwrap();
        Self::require_version(&conn, record.version_id)?;

        let now = Utc::now();
        conn.execute(
            "INSERT INTO points_of_interest
             (version_id, name, category, poi_type, x, y, description, properties,
              is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, NULL)",
            params![
                record.version_id,
                &record.name,
                &record.category,
                &record.poi_type,
                record.x,
                record.y,
                &record.description,
                serde_json::to_string(&record.properties)?,
                now.timestamp(),
            ],
        )?;

        Ok(PointOfInterest {
            id: conn.last_insert_rowid(),
            version_id: record.version_id,
            name: record.name,
            category: record.category,
            poi_type: record.poi_type,
            x: record.x,
            y: record.y,
            description: record.description,
            properties: record.properties,
            is_active: true,
            created_at: timestamp(now.timestamp()),
            updated_at: None,
        })
    }

    async fn get_poi(&self, poi_id: PoiId) -> Result<Option<PointOfInterest>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!("SELECT {} FROM points_of_interest WHERE id = ?1", POI_COLUMNS),
                params![poi_id],
                map_poi,
            )
            .optional()?;
        Ok(result)
    }

    async fn list_pois(&self, version_id: VersionId) -> Result<Vec<PointOfInterest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM points_of_interest
             WHERE version_id = ?1 AND is_active = 1 ORDER BY id",
            POI_COLUMNS
        ))?;
        let pois = stmt
            .query_map(params![version_id], map_poi)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(pois)
    }

    async fn update_poi(&self, poi_id: PoiId, patch: &PoiPatch) -> Result<PointOfInterest> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        let mut poi = tx
            .query_row(
                &format!("SELECT {} FROM points_of_interest WHERE id = ?1", POI_COLUMNS),
                params![poi_id],
                map_poi,
            )
            .optional()?
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
        let now = Utc::now();
        poi.updated_at = Some(timestamp(now.timestamp()));

        tx.execute(
            "UPDATE points_of_interest
             SET name = ?1, category = ?2, poi_type = ?3, x = ?4, y = ?5,
                 description = ?6, properties = ?7, is_active = ?8, updated_at = ?9
             WHERE id = ?10",
            params![
                &poi.name,
                &poi.category,
                &poi.poi_type,
                poi.x,
                poi.y,
                &poi.description,
                serde_json::to_string(&poi.properties)?,
                poi.is_active,
                now.timestamp(),
                poi_id,
            ],
        )?;
        tx.commit()?;
        Ok(poi)
    }

    async fn deactivate_poi(&self, poi_id: PoiId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE points_of_interest SET is_active = 0, updated_at = ?1 WHERE id = ?2",
            params![Utc::now().timestamp(), poi_id],
        )?;
        if changed == 0 {
            return Err(StorageError::poi_not_found(poi_id));
        }
        Ok(())
    }

    async fn insert_node(&self, record: NewNode) -> Result<RoutingNode> {
        let conn = self.conn.lock().unwrap();
        Self::require_version(&conn, record.version_id)?;

        let now = Utc::now();
        conn.execute(
            "INSERT INTO routing_nodes (version_id, x, y, kind, properties, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
            params![
                record.version_id,
                record.x,
                record.y,
                record.kind.as_str(),
                serde_json::to_string(&record.properties)?,
                now.timestamp(),
            ],
        )?;

        Ok(RoutingNode {
            id: conn.last_insert_rowid(),
            version_id: record.version_id,
            x: record.x,
            y: record.y,
            kind: record.kind,
            properties: record.properties,
            is_active: true,
            created_at: timestamp(now.timestamp()),
        })
    }

    async fn get_node(&self, node_id: NodeId) -> Result<Option<RoutingNode>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!("SELECT {} FROM routing_nodes WHERE id = ?1", NODE_COLUMNS),
                params![node_id],
                map_node,
            )
            .optional()?;
        Ok(result)
    }

    async fn list_nodes(&self, version_id: VersionId) -> Result<Vec<RoutingNode>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM routing_nodes
             WHERE version_id = ?1 AND is_active = 1 ORDER BY id",
            NODE_COLUMNS
        ))?;
        let nodes = stmt
            .query_map(params![version_id], map_node)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    async fn deactivate_node(&self, node_id: NodeId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE routing_nodes SET is_active = 0 WHERE id = ?1",
            params![node_id],
        )?;
        if changed == 0 {
            return Err(StorageError::node_not_found(node_id));
        }
        Ok(())
    }

    async fn insert_edge(&self, record: NewEdge) -> Result<RoutingEdge> {
        let conn = self.conn.lock().unwrap();
        Self::require_version(&conn, record.version_id)?;

        if record.distance < 0.0 {
            return Err(StorageError::invalid_reference(format!(
                "Edge distance must be >= 0, got {}",
                record.distance
            )));
        }

        for node_id in [record.from_node_id, record.to_node_id] {
            let endpoint: Option<(VersionId, bool)> = conn
                .query_row(
                    "SELECT version_id, is_active FROM routing_nodes WHERE id = ?1",
                    params![node_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            match endpoint {
                None => {
                    return Err(StorageError::invalid_reference(format!(
                        "Edge endpoint node {} does not exist",
                        node_id
                    )));
                }
                Some((_, false)) => {
                    return Err(StorageError::invalid_reference(format!(
                        "Edge endpoint node {} is inactive",
                        node_id
                    )));
                }
                Some((version_id, _)) if version_id != record.version_id => {
                    return Err(StorageError::invalid_reference(format!(
                        "Edge endpoint node {} belongs to version {}, edge targets version {}",
                        node_id, version_id, record.version_id
                    )));
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();
        conn.execute(
            "INSERT INTO routing_edges
             (version_id, from_node_id, to_node_id, distance, travel_time, kind,
              is_bidirectional, properties, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
            params![
                record.version_id,
                record.from_node_id,
                record.to_node_id,
                record.distance,
                record.travel_time,
                record.kind.as_str(),
                record.is_bidirectional,
                serde_json::to_string(&record.properties)?,
                now.timestamp(),
            ],
        )?;

        Ok(RoutingEdge {
            id: conn.last_insert_rowid(),
            version_id: record.version_id,
            from_node_id: record.from_node_id,
            to_node_id: record.to_node_id,
            distance: record.distance,
            travel_time: record.travel_time,
            kind: record.kind,
            is_bidirectional: record.is_bidirectional,
            properties: record.properties,
            is_active: true,
            created_at: timestamp(now.timestamp()),
        })
    }

    async fn list_edges(&self, version_id: VersionId) -> Result<Vec<RoutingEdge>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM routing_edges
             WHERE version_id = ?1 AND is_active = 1 ORDER BY id",
            EDGE_COLUMNS
        ))?;
        let edges = stmt
            .query_map(params![version_id], map_edge)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    async fn deactivate_edge(&self, edge_id: EdgeId) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE routing_edges SET is_active = 0 WHERE id = ?1",
            params![edge_id],
        )?;
        if changed == 0 {
            return Err(StorageError::edge_not_found(edge_id));
        }
        Ok(())
    }

    async fn insert_publishing(&self, record: NewPublishing) -> Result<MapPublishing> {
        let conn = self.conn.lock().unwrap();
        Self::require_version(&conn, record.version_id)?;

        let now = Utc::now();
        conn.execute(
            "INSERT INTO map_publishing
             (floor_id, version_id, status, published_at, published_by, review_notes,
              validation, is_current, created_at, updated_at)
             VALUES (?1, ?2, ?3, NULL, ?4, NULL, ?5, 0, ?6, NULL)",
            params![
                record.floor_id,
                record.version_id,
                record.status.as_str(),
                &record.published_by,
                serde_json::to_string(&record.validation)?,
                now.timestamp(),
            ],
        )?;

        Ok(MapPublishing {
            id: conn.last_insert_rowid(),
            floor_id: record.floor_id,
            version_id: record.version_id,
            status: record.status,
            published_at: None,
            published_by: record.published_by,
            review_notes: None,
            validation: record.validation,
            is_current: false,
            created_at: timestamp(now.timestamp()),
            updated_at: None,
        })
    }

    async fn get_publishing(&self, publishing_id: PublishingId) -> Result<Option<MapPublishing>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM map_publishing WHERE id = ?1",
                    PUBLISHING_COLUMNS
                ),
                params![publishing_id],
                map_publishing,
            )
            .optional()?;
        Ok(result)
    }

    async fn update_publishing(
        &self,
        publishing_id: PublishingId,
        status: PublishingStatus,
        review_notes: Option<String>,
        published_by: Option<String>,
    ) -> Result<MapPublishing> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        let mut record = tx
            .query_row(
                &format!(
                    "SELECT {} FROM map_publishing WHERE id = ?1",
                    PUBLISHING_COLUMNS
                ),
                params![publishing_id],
                map_publishing,
            )
            .optional()?
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
        let now = Utc::now();
        record.updated_at = Some(timestamp(now.timestamp()));

        tx.execute(
            "UPDATE map_publishing
             SET status = ?1, review_notes = ?2, published_by = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                record.status.as_str(),
                &record.review_notes,
                &record.published_by,
                now.timestamp(),
                publishing_id,
            ],
        )?;
        tx.commit()?;
        Ok(record)
    }

    async fn list_publishing(&self, floor_id: FloorId) -> Result<Vec<MapPublishing>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM map_publishing
             WHERE floor_id = ?1 ORDER BY created_at DESC, id DESC",
            PUBLISHING_COLUMNS
        ))?;
        let records = stmt
            .query_map(params![floor_id], map_publishing)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn current_publishing(&self, floor_id: FloorId) -> Result<Option<MapPublishing>> {
        let conn = self.conn.lock().unwrap();
        let result = conn
            .query_row(
                &format!(
                    "SELECT {} FROM map_publishing
                     WHERE floor_id = ?1 AND is_current = 1",
                    PUBLISHING_COLUMNS
                ),
                params![floor_id],
                map_publishing,
            )
            .optional()?;
        Ok(result)
    }

    async fn promote_to_current(&self, publishing_id: PublishingId) -> Result<MapPublishing> {
        let conn = self.conn.lock().unwrap();
        let tx = conn.unchecked_transaction()?;

        let mut record = tx
            .query_row(
                &format!(
                    "SELECT {} FROM map_publishing WHERE id = ?1",
                    PUBLISHING_COLUMNS
                ),
                params![publishing_id],
                map_publishing,
            )
            .optional()?
            .ok_or_else(|| StorageError::publishing_not_found(publishing_id))?;

        if !record.status.can_transition_to(PublishingStatus::Published) {
            return Err(StorageError::invalid_transition(
                record.status,
                PublishingStatus::Published,
            ));
        }

        let now = Utc::now();

        // Demote whichever record currently holds the floor
        tx.execute(
            "UPDATE map_publishing
             SET is_current = 0, status = ?1, updated_at = ?2
             WHERE floor_id = ?3 AND is_current = 1 AND id != ?4",
            params![
                PublishingStatus::Archived.as_str(),
                now.timestamp(),
                record.floor_id,
                publishing_id,
            ],
        )?;

        tx.execute(
            "UPDATE map_publishing
             SET status = ?1, is_current = 1, published_at = ?2, updated_at = ?2
             WHERE id = ?3",
            params![
                PublishingStatus::Published.as_str(),
                now.timestamp(),
                publishing_id,
            ],
        )?;
        tx.commit()?;

        record.status = PublishingStatus::Published;
        record.is_current = true;
        record.published_at = Some(timestamp(now.timestamp()));
        record.updated_at = Some(timestamp(now.timestamp()));
        Ok(record)
    }
}
