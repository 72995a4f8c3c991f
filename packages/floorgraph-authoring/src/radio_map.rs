//! Radio Map Index
//!
//! Projects a floor's calibration fingerprints into the radio map
//! shape positioning consumers expect. Straight projection: no
//! caching, no deduplication, repeated coordinates stay repeated.

use std::sync::Arc;
use tracing::debug;

use floorgraph_storage::{FloorId, RadioMap, RadioMapPoint, Result};

use crate::ports::FingerprintSource;

pub struct RadioMapIndex {
    fingerprints: Arc<dyn FingerprintSource>,
}

impl RadioMapIndex {
    pub fn new(fingerprints: Arc<dyn FingerprintSource>) -> Self {
        Self { fingerprints }
    }

    pub async fn radio_map(&self, floor_id: FloorId) -> Result<RadioMap> {
        let fingerprints = self.fingerprints.list_fingerprints(floor_id).await?;
        let points = fingerprints
            .into_iter()
            .map(|f| RadioMapPoint {
                x: f.x,
                y: f.y,
                wifi_scans: f.wifi_scans,
            })
            .collect::<Vec<_>>();

        debug!("Built radio map for floor {}: {} points", floor_id, points.len());
        Ok(RadioMap { floor_id, points })
    }
}
