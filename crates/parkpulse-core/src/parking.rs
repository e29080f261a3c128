//! Parking - 駐車場の占有数
//!
//! # ルール
//! - 到着（ジオフェンスのチェックイン）と手動補正で増減する
//! - 占有数は `[0, total_spots]` にクランプ
//! - 50% 未満 → Light、80% 未満 → Medium、それ以上 → Busy

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{ActivityLevel, ParkError, StoreError};
use crate::geo::{GeoPoint, haversine_km};
use crate::ports::KeyValueStore;

/// Storage key of the occupancy record.
pub const PARKING_KEY: &str = "parking";

const PARKING_FORMAT_VERSION: u32 = 1;

/// A lot in the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkingLot {
    pub id: &'static str,
    pub name: &'static str,
    pub total_spots: u32,
    pub location: GeoPoint,
}

pub const PARKING_LOTS: &[ParkingLot] = &[ParkingLot {
    id: "lot1",
    name: "Main Parking Lot",
    total_spots: 64,
    location: GeoPoint {
        lat: 33.9784,
        lng: -84.1315,
    },
}];

pub fn find_lot(lot_id: &str) -> Option<&'static ParkingLot> {
    PARKING_LOTS.iter().find(|lot| lot.id == lot_id)
}

/// Lot closest to `point`, if the catalog is non-empty.
pub fn nearest_lot(point: GeoPoint) -> Option<&'static ParkingLot> {
    PARKING_LOTS.iter().min_by(|a, b| {
        haversine_km(point, a.location).total_cmp(&haversine_km(point, b.location))
    })
}

/// Under 50% full is Light, under 80% Medium, otherwise Busy.
pub fn occupancy_level(occupied: u32, total_spots: u32) -> ActivityLevel {
    if total_spots == 0 {
        return ActivityLevel::Light;
    }
    let percentage = f64::from(occupied) / f64::from(total_spots) * 100.0;
    if percentage < 50.0 {
        ActivityLevel::Light
    } else if percentage < 80.0 {
        ActivityLevel::Medium
    } else {
        ActivityLevel::Busy
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct LotOccupancy {
    occupied: u32,
    last_updated: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredBoard {
    version: u32,
    #[serde(default)]
    lots: HashMap<String, LotOccupancy>,
}

/// Serializable view of one lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotSnapshot {
    pub lot_id: String,
    pub name: String,
    pub total_spots: u32,
    pub occupied: u32,
    pub available: u32,
    pub percentage: f64,
    pub level: ActivityLevel,
    pub last_updated_ms: Option<i64>,
}

impl LotSnapshot {
    fn new(lot: &ParkingLot, state: Option<LotOccupancy>) -> Self {
        let occupied = state.map_or(0, |s| s.occupied.min(lot.total_spots));
        let percentage = if lot.total_spots == 0 {
            0.0
        } else {
            f64::from(occupied) / f64::from(lot.total_spots) * 100.0
        };
        Self {
            lot_id: lot.id.to_string(),
            name: lot.name.to_string(),
            total_spots: lot.total_spots,
            occupied,
            available: lot.total_spots - occupied,
            percentage,
            level: occupancy_level(occupied, lot.total_spots),
            last_updated_ms: state.map(|s| s.last_updated),
        }
    }
}

/// ParkingBoard はカタログ内の全駐車場の占有数を保持
pub struct ParkingBoard {
    store: Arc<dyn KeyValueStore>,
    lots: RwLock<HashMap<String, LotOccupancy>>,
    write_gate: Mutex<()>,
}

impl ParkingBoard {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lots: RwLock::new(HashMap::new()),
            write_gate: Mutex::new(()),
        }
    }

    /// `store` から復元。読めなければ全駐車場 0 から始める。
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let board = Self::new(store);
        let restored = match board.store.get(PARKING_KEY).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<StoredBoard>(&bytes) {
                Ok(doc) if doc.version <= PARKING_FORMAT_VERSION => doc.lots,
                Ok(doc) => {
                    warn!(version = doc.version, "parking record has a newer format; starting empty");
                    HashMap::new()
                }
                Err(err) => {
                    warn!(error = %err, "failed to decode parking record; starting empty");
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(err) => {
                warn!(error = %err, "failed to read parking record; starting empty");
                HashMap::new()
            }
        };
        *board.lots.write().unwrap_or_else(|e| e.into_inner()) = restored;
        board
    }

    /// Add `delta` to a lot's occupancy, clamped to its capacity, and persist.
    ///
    /// Only an unknown lot is an error; persistence failures are logged.
    pub async fn adjust(
        &self,
        lot_id: &str,
        delta: i64,
        now_ms: i64,
    ) -> Result<LotSnapshot, ParkError> {
        let lot = find_lot(lot_id).ok_or_else(|| ParkError::UnknownLot(lot_id.to_string()))?;
        let _gate = self.write_gate.lock().await;

        let (state, all) = {
            let mut lots = self.lots.write().unwrap_or_else(|e| e.into_inner());
            let entry = lots.entry(lot.id.to_string()).or_default();
            let next = (i64::from(entry.occupied) + delta).clamp(0, i64::from(lot.total_spots));
            entry.occupied = u32::try_from(next).unwrap_or(0);
            entry.last_updated = now_ms;
            (*entry, lots.clone())
        };

        debug!(lot = lot.id, occupied = state.occupied, delta, "adjusted parking occupancy");

        if let Err(err) = self.persist(all).await {
            warn!(lot = lot.id, error = %err, "failed to persist parking record; keeping in-memory state");
        }

        Ok(LotSnapshot::new(lot, Some(state)))
    }

    async fn persist(&self, lots: HashMap<String, LotOccupancy>) -> Result<(), StoreError> {
        let doc = StoredBoard {
            version: PARKING_FORMAT_VERSION,
            lots,
        };
        let bytes = serde_json::to_vec(&doc).map_err(|source| StoreError::Codec {
            context: "encoding parking record".to_string(),
            source,
        })?;
        self.store.put(PARKING_KEY, bytes).await
    }

    pub fn snapshot(&self, lot_id: &str) -> Result<LotSnapshot, ParkError> {
        let lot = find_lot(lot_id).ok_or_else(|| ParkError::UnknownLot(lot_id.to_string()))?;
        let state = self
            .lots
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(lot.id)
            .copied();
        Ok(LotSnapshot::new(lot, state))
    }

    /// One snapshot per catalog lot, in catalog order.
    pub fn snapshots(&self) -> Vec<LotSnapshot> {
        let lots = self.lots.read().unwrap_or_else(|e| e.into_inner());
        PARKING_LOTS
            .iter()
            .map(|lot| LotSnapshot::new(lot, lots.get(lot.id).copied()))
            .collect()
    }
}
