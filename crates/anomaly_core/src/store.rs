//! Location Store
//!
//! Durable `id → coordinate` map for world-anchored gates, including gates whose
//! region is not loaded. The map lives behind an `Arc` and is cloned on write,
//! so a snapshot handed to a background save stays consistent while the
//! simulation keeps mutating the live map.

use crate::anomaly::AnomalyId;
use crate::geometry::{DimensionId, WorldPos};
use crate::save::LocationRecord;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default, Clone)]
pub struct LocationStore {
    records: Arc<BTreeMap<AnomalyId, WorldPos>>,
    dirty: bool,
    /// Bumped on every change; a save only cleans the generation it wrote
    generation: u64,
}

/// Immutable view of the store at one point in time
#[derive(Debug, Clone)]
pub struct LocationSnapshot(Arc<BTreeMap<AnomalyId, WorldPos>>);

impl LocationSnapshot {
    pub fn get(&self, id: AnomalyId) -> Option<&WorldPos> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_records(&self) -> Vec<LocationRecord> {
        self.0
            .iter()
            .map(|(id, pos)| LocationRecord {
                id: id.to_string(),
                x: pos.x(),
                y: pos.y(),
                z: pos.z(),
                dimension: pos.dimension.to_string(),
            })
            .collect()
    }
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted records; unreadable ids are skipped.
    pub fn from_records(records: &[LocationRecord]) -> Self {
        let mut map = BTreeMap::new();
        for record in records {
            let Some(id) = AnomalyId::parse(&record.id) else {
                tracing::warn!(id = %record.id, "skipping location record with malformed id");
                continue;
            };
            let dimension = if record.dimension.is_empty() {
                DimensionId::overworld()
            } else {
                DimensionId::new(record.dimension.clone())
            };
            map.insert(id, WorldPos::new(dimension, record.x, record.y, record.z));
        }
        Self { records: Arc::new(map), dirty: false, generation: 0 }
    }

    pub fn put(&mut self, id: AnomalyId, coordinate: WorldPos) {
        if self.records.get(&id) == Some(&coordinate) {
            return;
        }
        Arc::make_mut(&mut self.records).insert(id, coordinate);
        self.touch();
    }

    pub fn remove(&mut self, id: AnomalyId) -> Option<WorldPos> {
        if !self.records.contains_key(&id) {
            return None;
        }
        self.touch();
        Arc::make_mut(&mut self.records).remove(&id)
    }

    pub fn get(&self, id: AnomalyId) -> Option<&WorldPos> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: AnomalyId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Clear the dirty flag if nothing changed since `generation` was written.
    pub fn mark_saved(&mut self, generation: u64) {
        if generation == self.generation {
            self.dirty = false;
        }
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }

    pub fn snapshot(&self) -> LocationSnapshot {
        LocationSnapshot(Arc::clone(&self.records))
    }
}
