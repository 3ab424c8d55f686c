//! Gate Arena
//!
//! Owns every anomaly object of one world. Objects in loaded regions are
//! resident and fully simulated; warp gates in unloaded regions are kept as
//! dormant records until their region comes back.

use crate::anomaly::{Anomaly, AnomalyId, AnomalyKind, AnomalyObject, WarpGate, WarpGateRecord};
use crate::geometry::{RegionPos, WorldPos};
use crate::registry::{PairingRegistry, RegistryEntry};
use crate::store::LocationStore;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct GateArena {
    resident: BTreeMap<AnomalyId, AnomalyObject>,
    dormant: BTreeMap<RegionPos, Vec<WarpGateRecord>>,
}

impl GateArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the object previously stored under the same id, if any.
    pub fn insert(&mut self, object: AnomalyObject) -> Option<AnomalyObject> {
        self.resident.insert(object.id(), object)
    }

    pub fn get(&self, id: AnomalyId) -> Option<&AnomalyObject> {
        self.resident.get(&id)
    }

    pub fn get_mut(&mut self, id: AnomalyId) -> Option<&mut AnomalyObject> {
        self.resident.get_mut(&id)
    }

    pub fn remove(&mut self, id: AnomalyId) -> Option<AnomalyObject> {
        self.resident.remove(&id)
    }

    pub fn contains(&self, id: AnomalyId) -> bool {
        self.resident.contains_key(&id)
    }

    /// Resident ids in ascending order; iteration order of every step.
    pub fn ids(&self) -> Vec<AnomalyId> {
        self.resident.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnomalyObject> {
        self.resident.values()
    }

    pub fn len(&self) -> usize {
        self.resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident.is_empty()
    }

    /// Resident warp gates inside the box around `center`, nearest first.
    pub fn warp_gates_in_box(
        &self,
        center: &WorldPos,
        half_extents: [f64; 3],
        exclude: AnomalyId,
    ) -> Vec<AnomalyId> {
        let mut found: Vec<(AnomalyId, f64)> = self
            .resident
            .values()
            .filter(|o| o.kind() == AnomalyKind::WarpGate && o.id() != exclude)
            .filter(|o| o.coordinate().within_box(center, half_extents))
            .filter_map(|o| o.coordinate().distance_to(center).map(|d| (o.id(), d)))
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.into_iter().map(|(id, _)| id).collect()
    }

    // ========== Dormant records ==========

    pub fn add_dormant(&mut self, record: WarpGateRecord) {
        self.dormant.entry(record.coordinate.region()).or_default().push(record);
    }

    pub fn is_dormant(&self, id: AnomalyId) -> bool {
        self.dormant_record(id).is_some()
    }

    pub fn dormant_record(&self, id: AnomalyId) -> Option<&WarpGateRecord> {
        let key = id.to_string();
        self.dormant.values().flatten().find(|r| r.id == key)
    }

    pub fn dormant_record_mut(&mut self, id: AnomalyId) -> Option<&mut WarpGateRecord> {
        let key = id.to_string();
        self.dormant.values_mut().flatten().find(|r| r.id == key)
    }

    pub fn remove_dormant(&mut self, id: AnomalyId) -> Option<WarpGateRecord> {
        let key = id.to_string();
        let (region, index) = self.dormant.iter().find_map(|(region, records)| {
            records.iter().position(|r| r.id == key).map(|i| (region.clone(), i))
        })?;
        let records = self.dormant.get_mut(&region)?;
        let record = records.remove(index);
        if records.is_empty() {
            self.dormant.remove(&region);
        }
        Some(record)
    }

    /// True if a dormant gate lies inside the box around `center`.
    pub fn dormant_in_box(&self, center: &WorldPos, half_extents: [f64; 3]) -> bool {
        self.dormant_records().any(|r| r.coordinate.within_box(center, half_extents))
    }

    pub fn dormant_records(&self) -> impl Iterator<Item = &WarpGateRecord> {
        self.dormant.values().flatten()
    }

    pub fn dormant_regions(&self) -> Vec<RegionPos> {
        self.dormant.keys().cloned().collect()
    }

    pub fn resident_regions(&self) -> BTreeSet<RegionPos> {
        self.resident.values().map(|o| o.coordinate().region()).collect()
    }

    /// Every warp gate, resident or dormant, as a persisted record.
    pub fn warp_gate_records(&self) -> Vec<WarpGateRecord> {
        let mut records: Vec<WarpGateRecord> =
            self.resident.values().filter_map(|o| o.as_warp().map(WarpGate::to_record)).collect();
        records.extend(self.dormant_records().cloned());
        records
    }

    // ========== Residency ==========

    /// Make the dormant gates of a loaded region resident and register them.
    pub fn activate_region(
        &mut self,
        region: &RegionPos,
        registry: &mut PairingRegistry,
    ) -> Vec<AnomalyId> {
        let Some(records) = self.dormant.remove(region) else {
            return Vec::new();
        };
        let mut activated = Vec::with_capacity(records.len());
        for record in &records {
            let Some(gate) = WarpGate::from_record(record) else {
                continue;
            };
            let object = AnomalyObject::Warp(gate);
            registry.register(RegistryEntry::from(&object));
            activated.push(object.id());
            self.insert(object);
        }
        if !activated.is_empty() {
            tracing::debug!(region = %region, count = activated.len(), "gates became resident");
        }
        activated
    }

    /// Move the resident warp gates of an unloading region back to dormant records.
    ///
    /// Their coordinates stay in the Location Store so partners can still find them.
    pub fn deactivate_region(
        &mut self,
        region: &RegionPos,
        registry: &mut PairingRegistry,
        store: &mut LocationStore,
    ) -> usize {
        let leaving: Vec<AnomalyId> = self
            .resident
            .values()
            .filter(|o| o.kind() == AnomalyKind::WarpGate && &o.coordinate().region() == region)
            .map(|o| o.id())
            .collect();

        for id in &leaving {
            let Some(AnomalyObject::Warp(gate)) = self.resident.remove(id) else {
                continue;
            };
            registry.unregister(*id);
            store.put(*id, gate.coordinate.clone());
            self.add_dormant(gate.to_record());
        }
        if !leaving.is_empty() {
            tracing::debug!(region = %region, count = leaving.len(), "gates became dormant");
        }
        leaving.len()
    }

    /// Resident mini gates located in `region`.
    pub fn mini_gates_in_region(&self, region: &RegionPos) -> Vec<AnomalyId> {
        self.resident
            .values()
            .filter(|o| o.kind() == AnomalyKind::MiniGate && &o.coordinate().region() == region)
            .map(|o| o.id())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warp(x: f64) -> AnomalyObject {
        AnomalyObject::Warp(WarpGate::new(AnomalyId::random(), WorldPos::overworld(x, 70.0, 0.0)))
    }

    #[test]
    fn test_box_query_excludes_self_and_sorts() {
        let mut arena = GateArena::new();
        let me = warp(0.0);
        let close = warp(5.0);
        let further = warp(15.0);
        let outside = warp(40.0);
        let me_id = me.id();
        let (close_id, further_id) = (close.id(), further.id());
        for o in [me, close, further, outside] {
            arena.insert(o);
        }

        let center = WorldPos::overworld(0.0, 70.0, 0.0);
        let found = arena.warp_gates_in_box(&center, [20.0, 10.0, 20.0], me_id);
        assert_eq!(found, vec![close_id, further_id]);
    }

    #[test]
    fn test_deactivate_then_activate_restores_gate() {
        let mut arena = GateArena::new();
        let mut registry = PairingRegistry::new();
        let mut store = LocationStore::new();

        let gate = warp(3000.0);
        let id = gate.id();
        let region = gate.coordinate().region();
        registry.register(RegistryEntry::from(&gate));
        arena.insert(gate);

        assert_eq!(arena.deactivate_region(&region, &mut registry, &mut store), 1);
        assert!(!arena.contains(id));
        assert!(arena.is_dormant(id));
        assert!(!registry.contains(id));
        assert!(store.contains(id));

        assert_eq!(arena.activate_region(&region, &mut registry), vec![id]);
        assert!(arena.contains(id));
        assert!(!arena.is_dormant(id));
        assert!(registry.contains(id));
        assert!(arena.dormant_regions().is_empty());
    }

    #[test]
    fn test_remove_dormant_drops_empty_region() {
        let mut arena = GateArena::new();
        let gate = WarpGate::new(AnomalyId::random(), WorldPos::overworld(100.0, 70.0, 0.0));
        let id = gate.id;
        arena.add_dormant(gate.to_record());

        assert!(arena.dormant_record_mut(id).is_some());
        assert!(arena.remove_dormant(id).is_some());
        assert!(arena.dormant_regions().is_empty());
        assert!(arena.remove_dormant(id).is_none());
    }

    #[test]
    fn test_records_cover_resident_and_dormant() {
        let mut arena = GateArena::new();
        arena.insert(warp(0.0));
        arena.add_dormant(WarpGate::new(AnomalyId::random(), WorldPos::overworld(900.0, 70.0, 0.0)).to_record());
        assert_eq!(arena.warp_gate_records().len(), 2);
    }
}
