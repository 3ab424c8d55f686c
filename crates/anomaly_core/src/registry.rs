//! Pairing Registry
//!
//! In-memory index of every resident pairable object. It answers "is there an
//! unpaired gate far enough away?" without touching durable storage, and it only
//! ever knows about objects that are currently resident.

use crate::anomaly::{Anomaly, AnomalyId, AnomalyKind, AnomalyObject};
use crate::geometry::WorldPos;
use rand::Rng;
use std::collections::BTreeMap;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub id: AnomalyId,
    pub kind: AnomalyKind,
    pub coordinate: WorldPos,
    pub partner_id: Option<AnomalyId>,
}

impl From<&AnomalyObject> for RegistryEntry {
    fn from(object: &AnomalyObject) -> Self {
        Self {
            id: object.id(),
            kind: object.kind(),
            coordinate: object.coordinate().clone(),
            partner_id: object.partner_id(),
        }
    }
}

#[derive(Debug, Default)]
pub struct PairingRegistry {
    entries: BTreeMap<AnomalyId, RegistryEntry>,
}

impl PairingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already registered (the entry is left as is).
    pub fn register(&mut self, entry: RegistryEntry) -> bool {
        if self.entries.contains_key(&entry.id) {
            return false;
        }
        tracing::debug!(id = %entry.id, kind = ?entry.kind, at = %entry.coordinate, "registered");
        self.entries.insert(entry.id, entry);
        true
    }

    pub fn unregister(&mut self, id: AnomalyId) -> Option<RegistryEntry> {
        let removed = self.entries.remove(&id);
        if let Some(entry) = &removed {
            tracing::debug!(id = %id, at = %entry.coordinate, "unregistered");
        }
        removed
    }

    pub fn get(&self, id: AnomalyId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: AnomalyId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn mark_paired(&mut self, id: AnomalyId, partner: AnomalyId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.partner_id = Some(partner);
        }
    }

    pub fn mark_unpaired(&mut self, id: AnomalyId) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.partner_id = None;
        }
    }

    /// Nearest unpaired entry of `kind` at distance `>= min_distance` from `near`.
    pub fn find_unpaired(
        &self,
        kind: AnomalyKind,
        near: &WorldPos,
        min_distance: f64,
    ) -> Option<AnomalyId> {
        self.unpaired_candidates(kind, near, min_distance).first().map(|(id, _)| *id)
    }

    /// Uniform pick among the `pool` nearest qualifying entries.
    pub fn pick_unpaired<R: Rng + ?Sized>(
        &self,
        kind: AnomalyKind,
        near: &WorldPos,
        min_distance: f64,
        pool: usize,
        rng: &mut R,
    ) -> Option<AnomalyId> {
        let candidates = self.unpaired_candidates(kind, near, min_distance);
        if candidates.is_empty() {
            return None;
        }
        let top = pool.max(1).min(candidates.len());
        let (id, distance) = candidates[rng.gen_range(0..top)];
        tracing::debug!(
            found = candidates.len(),
            selected = %id,
            distance,
            "registry pick among unpaired candidates"
        );
        Some(id)
    }

    /// Qualifying entries sorted by distance, ties broken by id.
    pub fn unpaired_candidates(
        &self,
        kind: AnomalyKind,
        near: &WorldPos,
        min_distance: f64,
    ) -> Vec<(AnomalyId, f64)> {
        let mut candidates: Vec<(AnomalyId, f64)> = self
            .entries
            .values()
            .filter(|e| e.kind == kind && e.partner_id.is_none())
            .filter_map(|e| e.coordinate.distance_to(near).map(|d| (e.id, d)))
            .filter(|(_, d)| *d >= min_distance && *d > 0.0)
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        candidates
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn debug_info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "PairingRegistry: {} resident entries", self.entries.len());
        for entry in self.entries.values() {
            let partner = entry.partner_id.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            let _ = writeln!(
                out,
                "- {} {:?} at {} partner {}",
                entry.id, entry.kind, entry.coordinate, partner
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DimensionId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn entry(x: f64, partner: Option<AnomalyId>) -> RegistryEntry {
        RegistryEntry {
            id: AnomalyId::random(),
            kind: AnomalyKind::WarpGate,
            coordinate: WorldPos::overworld(x, 64.0, 0.0),
            partner_id: partner,
        }
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = PairingRegistry::new();
        let e = entry(10.0, None);
        assert!(registry.register(e.clone()));
        assert!(!registry.register(e.clone()));
        assert_eq!(registry.len(), 1);

        assert!(registry.unregister(e.id).is_some());
        assert!(registry.unregister(e.id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_find_unpaired_respects_min_distance() {
        let mut registry = PairingRegistry::new();
        let near = entry(100.0, None);
        let far = entry(800.0, None);
        registry.register(near.clone());
        registry.register(far.clone());

        let origin = WorldPos::overworld(0.0, 64.0, 0.0);
        assert_eq!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 500.0), Some(far.id));
        assert_eq!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 50.0), Some(near.id));
        assert_eq!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 900.0), None);
    }

    #[test]
    fn test_find_unpaired_skips_paired_other_kinds_and_dimensions() {
        let mut registry = PairingRegistry::new();
        registry.register(entry(600.0, Some(AnomalyId::random())));

        let mut mini = entry(700.0, None);
        mini.kind = AnomalyKind::MiniGate;
        registry.register(mini);

        let mut nether = entry(900.0, None);
        nether.coordinate.dimension = DimensionId::new("minecraft:the_nether");
        registry.register(nether);

        let origin = WorldPos::overworld(0.0, 64.0, 0.0);
        assert!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 500.0).is_none());
    }

    #[test]
    fn test_self_is_never_a_candidate() {
        let mut registry = PairingRegistry::new();
        let me = entry(0.0, None);
        registry.register(me.clone());
        assert!(registry.find_unpaired(AnomalyKind::WarpGate, &me.coordinate, 0.0).is_none());
    }

    #[test]
    fn test_pick_stays_within_pool() {
        let mut registry = PairingRegistry::new();
        let ids: Vec<AnomalyId> = [600.0, 700.0, 800.0, 900.0, 1000.0]
            .iter()
            .map(|x| {
                let e = entry(*x, None);
                registry.register(e.clone());
                e.id
            })
            .collect();

        let origin = WorldPos::overworld(0.0, 64.0, 0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let picked = registry
                .pick_unpaired(AnomalyKind::WarpGate, &origin, 500.0, 3, &mut rng)
                .unwrap();
            assert!(ids[..3].contains(&picked));
        }
    }

    #[test]
    fn test_mark_paired_hides_entry() {
        let mut registry = PairingRegistry::new();
        let e = entry(700.0, None);
        registry.register(e.clone());
        registry.mark_paired(e.id, AnomalyId::random());

        let origin = WorldPos::overworld(0.0, 64.0, 0.0);
        assert!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 500.0).is_none());

        registry.mark_unpaired(e.id);
        assert_eq!(registry.find_unpaired(AnomalyKind::WarpGate, &origin, 500.0), Some(e.id));
    }

    #[test]
    fn test_debug_info_lists_entries() {
        let mut registry = PairingRegistry::new();
        registry.register(entry(1.0, None));
        registry.register(entry(2.0, None));
        let info = registry.debug_info();
        assert!(info.starts_with("PairingRegistry: 2 resident entries"));
        assert_eq!(info.lines().count(), 3);
    }
}
