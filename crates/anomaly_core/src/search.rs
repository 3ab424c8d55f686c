//! Pairing Search Engine
//!
//! Finds or creates a partner for an unpaired world-anchored gate:
//!
//! 1. registry pick among far, unpaired gates (`primary_min_distance`)
//! 2. up to `max_attempts` random candidate sites, each force-loaded and
//!    inspected: pair with an unpaired gate found there, or create one
//! 3. near fallback through the registry (`fallback_min_distance`)
//!
//! A failed attempt (region load, placement) is skipped; the search never
//! aborts the step. A gate that stays unpaired is searched again on its next
//! trigger.

use crate::anomaly::{Anomaly, AnomalyId, AnomalyKind, AnomalyObject, WarpGate};
use crate::config::{AnomalyConfig, SearchConfig};
use crate::error::{AnomalyError, Result};
use crate::geometry::WorldPos;
use crate::host::{PresentationCue, Terrain};
use crate::pairing::{commit_pairing, PairingContext};
use crate::registry::RegistryEntry;
use rand::Rng;
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingPath {
    Registry,
    ExistingAtCandidate,
    Created,
    NearFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The gate already had a partner; nothing was searched
    AlreadyPaired(AnomalyId),
    Paired { partner: AnomalyId, via: PairingPath },
    Unpaired,
}

impl SearchOutcome {
    pub fn partner(&self) -> Option<AnomalyId> {
        match self {
            SearchOutcome::AlreadyPaired(partner) | SearchOutcome::Paired { partner, .. } => {
                Some(*partner)
            }
            SearchOutcome::Unpaired => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PairingSearchEngine;

impl PairingSearchEngine {
    pub fn search(&self, ctx: &mut PairingContext<'_>, gate_id: AnomalyId) -> SearchOutcome {
        let Some(gate) = ctx.arena.get(gate_id) else {
            tracing::debug!(gate = %gate_id, "search skipped, gate not resident");
            return SearchOutcome::Unpaired;
        };
        if let Some(partner) = gate.partner_id() {
            return SearchOutcome::AlreadyPaired(partner);
        }
        if gate.kind() != AnomalyKind::WarpGate {
            return SearchOutcome::Unpaired;
        }
        let origin = gate.coordinate().clone();
        if let Some(warp) = ctx.arena.get_mut(gate_id).and_then(AnomalyObject::as_warp_mut) {
            warp.search_attempts += 1;
        }

        let config = ctx.config;
        let search = &config.search;

        if let Some(partner) = self.pick_from_registry(ctx, gate_id, &origin, search.primary_min_distance) {
            return SearchOutcome::Paired { partner, via: PairingPath::Registry };
        }

        for attempt in 0..search.max_attempts {
            let Some(probe) = candidate_point(&origin, search, &mut *ctx.rng) else {
                tracing::debug!(gate = %gate_id, attempt, "candidate too close, discarded");
                continue;
            };
            match self.try_candidate(ctx, gate_id, &origin, &probe) {
                Ok(Some((partner, via))) => {
                    tracing::info!(gate = %gate_id, partner = %partner, attempt, via = ?via, "partner found");
                    return SearchOutcome::Paired { partner, via };
                }
                Ok(None) => {}
                Err(err) if err.is_attempt_local() => {
                    tracing::debug!(gate = %gate_id, attempt, error = %err, "candidate abandoned");
                }
                Err(err) => {
                    tracing::warn!(gate = %gate_id, attempt, error = %err, "candidate failed");
                }
            }
        }

        if let Some(partner) = self.pick_from_registry(ctx, gate_id, &origin, search.fallback_min_distance) {
            return SearchOutcome::Paired { partner, via: PairingPath::NearFallback };
        }

        tracing::debug!(gate = %gate_id, "no partner this time");
        SearchOutcome::Unpaired
    }

    fn pick_from_registry(
        &self,
        ctx: &mut PairingContext<'_>,
        gate_id: AnomalyId,
        origin: &WorldPos,
        min_distance: f64,
    ) -> Option<AnomalyId> {
        let pool = ctx.config.search.registry_candidate_pool;
        let partner = ctx.registry.pick_unpaired(
            AnomalyKind::WarpGate,
            origin,
            min_distance,
            pool,
            &mut *ctx.rng,
        )?;
        match commit_pairing(ctx, gate_id, partner) {
            Ok(()) => Some(partner),
            Err(err) => {
                tracing::warn!(gate = %gate_id, partner = %partner, error = %err, "registry pick rejected");
                None
            }
        }
    }

    /// Load the candidate's region, inspect it, release it.
    fn try_candidate(
        &self,
        ctx: &mut PairingContext<'_>,
        gate_id: AnomalyId,
        origin: &WorldPos,
        probe: &WorldPos,
    ) -> Result<Option<(AnomalyId, PairingPath)>> {
        let handle = ctx.load_region(probe)?;
        let result = self.inspect_candidate(ctx, gate_id, origin, probe);
        ctx.release(handle);
        result
    }

    fn inspect_candidate(
        &self,
        ctx: &mut PairingContext<'_>,
        gate_id: AnomalyId,
        origin: &WorldPos,
        probe: &WorldPos,
    ) -> Result<Option<(AnomalyId, PairingPath)>> {
        let config = ctx.config;
        let search = &config.search;
        let site = surface_site(&*ctx.host, search, probe);
        let half_extents = search.neighborhood_half_extents;

        let neighbors = ctx.arena.warp_gates_in_box(&site, half_extents, gate_id);
        if !neighbors.is_empty() {
            let unpaired = neighbors
                .into_iter()
                .find(|id| ctx.arena.get(*id).is_some_and(|o| o.partner_id().is_none()));
            let Some(existing) = unpaired else {
                tracing::debug!(site = %site, "candidate occupied by a paired gate");
                return Ok(None);
            };
            let existing_pos = ctx.arena.get(existing).map(|o| o.coordinate().clone());
            if !far_enough(origin, existing_pos.as_ref(), search.primary_min_distance) {
                return Ok(None);
            }
            commit_pairing(ctx, gate_id, existing)?;
            return Ok(Some((existing, PairingPath::ExistingAtCandidate)));
        }
        if ctx.arena.dormant_in_box(&site, half_extents) {
            tracing::debug!(site = %site, "candidate occupied by a dormant gate");
            return Ok(None);
        }
        if !far_enough(origin, Some(&site), search.primary_min_distance) {
            return Ok(None);
        }

        let created = create_gate(ctx, &site)?;
        commit_pairing(ctx, gate_id, created)?;
        Ok(Some((created, PairingPath::Created)))
    }
}

/// Random candidate probe around `origin`; `None` if it rounds inside the primary threshold.
fn candidate_point<R: Rng + ?Sized>(
    origin: &WorldPos,
    search: &SearchConfig,
    rng: &mut R,
) -> Option<WorldPos> {
    let bearing = rng.gen_range(0.0..TAU);
    let distance = rng.gen_range(search.candidate_min_distance..search.candidate_max_distance);
    let (ox, _, oz) = origin.block();
    let x = ox + (bearing.cos() * f64::from(distance)).round() as i32;
    let z = oz + (bearing.sin() * f64::from(distance)).round() as i32;

    let dx = f64::from(x - ox);
    let dz = f64::from(z - oz);
    if (dx * dx + dz * dz).sqrt() < search.primary_min_distance {
        return None;
    }
    Some(WorldPos::new(origin.dimension.clone(), f64::from(x), search.probe_y, f64::from(z)))
}

/// Spawn point above the surface at `probe`'s column.
///
/// A missing or implausibly low surface falls back to `fallback_surface_y`.
pub fn surface_site<T: Terrain + ?Sized>(terrain: &T, search: &SearchConfig, probe: &WorldPos) -> WorldPos {
    let (bx, _, bz) = probe.block();
    let surface = match terrain.surface_height(&probe.dimension, bx, bz) {
        Some(y) if y >= search.min_surface_y => y,
        _ => search.fallback_surface_y,
    };
    WorldPos::new(
        probe.dimension.clone(),
        f64::from(bx) + 0.5,
        f64::from(surface) + search.spawn_height_offset,
        f64::from(bz) + 0.5,
    )
}

fn far_enough(origin: &WorldPos, other: Option<&WorldPos>, min_distance: f64) -> bool {
    other.and_then(|pos| origin.distance_to(pos)).is_some_and(|d| d >= min_distance)
}

/// Place a fresh warp gate at `site`: decorate, register, persist, announce.
fn create_gate(ctx: &mut PairingContext<'_>, site: &WorldPos) -> Result<AnomalyId> {
    let config: &AnomalyConfig = ctx.config;
    if !ctx.host.can_place(AnomalyKind::WarpGate, site) {
        return Err(AnomalyError::PlacementRejected(site.to_string()));
    }

    let id = AnomalyId::generate(&mut *ctx.rng);
    let mut gate = WarpGate::new(id, site.clone());
    if config.warp_gate.terrain_modification {
        ctx.host.decorate_terrain(site);
        gate.terrain_modified = true;
    }
    let object = AnomalyObject::Warp(gate);
    ctx.registry.register(RegistryEntry::from(&object));
    ctx.arena.insert(object);
    ctx.store.put(id, site.clone());
    ctx.host.cue(PresentationCue::GateSpawned { gate: id, kind: AnomalyKind::WarpGate, at: site.clone() });

    tracing::info!(gate = %id, at = %site, "warp gate created for pairing");
    Ok(id)
}
