//! # Anomaly World
//!
//! One `AnomalyWorld` per loaded world owns the arena, the Pairing Registry,
//! the Location Store and the Region Resolver. The embedding host drives it
//! with [`AnomalyWorld::step`] once per simulation step and implements
//! [`WorldHost`] for region loading, terrain and presentation.
//!
//! ## Step order
//! 1. residency sync: dormant gates in ready regions become resident, resident
//!    gates in unloaded regions become dormant (mini gates are discarded)
//! 2. update pass: cooldowns, first-step registration, terrain decoration, expiry
//! 3. trigger pass: every resident gate, in id order, against every mover in range
//!
//! A mover is teleported at most once per step.

use crate::anomaly::{
    Anomaly, AnomalyId, AnomalyKind, AnomalyObject, GateColor, MiniGate, OwnerId, WarpGate,
};
use crate::arena::GateArena;
use crate::config::AnomalyConfig;
use crate::error::{AnomalyError, Result};
use crate::geometry::{DimensionId, WorldPos};
use crate::host::{MovingObject, PresentationCue, RegionStatus, WorldHost};
use crate::pairing::{retire, strategy_for, PairingContext};
use crate::projectile::find_gate_site;
use crate::registry::{PairingRegistry, RegistryEntry};
use crate::resolver::RegionResolver;
use crate::save::{PendingSave, WorldSaveManager, WorldSnapshot};
use crate::store::LocationStore;
use crate::teleport::{TeleportCoordinator, TeleportOutcome};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::fmt::Write;

/// One completed teleport
#[derive(Debug, Clone, PartialEq)]
pub struct TeleportRecord {
    pub mover: u64,
    pub gate: AnomalyId,
    pub partner: AnomalyId,
    pub destination: WorldPos,
}

/// What happened during one step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    pub tick: u64,
    pub teleports: Vec<TeleportRecord>,
    /// Pairs formed by trigger-time searches
    pub pairings: usize,
    pub removed: Vec<AnomalyId>,
    /// Triggers that found no partner
    pub no_partner: usize,
}

pub struct AnomalyWorld {
    config: AnomalyConfig,
    arena: GateArena,
    registry: PairingRegistry,
    store: LocationStore,
    resolver: RegionResolver,
    rng: ChaCha8Rng,
    tick: u64,
    saver: Option<WorldSaveManager>,
    pending_save: Option<PendingSave>,
}

impl AnomalyWorld {
    /// A world without persistence.
    pub fn in_memory(config: AnomalyConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: RegionResolver::new(config.resolver.clone()),
            config,
            arena: GateArena::new(),
            registry: PairingRegistry::new(),
            store: LocationStore::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            saver: None,
            pending_save: None,
        })
    }

    /// Open a world and restore its saved anomalies as dormant records.
    ///
    /// They become resident once the host reports their region ready. An
    /// unreadable save starts the world empty; a corrupt or newer one is an error.
    pub fn open_for_world(config: AnomalyConfig, saver: WorldSaveManager, seed: u64) -> Result<Self> {
        let mut world = Self::in_memory(config, seed)?;
        let loaded = match saver.load() {
            Ok(loaded) => loaded,
            Err(err) if err.is_recoverable() => {
                tracing::warn!(path = ?saver.path(), error = %err, "anomaly save unreadable, starting empty");
                None
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(save) = loaded {
            world.tick = save.tick;
            world.store = LocationStore::from_records(&save.locations);
            for record in save.gates {
                let Some(id) = AnomalyId::parse(&record.id) else {
                    tracing::warn!(id = %record.id, "skipping gate record with malformed id");
                    continue;
                };
                if !world.store.contains(id) {
                    world.store.put(id, record.coordinate.clone());
                }
                world.arena.add_dormant(record);
            }
            world.store.mark_clean();
            tracing::info!(
                locations = world.store.len(),
                gates = world.arena.dormant_records().count(),
                tick = world.tick,
                "anomaly world restored"
            );
        }
        world.saver = Some(saver);
        Ok(world)
    }

    /// Final save, then drop every world-scoped structure.
    pub fn close_for_world(mut self) -> Result<()> {
        if self.saver.is_some() {
            self.save()?;
        }
        tracing::info!(tick = self.tick, "anomaly world closed");
        Ok(())
    }

    /// Write the current state now, after any background save has finished.
    pub fn save(&mut self) -> Result<()> {
        if let Err(err) = self.finish_background_save() {
            tracing::warn!(error = %err, "background anomaly save failed, saving again");
        }
        let Some(saver) = &self.saver else {
            return Ok(());
        };
        let snapshot = self.snapshot();
        let generation = snapshot.generation;
        saver.save(&snapshot.into_save())?;
        self.store.mark_saved(generation);
        Ok(())
    }

    /// Hand a snapshot to a worker thread; the simulation keeps running.
    ///
    /// Returns `false` without a saver or while the previous background save
    /// is still running. The store stays dirty until
    /// [`finish_background_save`](Self::finish_background_save) sees the write succeed.
    pub fn save_in_background(&mut self) -> bool {
        if self.saver.is_none() {
            return false;
        }
        if let Some(pending) = &self.pending_save {
            if !pending.is_finished() {
                tracing::debug!("background anomaly save still running");
                return false;
            }
            if let Err(err) = self.finish_background_save() {
                tracing::warn!(error = %err, "previous background anomaly save failed");
            }
        }
        let snapshot = self.snapshot();
        let Some(saver) = &self.saver else {
            return false;
        };
        self.pending_save = Some(saver.spawn_save(snapshot));
        true
    }

    /// Wait for the background save, if any, and clean the store when it was written.
    pub fn finish_background_save(&mut self) -> Result<()> {
        let Some(pending) = self.pending_save.take() else {
            return Ok(());
        };
        let generation = pending.generation();
        pending.join()?;
        self.store.mark_saved(generation);
        Ok(())
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save.is_some()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            generation: self.store.generation(),
            locations: self.store.snapshot(),
            gates: self.arena.warp_gate_records(),
        }
    }

    fn context<'a>(&'a mut self, host: &'a mut dyn WorldHost) -> PairingContext<'a> {
        PairingContext {
            arena: &mut self.arena,
            registry: &mut self.registry,
            store: &mut self.store,
            resolver: &mut self.resolver,
            host,
            rng: &mut self.rng,
            config: &self.config,
            tick: self.tick,
        }
    }

    // ========== Creation and removal ==========

    /// Place a warp gate from world generation. It registers on its first step.
    pub fn spawn_warp_gate(&mut self, host: &mut dyn WorldHost, coordinate: WorldPos) -> Result<AnomalyId> {
        if !host.can_place(AnomalyKind::WarpGate, &coordinate) {
            return Err(AnomalyError::PlacementRejected(coordinate.to_string()));
        }
        let id = AnomalyId::generate(&mut self.rng);
        self.arena.insert(AnomalyObject::Warp(WarpGate::new(id, coordinate.clone())));
        host.cue(PresentationCue::GateSpawned { gate: id, kind: AnomalyKind::WarpGate, at: coordinate });

        let mut ctx = self.context(host);
        strategy_for(AnomalyKind::WarpGate).on_created(&mut ctx, id);
        Ok(id)
    }

    /// Place a mini gate for `owner` and pair it with the owner's opposite color.
    pub fn spawn_mini_gate(
        &mut self,
        host: &mut dyn WorldHost,
        coordinate: WorldPos,
        color: GateColor,
        owner: OwnerId,
    ) -> Result<AnomalyId> {
        if !host.can_place(AnomalyKind::MiniGate, &coordinate) {
            return Err(AnomalyError::PlacementRejected(coordinate.to_string()));
        }
        let id = AnomalyId::generate(&mut self.rng);
        let gate = MiniGate::new(id, coordinate.clone(), color, owner, self.tick);
        self.arena.insert(AnomalyObject::Mini(gate));
        host.cue(PresentationCue::GateSpawned { gate: id, kind: AnomalyKind::MiniGate, at: coordinate });

        let mut ctx = self.context(host);
        strategy_for(AnomalyKind::MiniGate).on_created(&mut ctx, id);
        Ok(id)
    }

    /// A warp projectile hit `hit_block`; open a gate next to it if there is room.
    pub fn on_projectile_impact(
        &mut self,
        host: &mut dyn WorldHost,
        dimension: &DimensionId,
        hit_block: (i32, i32, i32),
        color: GateColor,
        owner: OwnerId,
    ) -> Option<AnomalyId> {
        let Some(site) = find_gate_site(&*host, dimension, hit_block) else {
            tracing::debug!(?hit_block, "no room for a mini gate");
            return None;
        };
        match self.spawn_mini_gate(host, site, color, owner) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::debug!(?hit_block, error = %err, "mini gate not placed");
                None
            }
        }
    }

    /// Remove a gate, resident or dormant. Its partner becomes unpaired.
    pub fn remove(&mut self, host: &mut dyn WorldHost, id: AnomalyId) -> bool {
        let mut ctx = self.context(host);
        retire(&mut ctx, id)
    }

    /// Contain or release a warp gate. Pairing is kept either way.
    pub fn set_active(&mut self, id: AnomalyId, active: bool) -> bool {
        if let Some(gate) = self.arena.get_mut(id).and_then(AnomalyObject::as_warp_mut) {
            gate.set_active(active);
            return true;
        }
        if let Some(record) = self.arena.dormant_record_mut(id) {
            record.active = active;
            return true;
        }
        false
    }

    // ========== Simulation step ==========

    pub fn step(&mut self, host: &mut dyn WorldHost, movers: &mut [MovingObject]) -> StepReport {
        self.tick += 1;
        let mut report = StepReport { tick: self.tick, ..Default::default() };

        self.sync_residency(host, &mut report);
        self.update_pass(host, &mut report);
        self.trigger_pass(host, movers, &mut report);

        report
    }

    fn sync_residency(&mut self, host: &mut dyn WorldHost, report: &mut StepReport) {
        for region in self.arena.dormant_regions() {
            if host.region_status(&region) == RegionStatus::Ready {
                self.arena.activate_region(&region, &mut self.registry);
            }
        }

        for region in self.arena.resident_regions() {
            if host.region_status(&region) == RegionStatus::Ready || self.resolver.is_held(&region) {
                continue;
            }
            for id in self.arena.mini_gates_in_region(&region) {
                let mut ctx = self.context(&mut *host);
                if retire(&mut ctx, id) {
                    report.removed.push(id);
                }
            }
            self.arena.deactivate_region(&region, &mut self.registry, &mut self.store);
        }
    }

    fn update_pass(&mut self, host: &mut dyn WorldHost, report: &mut StepReport) {
        let mut expired = Vec::new();
        for id in self.arena.ids() {
            let Some(object) = self.arena.get_mut(id) else {
                continue;
            };
            let signals = object.update(self.tick, &self.config);
            if signals.expired {
                expired.push(id);
                continue;
            }
            if signals.register {
                self.registry.register(RegistryEntry::from(&*object));
                if object.kind().is_durable() {
                    self.store.put(id, object.coordinate().clone());
                }
            }
            if signals.decorate_terrain {
                host.decorate_terrain(object.coordinate());
            }
        }

        for id in expired {
            let mut ctx = self.context(&mut *host);
            if retire(&mut ctx, id) {
                tracing::debug!(gate = %id, "mini gate expired");
                report.removed.push(id);
            }
        }
    }

    fn trigger_pass(
        &mut self,
        host: &mut dyn WorldHost,
        movers: &mut [MovingObject],
        report: &mut StepReport,
    ) {
        let mut moved: HashSet<u64> = HashSet::new();
        for gate_id in self.arena.ids() {
            let Some(gate) = self.arena.get(gate_id) else {
                continue;
            };
            let strategy = strategy_for(gate.kind());
            let gate_pos = gate.coordinate().clone();
            let radius = gate.trigger_radius(&self.config);

            for mover in movers.iter_mut() {
                if moved.contains(&mover.id) {
                    continue;
                }
                if !mover.position.distance_to(&gate_pos).is_some_and(|d| d <= radius) {
                    continue;
                }
                let mut ctx = self.context(&mut *host);
                match TeleportCoordinator.on_trigger(&mut ctx, strategy, gate_id, mover) {
                    TeleportOutcome::Teleported { partner, destination, newly_paired } => {
                        moved.insert(mover.id);
                        if newly_paired {
                            report.pairings += 1;
                        }
                        report.teleports.push(TeleportRecord {
                            mover: mover.id,
                            gate: gate_id,
                            partner,
                            destination,
                        });
                        break;
                    }
                    TeleportOutcome::NoPartner => {
                        // One search per gate and step
                        report.no_partner += 1;
                        break;
                    }
                    TeleportOutcome::NoOp(_) => {}
                }
            }
        }
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn get(&self, id: AnomalyId) -> Option<&AnomalyObject> {
        self.arena.get(id)
    }

    pub fn partner_of(&self, id: AnomalyId) -> Option<AnomalyId> {
        if let Some(object) = self.arena.get(id) {
            return object.partner_id();
        }
        self.arena.dormant_record(id).and_then(|r| AnomalyId::parse(&r.partner_id))
    }

    pub fn registry(&self) -> &PairingRegistry {
        &self.registry
    }

    pub fn store(&self) -> &LocationStore {
        &self.store
    }

    pub fn arena(&self) -> &GateArena {
        &self.arena
    }

    pub fn research_yield(&self, id: AnomalyId) -> u32 {
        self.arena.get(id).map_or(0, |o| o.research_yield(&self.config))
    }

    pub fn sound_id(&self, id: AnomalyId) -> Option<&'static str> {
        self.arena.get(id).and_then(|o| o.sound_id())
    }

    pub fn debug_info(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "AnomalyWorld tick {}: {} resident, {} dormant, {} stored locations, {} held regions",
            self.tick,
            self.arena.len(),
            self.arena.dormant_records().count(),
            self.store.len(),
            self.resolver.held_regions()
        );
        out.push_str(&self.registry.debug_info());
        out
    }
}
