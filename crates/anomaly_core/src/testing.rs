//! Scripted host used by unit tests

use crate::anomaly::{
    Anomaly, AnomalyId, AnomalyKind, AnomalyObject, GateColor, MiniGate, OwnerId, WarpGate,
};
use crate::arena::GateArena;
use crate::config::AnomalyConfig;
use crate::geometry::{DimensionId, RegionPos, WorldPos};
use crate::host::{Presentation, PresentationCue, RegionLoader, RegionStatus, Terrain};
use crate::pairing::PairingContext;
use crate::registry::{PairingRegistry, RegistryEntry};
use crate::resolver::RegionResolver;
use crate::store::LocationStore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};

pub(crate) struct MockHost {
    /// Always loaded, never released
    pub pinned: HashSet<RegionPos>,
    statuses: HashMap<RegionPos, RegionStatus>,
    pending: HashMap<RegionPos, u32>,
    /// Pumps a requested region needs before it is ready
    pub load_latency: u32,
    pub failing: HashSet<RegionPos>,
    /// Every non-pinned region fails once its load completes
    pub fail_all: bool,
    pub stalled: HashSet<RegionPos>,
    pub surface: HashMap<(i32, i32), i32>,
    pub default_surface: Option<i32>,
    pub solid: HashSet<(i32, i32, i32)>,
    pub refuse_placement: bool,
    pub decorated: Vec<WorldPos>,
    pub cues: Vec<PresentationCue>,
    pub requests: Vec<RegionPos>,
    pub releases: Vec<RegionPos>,
    pub pumps: u32,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            pinned: HashSet::new(),
            statuses: HashMap::new(),
            pending: HashMap::new(),
            load_latency: 3,
            failing: HashSet::new(),
            fail_all: false,
            stalled: HashSet::new(),
            surface: HashMap::new(),
            default_surface: Some(68),
            solid: HashSet::new(),
            refuse_placement: false,
            decorated: Vec::new(),
            cues: Vec::new(),
            requests: Vec::new(),
            releases: Vec::new(),
            pumps: 0,
        }
    }

    pub fn pin(&mut self, pos: &WorldPos) {
        self.pinned.insert(pos.region());
    }

    pub fn fail_at(&mut self, pos: &WorldPos) {
        self.failing.insert(pos.region());
    }

    /// Unload a region the way a host would when no one holds a ticket.
    pub fn unload(&mut self, region: &RegionPos) {
        self.pinned.remove(region);
        self.statuses.remove(region);
        self.pending.remove(region);
    }

    pub fn arrivals(&self) -> usize {
        self.cues.iter().filter(|c| matches!(c, PresentationCue::TeleportArrival { .. })).count()
    }
}

impl RegionLoader for MockHost {
    fn request_region(&mut self, region: &RegionPos) {
        self.requests.push(region.clone());
        if self.pinned.contains(region) || self.statuses.contains_key(region) {
            return;
        }
        self.statuses.insert(region.clone(), RegionStatus::Loading);
        self.pending.insert(region.clone(), self.load_latency);
    }

    fn region_status(&self, region: &RegionPos) -> RegionStatus {
        if self.pinned.contains(region) {
            return RegionStatus::Ready;
        }
        self.statuses.get(region).copied().unwrap_or(RegionStatus::Unloaded)
    }

    fn pump(&mut self) {
        self.pumps += 1;
        let mut finished = Vec::new();
        for (region, remaining) in self.pending.iter_mut() {
            if self.stalled.contains(region) {
                continue;
            }
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                finished.push(region.clone());
            }
        }
        for region in finished {
            self.pending.remove(&region);
            let status = if self.fail_all || self.failing.contains(&region) {
                RegionStatus::Failed
            } else {
                RegionStatus::Ready
            };
            self.statuses.insert(region, status);
        }
    }

    fn release_region(&mut self, region: &RegionPos) {
        self.releases.push(region.clone());
        if !self.pinned.contains(region) {
            self.statuses.remove(region);
            self.pending.remove(region);
        }
    }
}

impl Terrain for MockHost {
    fn surface_height(&self, _dimension: &DimensionId, x: i32, z: i32) -> Option<i32> {
        self.surface.get(&(x, z)).copied().or(self.default_surface)
    }

    fn is_solid(&self, _dimension: &DimensionId, block: (i32, i32, i32)) -> bool {
        self.solid.contains(&block)
    }

    fn can_place(&self, _kind: AnomalyKind, _site: &WorldPos) -> bool {
        !self.refuse_placement
    }

    fn decorate_terrain(&mut self, center: &WorldPos) {
        self.decorated.push(center.clone());
    }
}

impl Presentation for MockHost {
    fn cue(&mut self, cue: PresentationCue) {
        self.cues.push(cue);
    }
}

/// World services wired to a `MockHost`, for tests below the world service
pub(crate) struct Fixture {
    pub arena: GateArena,
    pub registry: PairingRegistry,
    pub store: LocationStore,
    pub resolver: RegionResolver,
    pub host: MockHost,
    pub rng: ChaCha8Rng,
    pub config: AnomalyConfig,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(AnomalyConfig::deterministic())
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self {
            arena: GateArena::new(),
            registry: PairingRegistry::new(),
            store: LocationStore::new(),
            resolver: RegionResolver::new(config.resolver.clone()),
            host: MockHost::new(),
            rng: ChaCha8Rng::seed_from_u64(11),
            config,
        }
    }

    pub fn ctx(&mut self) -> PairingContext<'_> {
        PairingContext {
            arena: &mut self.arena,
            registry: &mut self.registry,
            store: &mut self.store,
            resolver: &mut self.resolver,
            host: &mut self.host,
            rng: &mut self.rng,
            config: &self.config,
            tick: 0,
        }
    }

    /// Resident, registered warp gate in a pinned region.
    pub fn add_warp(&mut self, x: f64) -> AnomalyId {
        self.add_warp_at(WorldPos::overworld(x, 70.0, 0.5))
    }

    pub fn add_warp_at(&mut self, pos: WorldPos) -> AnomalyId {
        let object = AnomalyObject::Warp(WarpGate::new(AnomalyId::generate(&mut self.rng), pos));
        let id = object.id();
        self.registry.register(RegistryEntry::from(&object));
        self.store.put(id, object.coordinate().clone());
        self.host.pin(object.coordinate());
        self.arena.insert(object);
        id
    }

    pub fn add_mini(&mut self, x: f64, color: GateColor, owner: OwnerId) -> AnomalyId {
        let pos = WorldPos::overworld(x, 65.0, 0.5);
        let gate = MiniGate::new(AnomalyId::generate(&mut self.rng), pos.clone(), color, owner, 0);
        let id = gate.id;
        self.host.pin(&pos);
        self.arena.insert(AnomalyObject::Mini(gate));
        id
    }
}
