//! World-anchored warp gate

use super::{Anomaly, AnomalyId, AnomalyKind, GateState, UpdateSignals};
use crate::config::AnomalyConfig;
use crate::geometry::WorldPos;
use serde::{Deserialize, Serialize};

pub const WARP_GATE_SOUND: &str = "strangematter:warp_gate_loop";

/// A warp gate placed by world generation or by the pairing search.
#[derive(Debug, Clone)]
pub struct WarpGate {
    pub id: AnomalyId,
    pub coordinate: WorldPos,
    pub state: GateState,
    /// Last known partner coordinate, refreshed on every commit
    pub partner_location_hint: Option<WorldPos>,
    /// Terrain decoration already happened (persisted)
    pub terrain_modified: bool,
    /// Steps since this object became resident
    pub ticks_alive: u64,
    /// Searches run while unpaired (diagnostics only)
    pub search_attempts: u32,
}

impl WarpGate {
    pub fn new(id: AnomalyId, coordinate: WorldPos) -> Self {
        Self {
            id,
            coordinate,
            state: GateState::default(),
            partner_location_hint: None,
            terrain_modified: false,
            ticks_alive: 0,
            search_attempts: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    /// Contained gates stop teleporting but keep their pairing.
    pub fn set_active(&mut self, active: bool) {
        self.state.active = active;
    }

    pub fn to_record(&self) -> WarpGateRecord {
        WarpGateRecord {
            id: self.id.to_string(),
            coordinate: self.coordinate.clone(),
            partner_id: self.state.partner_id.map(|p| p.to_string()).unwrap_or_default(),
            active: self.state.active,
            teleport_cooldown: self.state.teleport_cooldown,
            partner_location_hint: self.partner_location_hint.clone(),
            terrain_modified: self.terrain_modified,
        }
    }

    /// Restore a gate from its persisted record.
    ///
    /// Returns `None` when the gate's own id is unreadable. An unreadable partner
    /// id only clears the pairing.
    pub fn from_record(record: &WarpGateRecord) -> Option<Self> {
        let Some(id) = AnomalyId::parse(&record.id) else {
            tracing::warn!(id = %record.id, "dropping warp gate record with malformed id");
            return None;
        };

        let partner_id = AnomalyId::parse(&record.partner_id);
        if partner_id.is_none() && !record.partner_id.is_empty() {
            tracing::warn!(gate = %id, partner = %record.partner_id, "malformed partner id, pairing reset");
        }

        let mut gate = WarpGate::new(id, record.coordinate.clone());
        gate.state = GateState {
            partner_id,
            active: record.active,
            teleport_cooldown: record.teleport_cooldown,
        };
        gate.partner_location_hint =
            if partner_id.is_some() { record.partner_location_hint.clone() } else { None };
        gate.terrain_modified = record.terrain_modified;
        Some(gate)
    }
}

impl Anomaly for WarpGate {
    fn id(&self) -> AnomalyId {
        self.id
    }

    fn kind(&self) -> AnomalyKind {
        AnomalyKind::WarpGate
    }

    fn coordinate(&self) -> &WorldPos {
        &self.coordinate
    }

    fn update(&mut self, _tick: u64, config: &AnomalyConfig) -> UpdateSignals {
        self.ticks_alive += 1;
        self.state.tick_cooldown();

        let mut signals = UpdateSignals { register: self.ticks_alive == 1, ..Default::default() };

        if config.warp_gate.terrain_modification
            && !self.terrain_modified
            && self.ticks_alive > config.warp_gate.terrain_delay_ticks
        {
            self.terrain_modified = true;
            signals.decorate_terrain = true;
        }
        signals
    }

    fn on_removed(&mut self) -> Option<AnomalyId> {
        self.state.active = false;
        self.partner_location_hint = None;
        self.state.partner_id.take()
    }

    fn sound_id(&self) -> Option<&'static str> {
        Some(WARP_GATE_SOUND)
    }

    fn research_yield(&self, config: &AnomalyConfig) -> u32 {
        config.warp_gate.research_points
    }
}

/// Persisted per-gate state
///
/// Ids are kept as strings so a damaged save degrades to "unpaired" instead of
/// failing the whole load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarpGateRecord {
    pub id: String,
    pub coordinate: WorldPos,
    /// Empty when unpaired
    #[serde(default)]
    pub partner_id: String,
    pub active: bool,
    pub teleport_cooldown: u32,
    #[serde(default)]
    pub partner_location_hint: Option<WorldPos>,
    #[serde(default)]
    pub terrain_modified: bool,
}
