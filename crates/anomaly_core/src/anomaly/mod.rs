//! Anomaly objects
//!
//! Every pairable kind implements [`Anomaly`]; resident objects are stored as the
//! tagged [`AnomalyObject`] so the world service can hold all kinds in one arena
//! and still match on the concrete variant where the behavior differs.

pub mod mini_gate;
pub mod warp_gate;

pub use mini_gate::{GateColor, MiniGate};
pub use warp_gate::{WarpGate, WarpGateRecord};

use crate::config::AnomalyConfig;
use crate::geometry::WorldPos;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Process-wide unique anomaly identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnomalyId(pub Uuid);

impl AnomalyId {
    /// Draw an id from the caller's RNG so seeded worlds stay reproducible.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a persisted id; empty or malformed strings are `None`.
    pub fn parse(s: &str) -> Option<Self> {
        if s.is_empty() {
            return None;
        }
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl fmt::Display for AnomalyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Controlling actor of owned gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnomalyKind {
    WarpGate,
    MiniGate,
}

impl AnomalyKind {
    /// Kinds whose location is written to the world's Location Store.
    pub fn is_durable(self) -> bool {
        matches!(self, AnomalyKind::WarpGate)
    }
}

/// Pairing and cooldown state shared by every gate kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    pub partner_id: Option<AnomalyId>,
    pub active: bool,
    pub teleport_cooldown: u32,
}

impl Default for GateState {
    fn default() -> Self {
        Self { partner_id: None, active: true, teleport_cooldown: 0 }
    }
}

impl GateState {
    pub fn is_paired(&self) -> bool {
        self.partner_id.is_some()
    }

    /// One step of cooldown, floored at zero.
    pub fn tick_cooldown(&mut self) {
        self.teleport_cooldown = self.teleport_cooldown.saturating_sub(1);
    }
}

/// What the world service has to do after an object's update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSignals {
    /// First update step: register in the Registry (and Location Store if durable)
    pub register: bool,
    /// Ask the host to decorate the terrain around the object
    pub decorate_terrain: bool,
    /// Lifetime is over; remove the object this step
    pub expired: bool,
}

/// Capability set of an anomaly kind
pub trait Anomaly {
    fn id(&self) -> AnomalyId;

    fn kind(&self) -> AnomalyKind;

    fn coordinate(&self) -> &WorldPos;

    /// Per-step bookkeeping. Never touches other objects.
    fn update(&mut self, tick: u64, config: &AnomalyConfig) -> UpdateSignals;

    /// Detach the object before removal. Returns the partner that must be unlinked.
    fn on_removed(&mut self) -> Option<AnomalyId>;

    /// Looping sound the presentation layer should attach, if any.
    fn sound_id(&self) -> Option<&'static str>;

    /// Research points granted when the object is scanned.
    fn research_yield(&self, config: &AnomalyConfig) -> u32;
}

/// A resident object of any kind
#[derive(Debug, Clone)]
pub enum AnomalyObject {
    Warp(WarpGate),
    Mini(MiniGate),
}

impl AnomalyObject {
    pub fn gate_state(&self) -> &GateState {
        match self {
            AnomalyObject::Warp(gate) => &gate.state,
            AnomalyObject::Mini(gate) => &gate.state,
        }
    }

    pub fn gate_state_mut(&mut self) -> &mut GateState {
        match self {
            AnomalyObject::Warp(gate) => &mut gate.state,
            AnomalyObject::Mini(gate) => &mut gate.state,
        }
    }

    pub fn partner_id(&self) -> Option<AnomalyId> {
        self.gate_state().partner_id
    }

    pub fn as_warp(&self) -> Option<&WarpGate> {
        match self {
            AnomalyObject::Warp(gate) => Some(gate),
            AnomalyObject::Mini(_) => None,
        }
    }

    pub fn as_warp_mut(&mut self) -> Option<&mut WarpGate> {
        match self {
            AnomalyObject::Warp(gate) => Some(gate),
            AnomalyObject::Mini(_) => None,
        }
    }

    pub fn as_mini(&self) -> Option<&MiniGate> {
        match self {
            AnomalyObject::Mini(gate) => Some(gate),
            AnomalyObject::Warp(_) => None,
        }
    }

    /// Trigger radius of this object's kind.
    pub fn trigger_radius(&self, config: &AnomalyConfig) -> f64 {
        match self {
            AnomalyObject::Warp(_) => config.warp_gate.trigger_radius,
            AnomalyObject::Mini(_) => config.mini_gate.trigger_radius,
        }
    }

    /// Cooldown applied after a teleport through this object's kind.
    pub fn teleport_cooldown(&self, config: &AnomalyConfig) -> u32 {
        match self {
            AnomalyObject::Warp(_) => config.warp_gate.teleport_cooldown,
            AnomalyObject::Mini(_) => config.mini_gate.teleport_cooldown,
        }
    }

    /// Record the partner on this side of a pair. `hint` is cached by durable kinds only.
    pub(crate) fn link_to(&mut self, partner: AnomalyId, hint: &WorldPos) {
        match self {
            AnomalyObject::Warp(gate) => {
                gate.state.partner_id = Some(partner);
                gate.partner_location_hint = Some(hint.clone());
            }
            AnomalyObject::Mini(gate) => {
                gate.state.partner_id = Some(partner);
                gate.state.active = true;
            }
        }
    }

    /// Forget the partner on this side of a pair.
    pub(crate) fn unlink(&mut self) {
        match self {
            AnomalyObject::Warp(gate) => {
                gate.state.partner_id = None;
                gate.partner_location_hint = None;
            }
            AnomalyObject::Mini(gate) => {
                gate.state.partner_id = None;
            }
        }
    }
}

impl Anomaly for AnomalyObject {
    fn id(&self) -> AnomalyId {
        match self {
            AnomalyObject::Warp(gate) => gate.id(),
            AnomalyObject::Mini(gate) => gate.id(),
        }
    }

    fn kind(&self) -> AnomalyKind {
        match self {
            AnomalyObject::Warp(gate) => gate.kind(),
            AnomalyObject::Mini(gate) => gate.kind(),
        }
    }

    fn coordinate(&self) -> &WorldPos {
        match self {
            AnomalyObject::Warp(gate) => gate.coordinate(),
            AnomalyObject::Mini(gate) => gate.coordinate(),
        }
    }

    fn update(&mut self, tick: u64, config: &AnomalyConfig) -> UpdateSignals {
        match self {
            AnomalyObject::Warp(gate) => gate.update(tick, config),
            AnomalyObject::Mini(gate) => gate.update(tick, config),
        }
    }

    fn on_removed(&mut self) -> Option<AnomalyId> {
        match self {
            AnomalyObject::Warp(gate) => gate.on_removed(),
            AnomalyObject::Mini(gate) => gate.on_removed(),
        }
    }

    fn sound_id(&self) -> Option<&'static str> {
        match self {
            AnomalyObject::Warp(gate) => gate.sound_id(),
            AnomalyObject::Mini(gate) => gate.sound_id(),
        }
    }

    fn research_yield(&self, config: &AnomalyConfig) -> u32 {
        match self {
            AnomalyObject::Warp(gate) => gate.research_yield(config),
            AnomalyObject::Mini(gate) => gate.research_yield(config),
        }
    }
}
