//! Collaborators provided by the embedding world
//!
//! The core never renders, plays sounds or edits terrain itself; it calls these
//! traits. A host implements all three and gets [`WorldHost`] for free.

use crate::anomaly::{AnomalyId, AnomalyKind};
use crate::geometry::{DimensionId, RegionPos, WorldPos};
use nalgebra::Vector3;

/// Load state of a region as reported by the host pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionStatus {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

/// Asynchronous region loading pipeline
pub trait RegionLoader {
    /// Add this subsystem's load ticket for `region`. Idempotent.
    fn request_region(&mut self, region: &RegionPos);

    fn region_status(&self, region: &RegionPos) -> RegionStatus;

    /// Advance pending loads by one unit of work. Must not block.
    fn pump(&mut self);

    /// Drop this subsystem's load ticket for `region`.
    fn release_region(&mut self, region: &RegionPos);
}

/// Terrain queries and edits
pub trait Terrain {
    /// Height of the top surface block in column `(x, z)`, if known.
    fn surface_height(&self, dimension: &DimensionId, x: i32, z: i32) -> Option<i32>;

    fn is_solid(&self, dimension: &DimensionId, block: (i32, i32, i32)) -> bool;

    /// Whether an anomaly of `kind` may be placed at `site`.
    fn can_place(&self, kind: AnomalyKind, site: &WorldPos) -> bool;

    /// Anomalous grass and ore around a freshly placed gate.
    fn decorate_terrain(&mut self, center: &WorldPos);
}

/// Notifications for the presentation layer (sound, particles)
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationCue {
    TeleportDeparture { gate: AnomalyId, at: WorldPos },
    TeleportArrival { gate: AnomalyId, at: WorldPos },
    GateSpawned { gate: AnomalyId, kind: AnomalyKind, at: WorldPos },
    GateRemoved { gate: AnomalyId, at: WorldPos },
}

pub trait Presentation {
    fn cue(&mut self, cue: PresentationCue);
}

pub trait WorldHost: RegionLoader + Terrain + Presentation {}

impl<T: RegionLoader + Terrain + Presentation + ?Sized> WorldHost for T {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    Player,
    Creature,
    /// Items, projectiles and other non-living objects
    Inert,
}

impl MoverKind {
    pub fn is_living(self) -> bool {
        matches!(self, MoverKind::Player | MoverKind::Creature)
    }
}

/// An object that can be carried through a gate
#[derive(Debug, Clone, PartialEq)]
pub struct MovingObject {
    pub id: u64,
    pub kind: MoverKind,
    pub position: WorldPos,
    pub velocity: Vector3<f64>,
    pub yaw: f32,
    pub pitch: f32,
}

impl MovingObject {
    pub fn new(id: u64, kind: MoverKind, position: WorldPos) -> Self {
        Self { id, kind, position, velocity: Vector3::zeros(), yaw: 0.0, pitch: 0.0 }
    }

    /// Relocate, keeping velocity and orientation.
    pub fn relocate(&mut self, destination: WorldPos) {
        self.position = destination;
    }
}
