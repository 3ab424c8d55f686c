//! # anomaly_core - Anomaly Pairing and Teleportation Core
//!
//! Pairs anomaly gates across a lazily-loaded voxel world and moves objects
//! between the two ends of a pair.
//!
//! ## Features
//! - World-anchored warp gates that find a distant partner on first use
//! - Owned mini gates paired by color, with a limited lifetime
//! - Bounded, non-blocking region loading (no sleeping on the simulation thread)
//! - Durable per-world location store with compressed, checksummed saves
//! - Deterministic behavior for a given seed and host
//!
//! ```rust
//! use anomaly_core::{AnomalyConfig, AnomalyWorld};
//!
//! let world = AnomalyWorld::in_memory(AnomalyConfig::default(), 42).unwrap();
//! assert_eq!(world.tick(), 0);
//! ```

// Doc formatting lints - purely cosmetic, fix incrementally
#![allow(clippy::doc_lazy_continuation)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]
// Large enum variants - boxing would require API changes
#![allow(clippy::large_enum_variant)]

pub mod anomaly;
pub mod arena;
pub mod config;
pub mod error;
pub mod geometry;
pub mod host;
pub mod pairing;
pub mod projectile;
pub mod registry;
pub mod resolver;
pub mod save;
pub mod search;
pub mod store;
pub mod teleport;
pub mod world;

#[cfg(test)]
mod testing;

// Re-export the world service
pub use world::{AnomalyWorld, StepReport, TeleportRecord};

// Re-export anomaly types
pub use anomaly::{
    Anomaly, AnomalyId, AnomalyKind, AnomalyObject, GateColor, GateState, MiniGate, OwnerId,
    WarpGate, WarpGateRecord,
};

// Re-export host collaborators
pub use host::{
    MoverKind, MovingObject, Presentation, PresentationCue, RegionLoader, RegionStatus, Terrain,
    WorldHost,
};

pub use config::AnomalyConfig;
pub use error::{AnomalyError, Result};
pub use geometry::{DimensionId, RegionPos, WorldPos};
pub use pairing::{OwnedPairing, PairingContext, PairingStrategy, WorldAnchored};
pub use registry::PairingRegistry;
pub use save::{SaveError, WorldSaveManager};
pub use search::{PairingPath, PairingSearchEngine, SearchOutcome};
pub use store::LocationStore;
pub use teleport::{NoOpReason, TeleportCoordinator, TeleportOutcome};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u32 = save::SAVE_VERSION;
