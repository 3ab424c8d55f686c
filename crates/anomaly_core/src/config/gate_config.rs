//! Per-kind gate tuning

use serde::{Deserialize, Serialize};

/// World-anchored warp gate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarpGateConfig {
    /// Master toggle for every warp gate effect (기본: true)
    pub enable_effects: bool,
    /// Teleportation effect toggle (기본: true)
    pub enable_teleport: bool,
    /// Trigger radius in blocks, 0.5..=16 (기본: 2.0)
    pub trigger_radius: f64,
    /// Cooldown applied to both gates after a teleport, 1..=1200 ticks (기본: 100)
    pub teleport_cooldown: u32,
    /// Extra horizontal distance beyond the partner's trigger radius (기본: 1.0)
    pub exit_margin: f64,
    /// Vertical lift of the arrival point (기본: 0.5)
    pub exit_lift: f64,
    /// Research points granted when scanned (기본: 10)
    pub research_points: u32,
    /// Decorate the surrounding terrain once per gate (기본: true)
    pub terrain_modification: bool,
    /// Ticks to wait before decorating (기본: 20)
    pub terrain_delay_ticks: u64,
}

impl Default for WarpGateConfig {
    fn default() -> Self {
        Self {
            enable_effects: true,
            enable_teleport: true,
            trigger_radius: 2.0,
            teleport_cooldown: 100,
            exit_margin: 1.0,
            exit_lift: 0.5,
            research_points: 10,
            terrain_modification: true,
            terrain_delay_ticks: 20,
        }
    }
}

/// Owned mini gate parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniGateConfig {
    /// Trigger radius in blocks (기본: 1.0)
    pub trigger_radius: f64,
    /// Cooldown applied to both gates after a teleport (기본: 40)
    pub teleport_cooldown: u32,
    /// Lifetime before the gate retires itself (기본: 12000 = 10 minutes at 20 TPS)
    pub max_lifetime_ticks: u64,
    /// Maximum distance to an opposite-color partner at creation (기본: 100.0)
    pub pair_scan_range: f64,
    /// Extra horizontal distance beyond the partner's trigger radius (기본: 0.5)
    pub exit_margin: f64,
    /// Vertical lift of the arrival point (기본: 0.5)
    pub exit_lift: f64,
}

impl Default for MiniGateConfig {
    fn default() -> Self {
        Self {
            trigger_radius: 1.0,
            teleport_cooldown: 40,
            max_lifetime_ticks: 12_000,
            pair_scan_range: 100.0,
            exit_margin: 0.5,
            exit_lift: 0.5,
        }
    }
}
