//! # Anomaly Configuration
//!
//! All tuning constants of the pairing subsystem in one serde-friendly tree.
//!
//! ## Presets
//! - `standard()`: values of a full-size world
//! - `compact()`: short search distances for small or test worlds
//! - `deterministic()`: registry picks always take the nearest match
//!
//! ```rust
//! use anomaly_core::config::AnomalyConfig;
//!
//! let config = AnomalyConfig::default();
//! assert!(config.validate().is_ok());
//! ```

mod gate_config;
mod search_config;

pub use gate_config::{MiniGateConfig, WarpGateConfig};
pub use search_config::{ResolverConfig, SearchConfig};

use crate::error::{AnomalyError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnomalyConfig {
    pub warp_gate: WarpGateConfig,
    pub mini_gate: MiniGateConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl AnomalyConfig {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Small worlds: candidates within a few hundred blocks
    pub fn compact() -> Self {
        let mut cfg = Self::default();
        cfg.search.primary_min_distance = 64.0;
        cfg.search.fallback_min_distance = 16.0;
        cfg.search.candidate_min_distance = 128;
        cfg.search.candidate_max_distance = 512;
        cfg.search.neighborhood_half_extents = [8.0, 8.0, 8.0];
        cfg
    }

    /// Tests: no random choice among registry matches
    pub fn deterministic() -> Self {
        let mut cfg = Self::default();
        cfg.search.registry_candidate_pool = 1;
        cfg
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: AnomalyConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let (warp, mini, search) = (&self.warp_gate, &self.mini_gate, &self.search);
        let distances = [
            ("warp_gate.trigger_radius", warp.trigger_radius),
            ("warp_gate.exit_margin", warp.exit_margin),
            ("warp_gate.exit_lift", warp.exit_lift),
            ("mini_gate.trigger_radius", mini.trigger_radius),
            ("mini_gate.pair_scan_range", mini.pair_scan_range),
            ("mini_gate.exit_margin", mini.exit_margin),
            ("mini_gate.exit_lift", mini.exit_lift),
            ("search.primary_min_distance", search.primary_min_distance),
            ("search.fallback_min_distance", search.fallback_min_distance),
            ("search.spawn_height_offset", search.spawn_height_offset),
            ("search.probe_y", search.probe_y),
        ];
        let extents = search.neighborhood_half_extents.iter().map(|e| ("search.neighborhood_half_extents", *e));
        if let Some((name, value)) = distances.into_iter().chain(extents).find(|(_, v)| !v.is_finite()) {
            return Err(invalid(format!("{name} must be finite, got {value}")));
        }

        if !(0.5..=16.0).contains(&warp.trigger_radius) {
            return Err(invalid(format!("warp_gate.trigger_radius {} not in 0.5..=16", warp.trigger_radius)));
        }
        if !(1..=1200).contains(&warp.teleport_cooldown) {
            return Err(invalid(format!(
                "warp_gate.teleport_cooldown {} not in 1..=1200",
                warp.teleport_cooldown
            )));
        }
        if warp.exit_margin <= 0.0 || self.mini_gate.exit_margin <= 0.0 {
            return Err(invalid("exit_margin must be positive".to_string()));
        }

        if mini.trigger_radius <= 0.0 {
            return Err(invalid("mini_gate.trigger_radius must be positive".to_string()));
        }
        if mini.teleport_cooldown == 0 {
            return Err(invalid("mini_gate.teleport_cooldown must be at least 1".to_string()));
        }
        if mini.max_lifetime_ticks == 0 {
            return Err(invalid("mini_gate.max_lifetime_ticks must be at least 1".to_string()));
        }

        if search.candidate_min_distance >= search.candidate_max_distance {
            return Err(invalid(format!(
                "search.candidate_min_distance {} must be below candidate_max_distance {}",
                search.candidate_min_distance, search.candidate_max_distance
            )));
        }
        if f64::from(search.candidate_max_distance) <= search.primary_min_distance {
            return Err(invalid(format!(
                "search.candidate_max_distance {} never reaches primary_min_distance {}",
                search.candidate_max_distance, search.primary_min_distance
            )));
        }
        if search.fallback_min_distance > search.primary_min_distance {
            return Err(invalid("search.fallback_min_distance exceeds primary_min_distance".to_string()));
        }
        if search.max_attempts == 0 {
            return Err(invalid("search.max_attempts must be at least 1".to_string()));
        }
        if search.registry_candidate_pool == 0 {
            return Err(invalid("search.registry_candidate_pool must be at least 1".to_string()));
        }
        if search.neighborhood_half_extents.iter().any(|e| *e <= 0.0) {
            return Err(invalid("search.neighborhood_half_extents must be positive".to_string()));
        }

        if self.resolver.max_load_polls == 0 {
            return Err(invalid("resolver.max_load_polls must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> AnomalyError {
    AnomalyError::InvalidConfig(msg)
}

// ========== Tests ==========
