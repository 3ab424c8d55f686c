//! Partner search and region loading parameters

use serde::{Deserialize, Serialize};

/// Pairing search parameters
///
/// `primary_min_distance` and `fallback_min_distance` are deliberately separate:
/// the registry lookup before any candidate placement uses the primary value,
/// the lookup after every attempt failed uses the (lower) fallback value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum separation for registry pairing and candidate sites (기본: 500)
    pub primary_min_distance: f64,
    /// Minimum separation for the near fallback lookup (기본: 100)
    pub fallback_min_distance: f64,
    /// Candidate distance lower bound (기본: 1000)
    pub candidate_min_distance: u32,
    /// Candidate distance upper bound, exclusive (기본: 5000)
    pub candidate_max_distance: u32,
    /// Candidate placements per trigger (기본: 5)
    pub max_attempts: u32,
    /// Neighborhood inspected around a candidate surface point (기본: 20, 10, 20)
    pub neighborhood_half_extents: [f64; 3],
    /// Registry lookups pick uniformly among this many nearest matches (기본: 3)
    pub registry_candidate_pool: usize,
    /// Surface heights below this are treated as unknown (기본: 50)
    pub min_surface_y: i32,
    /// Surface height used when the host reports none (기본: 70)
    pub fallback_surface_y: i32,
    /// Gate height above the surface block (기본: 3.0)
    pub spawn_height_offset: f64,
    /// Nominal y of a candidate before the surface is known (기본: 64)
    pub probe_y: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            primary_min_distance: 500.0,
            fallback_min_distance: 100.0,
            candidate_min_distance: 1000,
            candidate_max_distance: 5000,
            max_attempts: 5,
            neighborhood_half_extents: [20.0, 10.0, 20.0],
            registry_candidate_pool: 3,
            min_surface_y: 50,
            fallback_surface_y: 70,
            spawn_height_offset: 3.0,
            probe_y: 64.0,
        }
    }
}

/// Region resolver parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Poll budget for one `ensure_loaded` call; each poll pumps the host pipeline once (기본: 100)
    pub max_load_polls: u32,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_load_polls: 100 }
    }
}
