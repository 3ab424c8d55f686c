//! Projectile impact sites
//!
//! A warp projectile opens a mini gate where it hits, provided a free 2×2×2
//! space exists next to the hit block.

use crate::geometry::{DimensionId, WorldPos};
use crate::host::Terrain;

/// Spawn point for a mini gate around `hit_block`, searching its 3×3×3 neighborhood.
pub fn find_gate_site<T: Terrain + ?Sized>(
    terrain: &T,
    dimension: &DimensionId,
    hit_block: (i32, i32, i32),
) -> Option<WorldPos> {
    let (hx, hy, hz) = hit_block;
    for dx in -1..=1 {
        for dy in -1..=1 {
            for dz in -1..=1 {
                let base = (hx + dx, hy + dy, hz + dz);
                if has_free_space(terrain, dimension, base) {
                    return Some(WorldPos::new(
                        dimension.clone(),
                        f64::from(base.0) + 0.5,
                        f64::from(base.1) + 1.0,
                        f64::from(base.2) + 0.5,
                    ));
                }
            }
        }
    }
    None
}

fn has_free_space<T: Terrain + ?Sized>(
    terrain: &T,
    dimension: &DimensionId,
    (x, y, z): (i32, i32, i32),
) -> bool {
    (0..2).all(|ox| {
        (0..2).all(|oy| (0..2).all(|oz| !terrain.is_solid(dimension, (x + ox, y + oy, z + oz))))
    })
}
