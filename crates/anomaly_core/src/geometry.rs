//! World coordinates and region partitioning
//!
//! A `WorldPos` is a point in one dimension of the world. Distances between
//! points in different dimensions are undefined (`None`), so every separation
//! check in the crate naturally refuses to pair across dimensions.
//!
//! Regions are 16×16 columns addressed by `(x >> 4, z >> 4)`; they are the unit
//! the host loads and unloads.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension every legacy record without a dimension tag belongs to.
pub const DEFAULT_DIMENSION: &str = "minecraft:overworld";

/// Horizontal size of a region is `1 << REGION_SHIFT` blocks.
pub const REGION_SHIFT: i32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DimensionId(pub String);

impl DimensionId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn overworld() -> Self {
        Self(DEFAULT_DIMENSION.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DimensionId {
    fn default() -> Self {
        Self::overworld()
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position in a specific dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub dimension: DimensionId,
    pub pos: Vector3<f64>,
}

impl WorldPos {
    pub fn new(dimension: DimensionId, x: f64, y: f64, z: f64) -> Self {
        Self { dimension, pos: Vector3::new(x, y, z) }
    }

    /// Shorthand for a point in the default dimension.
    pub fn overworld(x: f64, y: f64, z: f64) -> Self {
        Self::new(DimensionId::overworld(), x, y, z)
    }

    pub fn x(&self) -> f64 {
        self.pos.x
    }

    pub fn y(&self) -> f64 {
        self.pos.y
    }

    pub fn z(&self) -> f64 {
        self.pos.z
    }

    /// Euclidean distance, `None` across dimensions.
    pub fn distance_to(&self, other: &WorldPos) -> Option<f64> {
        if self.dimension != other.dimension {
            return None;
        }
        Some((self.pos - other.pos).norm())
    }

    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> WorldPos {
        WorldPos { dimension: self.dimension.clone(), pos: self.pos + Vector3::new(dx, dy, dz) }
    }

    /// Integer block containing this point.
    pub fn block(&self) -> (i32, i32, i32) {
        (self.pos.x.floor() as i32, self.pos.y.floor() as i32, self.pos.z.floor() as i32)
    }

    pub fn region(&self) -> RegionPos {
        RegionPos::containing(self)
    }

    /// True if `self` lies inside the axis-aligned box centered on `center`.
    pub fn within_box(&self, center: &WorldPos, half_extents: [f64; 3]) -> bool {
        if self.dimension != center.dimension {
            return false;
        }
        let d = self.pos - center.pos;
        d.x.abs() <= half_extents[0] && d.y.abs() <= half_extents[1] && d.z.abs() <= half_extents[2]
    }
}

impl fmt::Display for WorldPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({:.1}, {:.1}, {:.1})", self.dimension, self.pos.x, self.pos.y, self.pos.z)
    }
}

/// Address of a loadable region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionPos {
    pub dimension: DimensionId,
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(dimension: DimensionId, x: i32, z: i32) -> Self {
        Self { dimension, x, z }
    }

    pub fn containing(pos: &WorldPos) -> Self {
        let (bx, _, bz) = pos.block();
        Self { dimension: pos.dimension.clone(), x: bx >> REGION_SHIFT, z: bz >> REGION_SHIFT }
    }
}

impl fmt::Display for RegionPos {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[{}, {}]", self.dimension, self.x, self.z)
    }
}
