//! Geometry utilities for grain-mesh.
//!
//! Coordinates are always stored as 3D `(x, y, z)` triples; 2D meshes carry
//! `z = 0`.

pub mod spatial_grid;

pub use spatial_grid::SpatialGrid;

/// A node coordinate in the fragment's length units.
pub type Coord = [f64; 3];

/// Euclidean distance between two coordinates.
#[inline]
pub fn distance(a: &Coord, b: &Coord) -> f64 {
    distance_squared(a, b).sqrt()
}

/// Squared Euclidean distance between two coordinates.
#[inline]
pub fn distance_squared(a: &Coord, b: &Coord) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Two coordinates coincide iff their distance is strictly below `tolerance`.
#[inline]
pub fn coincident(a: &Coord, b: &Coord, tolerance: f64) -> bool {
    distance(a, b) < tolerance
}

/// True when every component is finite.
#[inline]
pub fn is_finite(c: &Coord) -> bool {
    c.iter().all(|v| v.is_finite())
}
