//! Uniform hash grid over 3D points.
//!
//! Points are bucketed by `floor(coord / cell_size)` on each axis. A
//! radius query visits every bucket overlapping the axis-aligned box
//! `[c - r, c + r]`, so with `cell_size` equal to the query radius it
//! touches at most 3x3x3 buckets. When the box spans more cells than there
//! are occupied buckets, the occupied buckets are scanned instead, so large
//! radii cost at most one pass over the grid. Buckets are append-only; the grid grows
//! with the point set and is never rebuilt.

use hashbrown::HashMap;
use itertools::iproduct;

use super::{Coord, coincident};
use crate::mesh_error::GrainMeshError;
use crate::topology::point::NodeId;

type CellKey = (i64, i64, i64);

/// Hash grid mapping bucket keys to the `(id, coordinate)` pairs they hold.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    buckets: HashMap<CellKey, Vec<(NodeId, Coord)>>,
    len: usize,
}

impl SpatialGrid {
    /// Creates an empty grid. `cell_size` must be finite and positive.
    pub fn new(cell_size: f64) -> Result<Self, GrainMeshError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(GrainMeshError::InvalidTolerance(cell_size));
        }
        Ok(Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
        })
    }

    /// Number of points stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    fn axis_key(&self, v: f64) -> i64 {
        // `as` saturates for out-of-range values and maps NaN to 0.
        (v / self.cell_size).floor() as i64
    }

    #[inline]
    fn key(&self, c: &Coord) -> CellKey {
        (self.axis_key(c[0]), self.axis_key(c[1]), self.axis_key(c[2]))
    }

    /// Adds a point. Ids are not checked for uniqueness.
    pub fn insert(&mut self, id: NodeId, coord: Coord) {
        let key = self.key(&coord);
        self.buckets.entry(key).or_default().push((id, coord));
        self.len += 1;
    }

    /// Every stored point whose distance to `coord` is strictly below
    /// `radius`, sorted by increasing id.
    ///
    /// Visits at most `min((2 * radius / cell_size + 1)^3, bucket_count())`
    /// buckets.
    pub fn within(&self, coord: &Coord, radius: f64) -> Vec<NodeId> {
        let mut hits: Vec<NodeId> = Vec::new();
        self.for_each_within(coord, radius, |id| hits.push(id));
        hits.sort_unstable();
        hits
    }

    /// Smallest id within `radius` of `coord`, together with the total
    /// number of points found within `radius`.
    pub fn nearest_id_within(&self, coord: &Coord, radius: f64) -> Option<(NodeId, usize)> {
        let mut best: Option<NodeId> = None;
        let mut count = 0usize;
        self.for_each_within(coord, radius, |id| {
            count += 1;
            best = Some(match best {
                Some(b) if b <= id => b,
                _ => id,
            });
        });
        best.map(|b| (b, count))
    }

    fn for_each_within(&self, coord: &Coord, radius: f64, mut visit: impl FnMut(NodeId)) {
        if self.buckets.is_empty() || !(radius > 0.0) {
            return;
        }
        let lo = self.key(&[coord[0] - radius, coord[1] - radius, coord[2] - radius]);
        let hi = self.key(&[coord[0] + radius, coord[1] + radius, coord[2] + radius]);
        let mut scan = |bucket: &[(NodeId, Coord)]| {
            for (id, other) in bucket {
                if coincident(coord, other, radius) {
                    visit(*id);
                }
            }
        };
        if box_cells(lo, hi) > self.buckets.len() as u128 {
            let inside = |k: &CellKey| {
                (lo.0..=hi.0).contains(&k.0)
                    && (lo.1..=hi.1).contains(&k.1)
                    && (lo.2..=hi.2).contains(&k.2)
            };
            for (_, bucket) in self.buckets.iter().filter(|&(k, _)| inside(k)) {
                scan(bucket);
            }
            return;
        }
        for key in iproduct!(lo.0..=hi.0, lo.1..=hi.1, lo.2..=hi.2) {
            if let Some(bucket) = self.buckets.get(&key) {
                scan(bucket);
            }
        }
    }
}

/// Number of cells in the inclusive key box `lo..=hi`, saturating.
fn box_cells(lo: CellKey, hi: CellKey) -> u128 {
    let span = |a: i64, b: i64| (i128::from(b) - i128::from(a) + 1).max(0) as u128;
    span(lo.0, hi.0)
        .saturating_mul(span(lo.1, hi.1))
        .saturating_mul(span(lo.2, hi.2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nid(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn rejects_bad_cell_size() {
        assert!(SpatialGrid::new(0.0).is_err());
        assert!(SpatialGrid::new(-1.0).is_err());
        assert!(SpatialGrid::new(f64::NAN).is_err());
    }

    #[test]
    fn finds_neighbours_across_bucket_edges() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(nid(1), [0.999, 0.0, 0.0]);
        grid.insert(nid(2), [5.0, 5.0, 5.0]);
        assert_eq!(grid.within(&[1.001, 0.0, 0.0], 0.01), vec![nid(1)]);
        assert!(grid.within(&[2.0, 0.0, 0.0], 0.01).is_empty());
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.bucket_count(), 2);
    }

    #[test]
    fn negative_coordinates_bucket_correctly() {
        let mut grid = SpatialGrid::new(1e-6).unwrap();
        grid.insert(nid(4), [-1e-7, -1e-7, 0.0]);
        assert_eq!(grid.within(&[1e-7, 1e-7, 0.0], 1e-6), vec![nid(4)]);
    }

    #[test]
    fn nearest_id_prefers_smallest_id() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(nid(9), [0.1, 0.0, 0.0]);
        grid.insert(nid(3), [0.0, 0.2, 0.0]);
        grid.insert(nid(5), [0.0, 0.0, 0.3]);
        assert_eq!(grid.nearest_id_within(&[0.0, 0.0, 0.0], 1.0), Some((nid(3), 3)));
        assert_eq!(grid.nearest_id_within(&[10.0, 0.0, 0.0], 1.0), None);
    }

    #[test]
    fn huge_radius_scans_occupied_buckets() {
        let mut grid = SpatialGrid::new(1e-6).unwrap();
        grid.insert(nid(2), [0.5, 0.0, 0.0]);
        grid.insert(nid(1), [0.0, 0.0, -0.5]);
        grid.insert(nid(3), [5.0, 0.0, 0.0]);
        assert_eq!(grid.within(&[0.0, 0.0, 0.0], 1.0), vec![nid(1), nid(2)]);
        assert_eq!(
            grid.nearest_id_within(&[0.0, 0.0, 0.0], f64::MAX),
            Some((nid(1), 3))
        );
    }

    #[test]
    fn distance_exactly_radius_is_excluded() {
        let mut grid = SpatialGrid::new(1.0).unwrap();
        grid.insert(nid(1), [1.0, 0.0, 0.0]);
        assert!(grid.within(&[0.0, 0.0, 0.0], 1.0).is_empty());
    }
}
