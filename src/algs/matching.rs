//! Coincident-node matching.
//!
//! A [`NodeLocator`] answers "which existing global node, if any, lies
//! within tolerance of this coordinate?". Lookups are read-only; the
//! assembler inserts new nodes only after a whole fragment has been matched,
//! so every query of one merge step sees the same frozen node set.
//!
//! Tie-break: when several nodes are within tolerance the one with the
//! smallest id is returned, independent of locator or insertion order.

use crate::algs::config::LocatorKind;
use crate::geometry::{Coord, SpatialGrid, coincident};
use crate::mesh_error::GrainMeshError;
use crate::topology::point::NodeId;

/// Result of matching one incoming coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeMatch {
    /// No existing node within tolerance.
    New,
    /// `node` is the smallest-id node within tolerance; `candidates` counts
    /// every node that was within tolerance (1 for an unambiguous match).
    Coincident { node: NodeId, candidates: usize },
}

impl NodeMatch {
    #[inline]
    pub fn node(self) -> Option<NodeId> {
        match self {
            NodeMatch::New => None,
            NodeMatch::Coincident { node, .. } => Some(node),
        }
    }

    #[inline]
    pub fn is_ambiguous(self) -> bool {
        matches!(self, NodeMatch::Coincident { candidates, .. } if candidates > 1)
    }
}

/// Proximity query over a growing set of global nodes.
pub trait NodeLocator: Send + Sync {
    /// Coincidence tolerance this locator was built for.
    fn tolerance(&self) -> f64;

    /// Match `coord` against every node inserted so far.
    fn locate(&self, coord: &Coord) -> NodeMatch;

    /// Register a node that was appended to the global mesh.
    fn insert(&mut self, id: NodeId, coord: Coord);

    /// Number of registered nodes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Baseline locator: compares against every registered node.
#[derive(Clone, Debug)]
pub struct LinearScan {
    tolerance: f64,
    points: Vec<(NodeId, Coord)>,
}

impl LinearScan {
    pub fn new(tolerance: f64) -> Result<Self, GrainMeshError> {
        check_tolerance(tolerance)?;
        Ok(Self {
            tolerance,
            points: Vec::new(),
        })
    }
}

impl NodeLocator for LinearScan {
    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn locate(&self, coord: &Coord) -> NodeMatch {
        let mut best: Option<NodeId> = None;
        let mut candidates = 0usize;
        for (id, other) in &self.points {
            if coincident(coord, other, self.tolerance) {
                candidates += 1;
                if best.is_none_or(|b| *id < b) {
                    best = Some(*id);
                }
            }
        }
        match best {
            Some(node) => NodeMatch::Coincident { node, candidates },
            None => NodeMatch::New,
        }
    }

    fn insert(&mut self, id: NodeId, coord: Coord) {
        self.points.push((id, coord));
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

/// Hash-grid locator with cell edge equal to the tolerance; each query
/// inspects a 3x3x3 block of cells.
#[derive(Clone, Debug)]
pub struct GridLocator {
    tolerance: f64,
    grid: SpatialGrid,
}

impl GridLocator {
    pub fn new(tolerance: f64) -> Result<Self, GrainMeshError> {
        check_tolerance(tolerance)?;
        Ok(Self {
            tolerance,
            grid: SpatialGrid::new(tolerance)?,
        })
    }
}

impl NodeLocator for GridLocator {
    fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn locate(&self, coord: &Coord) -> NodeMatch {
        match self.grid.nearest_id_within(coord, self.tolerance) {
            Some((node, candidates)) => NodeMatch::Coincident { node, candidates },
            None => NodeMatch::New,
        }
    }

    fn insert(&mut self, id: NodeId, coord: Coord) {
        self.grid.insert(id, coord);
    }

    fn len(&self) -> usize {
        self.grid.len()
    }
}

impl LocatorKind {
    /// Builds an empty locator of this kind.
    pub fn build(self, tolerance: f64) -> Result<Box<dyn NodeLocator>, GrainMeshError> {
        Ok(match self {
            LocatorKind::Grid => Box::new(GridLocator::new(tolerance)?),
            LocatorKind::LinearScan => Box::new(LinearScan::new(tolerance)?),
        })
    }
}

fn check_tolerance(tolerance: f64) -> Result<(), GrainMeshError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(GrainMeshError::InvalidTolerance(tolerance))
    }
}

/// Matches every coordinate of `coords` against `locator`, preserving order.
pub fn match_all(locator: &dyn NodeLocator, coords: &[Coord]) -> Vec<NodeMatch> {
    coords.iter().map(|c| locator.locate(c)).collect()
}

/// Parallel form of [`match_all`]; results are in input order.
#[cfg(feature = "rayon")]
pub fn par_match_all(locator: &dyn NodeLocator, coords: &[Coord]) -> Vec<NodeMatch> {
    use rayon::prelude::*;
    coords.par_iter().map(|c| locator.locate(c)).collect()
}
