//! The assembled polycrystal mesh.
//!
//! `GlobalMesh` is two flat, append-only tables keyed by global id plus a
//! provenance list recording which ids each grain contributed. Elements
//! hold plain [`NodeId`] values, never references into the node table.
//!
//! Mutation is crate-private: only the assembler appends, and it only ever
//! appends above the current maxima.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::element::Element;
use crate::geometry::{Coord, SpatialGrid};
use crate::invariants::MeshInvariants;
use crate::mesh_error::GrainMeshError;
use crate::topology::point::{ElementId, GrainId, NodeId};

/// What one grain contributed to the global mesh.
///
/// Ids allocated during a merge step are contiguous, so a start id and a
/// count describe them completely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrainRecord {
    pub grain: GrainId,
    /// First node id allocated for this grain, if any node was new.
    pub first_node: Option<NodeId>,
    pub nodes_added: u64,
    /// First element id allocated for this grain, if it had elements.
    pub first_element: Option<ElementId>,
    pub elements_added: u64,
}

impl GrainRecord {
    /// True when `element` was allocated while merging this grain.
    pub fn contains_element(&self, element: ElementId) -> bool {
        match self.first_element {
            Some(first) => {
                element.get() >= first.get() && element.get() - first.get() < self.elements_added
            }
            None => false,
        }
    }

    /// Element ids contributed by this grain, in increasing order.
    pub fn element_ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        let start = self.first_element.map_or(0, ElementId::get);
        (0..self.elements_added).filter_map(move |k| ElementId::new(start + k).ok())
    }

    /// Node ids newly allocated for this grain, in increasing order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let start = self.first_node.map_or(0, NodeId::get);
        (0..self.nodes_added).filter_map(move |k| NodeId::new(start + k).ok())
    }
}

/// Node table, element table and per-grain provenance in one global id space.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalMesh {
    nodes: BTreeMap<NodeId, Coord>,
    elements: BTreeMap<ElementId, Element>,
    grains: Vec<GrainRecord>,
}

impl GlobalMesh {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Coord> {
        self.nodes.get(&id)
    }

    #[inline]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    /// Nodes in increasing id order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = (NodeId, &Coord)> + '_ {
        self.nodes.iter().map(|(&id, c)| (id, c))
    }

    /// Elements in increasing id order.
    pub fn elements(&self) -> impl ExactSizeIterator<Item = (ElementId, &Element)> + '_ {
        self.elements.iter().map(|(&id, e)| (id, e))
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.elements.is_empty()
    }

    /// Largest node id in use, 0 for an empty table.
    pub fn max_node_id(&self) -> u64 {
        self.nodes.last_key_value().map_or(0, |(id, _)| id.get())
    }

    /// Largest element id in use, 0 for an empty table.
    pub fn max_element_id(&self) -> u64 {
        self.elements.last_key_value().map_or(0, |(id, _)| id.get())
    }

    /// Provenance records in merge order.
    pub fn grains(&self) -> &[GrainRecord] {
        &self.grains
    }

    /// Last grain merged into this mesh.
    pub fn last_grain(&self) -> Option<GrainId> {
        self.grains.last().map(|r| r.grain)
    }

    /// The grain that contributed `element`.
    pub fn grain_of_element(&self, element: ElementId) -> Option<GrainId> {
        self.grains
            .iter()
            .find(|r| r.contains_element(element))
            .map(|r| r.grain)
    }

    /// Element ids contributed by `grain`; empty if the grain was never merged.
    pub fn elements_of_grain(&self, grain: GrainId) -> Vec<ElementId> {
        self.grains
            .iter()
            .filter(|r| r.grain == grain)
            .flat_map(|r| r.element_ids())
            .collect()
    }

    /// Incident elements for every referenced node, in increasing element id order.
    pub fn node_to_elements(&self) -> BTreeMap<NodeId, Vec<ElementId>> {
        let mut out: BTreeMap<NodeId, Vec<ElementId>> = BTreeMap::new();
        for (&eid, elem) in &self.elements {
            for &v in &elem.vertices {
                let incident = out.entry(v).or_default();
                if incident.last() != Some(&eid) {
                    incident.push(eid);
                }
            }
        }
        out
    }

    /// All node pairs `(a, b)` with `a < b` lying strictly within
    /// `tolerance` of each other, sorted.
    ///
    /// An audit helper: nodes merged by matching never show up here, but two
    /// nodes first introduced by the same grain may.
    pub fn find_coincident_pairs(
        &self,
        tolerance: f64,
    ) -> Result<Vec<(NodeId, NodeId)>, GrainMeshError> {
        let mut grid = SpatialGrid::new(tolerance)?;
        let mut pairs = Vec::new();
        for (&id, coord) in &self.nodes {
            for earlier in grid.within(coord, tolerance) {
                pairs.push((earlier, id));
            }
            grid.insert(id, *coord);
        }
        pairs.sort_unstable();
        Ok(pairs)
    }

    pub(crate) fn push_node(&mut self, id: NodeId, coord: Coord) {
        debug_assert!(id.get() > self.max_node_id(), "node ids must grow");
        self.nodes.insert(id, coord);
    }

    pub(crate) fn push_element(&mut self, id: ElementId, element: Element) {
        debug_assert!(id.get() > self.max_element_id(), "element ids must grow");
        self.elements.insert(id, element);
    }

    pub(crate) fn push_grain(&mut self, record: GrainRecord) {
        self.grains.push(record);
    }
}

impl MeshInvariants for GlobalMesh {
    /// Checks referential integrity of every element and that the
    /// provenance records partition both tables: each record claims the
    /// next contiguous run of ids, and together the runs cover exactly
    /// `1..=max` of the node and element tables.
    fn validate_invariants(&self) -> Result<(), GrainMeshError> {
        for (eid, elem) in &self.elements {
            if let Some(v) = elem.vertices.iter().find(|v| !self.nodes.contains_key(*v)) {
                return Err(GrainMeshError::InvariantViolation(format!(
                    "element {eid} references missing node {v}"
                )));
            }
        }

        let mut prev_grain: Option<GrainId> = None;
        let mut node_floor = 0u64;
        let mut element_floor = 0u64;
        for record in &self.grains {
            if prev_grain.is_some_and(|p| p >= record.grain) {
                return Err(GrainMeshError::InvariantViolation(format!(
                    "grain {} recorded out of order",
                    record.grain
                )));
            }
            prev_grain = Some(record.grain);

            node_floor = claim_run(
                record.first_node.map(NodeId::get),
                record.nodes_added,
                node_floor,
            )
            .ok_or_else(|| {
                GrainMeshError::InvariantViolation(format!(
                    "grain {} node run {:?}+{} does not follow node {node_floor}",
                    record.grain, record.first_node, record.nodes_added
                ))
            })?;
            element_floor = claim_run(
                record.first_element.map(ElementId::get),
                record.elements_added,
                element_floor,
            )
            .ok_or_else(|| {
                GrainMeshError::InvariantViolation(format!(
                    "grain {} element run {:?}+{} does not follow element {element_floor}",
                    record.grain, record.first_element, record.elements_added
                ))
            })?;
        }

        // Keys are unique and nonzero, so `len == max == floor` means the
        // table is exactly `1..=floor`.
        if self.nodes.len() as u64 != node_floor || self.max_node_id() != node_floor {
            return Err(GrainMeshError::InvariantViolation(format!(
                "node table ({} ids, max {}) is not the recorded range 1..={node_floor}",
                self.nodes.len(),
                self.max_node_id()
            )));
        }
        if self.elements.len() as u64 != element_floor || self.max_element_id() != element_floor {
            return Err(GrainMeshError::InvariantViolation(format!(
                "element table ({} ids, max {}) is not the recorded range 1..={element_floor}",
                self.elements.len(),
                self.max_element_id()
            )));
        }
        Ok(())
    }
}

/// Validates one provenance run against the running floor and returns the
/// new floor. A run must start at `floor + 1`; an empty run has no start.
fn claim_run(first: Option<u64>, count: u64, floor: u64) -> Option<u64> {
    match (first, count) {
        (None, 0) => Some(floor),
        (Some(start), n) if n > 0 && floor.checked_add(1) == Some(start) => floor.checked_add(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::CellType;

    fn nid(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn eid(raw: u64) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    /// Two grains sharing node 2: grain 1 owns element 1, grain 3 owns 2..=3.
    fn two_grain_mesh() -> GlobalMesh {
        let mut m = GlobalMesh::new();
        m.push_node(nid(1), [0.0, 0.0, 0.0]);
        m.push_node(nid(2), [1.0, 0.0, 0.0]);
        m.push_element(eid(1), Element::new(CellType::Segment, vec![nid(1), nid(2)]));
        m.push_grain(GrainRecord {
            grain: GrainId(1),
            first_node: Some(nid(1)),
            nodes_added: 2,
            first_element: Some(eid(1)),
            elements_added: 1,
        });
        m.push_node(nid(3), [2.0, 0.0, 0.0]);
        m.push_element(eid(2), Element::new(CellType::Segment, vec![nid(2), nid(3)]));
        m.push_element(eid(3), Element::new(CellType::Vertex, vec![nid(3)]));
        m.push_grain(GrainRecord {
            grain: GrainId(3),
            first_node: Some(nid(3)),
            nodes_added: 1,
            first_element: Some(eid(2)),
            elements_added: 2,
        });
        m
    }

    #[test]
    fn maxima_of_empty_mesh_are_zero() {
        let m = GlobalMesh::new();
        assert_eq!(m.max_node_id(), 0);
        assert_eq!(m.max_element_id(), 0);
        assert!(m.is_empty());
        assert!(m.validate_invariants().is_ok());
    }

    #[test]
    fn provenance_lookup() {
        let m = two_grain_mesh();
        assert_eq!(m.grain_of_element(eid(1)), Some(GrainId(1)));
        assert_eq!(m.grain_of_element(eid(2)), Some(GrainId(3)));
        assert_eq!(m.grain_of_element(eid(3)), Some(GrainId(3)));
        assert_eq!(m.grain_of_element(eid(4)), None);
        assert_eq!(m.elements_of_grain(GrainId(3)), vec![eid(2), eid(3)]);
        assert!(m.elements_of_grain(GrainId(2)).is_empty());
        assert_eq!(m.last_grain(), Some(GrainId(3)));
    }

    #[test]
    fn node_to_elements_lists_shared_nodes() {
        let m = two_grain_mesh();
        let n2e = m.node_to_elements();
        assert_eq!(n2e[&nid(2)], vec![eid(1), eid(2)]);
        assert_eq!(n2e[&nid(3)], vec![eid(2), eid(3)]);
    }

    #[test]
    fn invariants_hold_for_consistent_mesh() {
        assert!(two_grain_mesh().validate_invariants().is_ok());
    }

    #[test]
    fn dangling_vertex_violates_invariants() {
        let mut m = two_grain_mesh();
        m.push_element(eid(4), Element::new(CellType::Vertex, vec![nid(42)]));
        assert!(matches!(
            m.validate_invariants(),
            Err(GrainMeshError::InvariantViolation(_))
        ));
    }

    #[test]
    fn unrecorded_ids_violate_invariants() {
        let mut m = two_grain_mesh();
        m.push_node(nid(7), [5.0, 0.0, 0.0]);
        assert!(matches!(
            m.validate_invariants(),
            Err(GrainMeshError::InvariantViolation(_))
        ));

        let mut m = two_grain_mesh();
        m.push_element(eid(9), Element::new(CellType::Vertex, vec![nid(1)]));
        assert_eq!(m.grain_of_element(eid(9)), None);
        assert!(matches!(
            m.validate_invariants(),
            Err(GrainMeshError::InvariantViolation(_))
        ));
    }

    #[test]
    fn record_runs_must_be_contiguous_and_well_formed() {
        let mut gap = two_grain_mesh();
        gap.grains[1].first_element = Some(eid(3));
        assert!(gap.validate_invariants().is_err());

        let mut missing_start = two_grain_mesh();
        missing_start.grains[1].first_node = None;
        assert!(missing_start.validate_invariants().is_err());

        let mut empty_with_start = GlobalMesh::new();
        empty_with_start.push_grain(GrainRecord {
            grain: GrainId(1),
            first_node: Some(nid(1)),
            nodes_added: 0,
            first_element: None,
            elements_added: 0,
        });
        assert!(empty_with_start.validate_invariants().is_err());
    }

    #[test]
    fn snapshot_with_gaps_is_rejected() {
        let json = r#"{
            "nodes": {"1": [0.0, 0.0, 0.0], "2": [1.0, 0.0, 0.0], "7": [2.0, 0.0, 0.0]},
            "elements": {
                "1": {"cell_type": "Segment", "vertices": [1, 2]},
                "9": {"cell_type": "Segment", "vertices": [2, 7]}
            },
            "grains": [{"grain": 1, "first_node": 1, "nodes_added": 2,
                        "first_element": 1, "elements_added": 1}]
        }"#;
        let m: GlobalMesh = serde_json::from_str(json).unwrap();
        assert!(matches!(
            m.validate_invariants(),
            Err(GrainMeshError::InvariantViolation(_))
        ));
    }

    #[test]
    fn coincident_pairs_audit() {
        let mut m = two_grain_mesh();
        m.push_node(nid(4), [2.0, 0.0, 1e-9]);
        let pairs = m.find_coincident_pairs(1e-6).unwrap();
        assert_eq!(pairs, vec![(nid(3), nid(4))]);
        assert!(m.find_coincident_pairs(0.0).is_err());
    }
}
