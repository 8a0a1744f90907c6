//! One grain's mesh as read in isolation.
//!
//! Node and element ids are local to the fragment. Tables are ordered by id
//! so iteration order (and therefore global id allocation during assembly)
//! is deterministic.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use serde::{Deserialize, Serialize};

use crate::data::element::Element;
use crate::geometry::{self, Coord};
use crate::mesh_error::GrainMeshError;
use crate::topology::point::{ElementId, GrainId, NodeId};

/// Self-contained node and element tables for one grain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshFragment {
    nodes: BTreeMap<NodeId, Coord>,
    elements: BTreeMap<ElementId, Element>,
}

impl MeshFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node, rejecting a repeated id.
    pub fn insert_node(&mut self, id: NodeId, coord: Coord) -> Result<(), GrainMeshError> {
        match self.nodes.entry(id) {
            Entry::Occupied(_) => Err(GrainMeshError::DuplicateNode(id)),
            Entry::Vacant(slot) => {
                slot.insert(coord);
                Ok(())
            }
        }
    }

    /// Adds an element, rejecting a repeated id.
    pub fn insert_element(&mut self, id: ElementId, element: Element) -> Result<(), GrainMeshError> {
        match self.elements.entry(id) {
            Entry::Occupied(_) => Err(GrainMeshError::DuplicateElement(id)),
            Entry::Vacant(slot) => {
                slot.insert(element);
                Ok(())
            }
        }
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

    /// Checks that the fragment is internally consistent: finite
    /// coordinates, element arity matching the cell type, and every vertex
    /// resolving to a node of this fragment.
    ///
    /// `grain` is only used to annotate errors.
    pub fn validate(&self, grain: GrainId) -> Result<(), GrainMeshError> {
        for (&node, coord) in &self.nodes {
            if !geometry::is_finite(coord) {
                return Err(GrainMeshError::NonFiniteCoordinate { grain, node });
            }
        }
        for (&element, elem) in &self.elements {
            if !elem.has_valid_arity() {
                return Err(GrainMeshError::VertexCountMismatch {
                    grain,
                    element,
                    cell_type: elem.cell_type,
                    expected: elem.cell_type.vertex_count(),
                    found: elem.vertices.len(),
                });
            }
            if let Some(&node) = elem.vertices.iter().find(|v| !self.nodes.contains_key(*v)) {
                return Err(GrainMeshError::MalformedFragment {
                    grain,
                    element,
                    node,
                });
            }
        }
        Ok(())
    }
}
