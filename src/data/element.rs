//! Elements: a cell type plus an ordered vertex list.

use serde::{Deserialize, Serialize};

use crate::topology::cell_type::CellType;
use crate::topology::point::NodeId;

/// A mesh element.
///
/// The vertex order defines orientation and is never renormalized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    pub cell_type: CellType,
    pub vertices: Vec<NodeId>,
}

impl Element {
    pub fn new(cell_type: CellType, vertices: Vec<NodeId>) -> Self {
        Self {
            cell_type,
            vertices,
        }
    }

    /// True when the vertex list length matches the cell type's arity.
    #[inline]
    pub fn has_valid_arity(&self) -> bool {
        self.vertices.len() == self.cell_type.vertex_count()
    }

    /// Returns a copy with every vertex passed through `map`, preserving order.
    ///
    /// Stops at the first vertex `map` cannot resolve and returns it as the error.
    pub fn try_remap<F>(&self, mut map: F) -> Result<Element, NodeId>
    where
        F: FnMut(NodeId) -> Option<NodeId>,
    {
        let vertices = self
            .vertices
            .iter()
            .map(|&v| map(v).ok_or(v))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Element {
            cell_type: self.cell_type,
            vertices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nid(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    #[test]
    fn remap_preserves_order() {
        let e = Element::new(CellType::Triangle, vec![nid(3), nid(1), nid(2)]);
        let out = e.try_remap(|v| NodeId::new(v.get() * 10).ok()).unwrap();
        assert_eq!(out.vertices, vec![nid(30), nid(10), nid(20)]);
        assert_eq!(out.cell_type, CellType::Triangle);
    }

    #[test]
    fn remap_reports_first_unresolved_vertex() {
        let e = Element::new(CellType::Segment, vec![nid(1), nid(2)]);
        let err = e
            .try_remap(|v| if v.get() == 1 { Some(v) } else { None })
            .unwrap_err();
        assert_eq!(err, nid(2));
    }

    #[test]
    fn arity_check() {
        assert!(Element::new(CellType::Segment, vec![nid(1), nid(2)]).has_valid_arity());
        assert!(!Element::new(CellType::Tetrahedron, vec![nid(1), nid(2)]).has_valid_arity());
    }
}
