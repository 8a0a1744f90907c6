//! Cell type metadata for mesh elements.

use serde::{Deserialize, Serialize};

/// Fixed-arity cell shapes an element may take.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Segment,
    /// 2D simplex (triangle).
    Triangle,
    /// 2D tensor-product cell (quad).
    Quadrilateral,
    /// 3D simplex (tet).
    Tetrahedron,
    /// 3D tensor-product cell (hex).
    Hexahedron,
    /// 3D wedge/prism.
    Prism,
    /// 3D pyramid.
    Pyramid,
}

impl CellType {
    /// Returns the topological dimension of the cell.
    pub fn dimension(self) -> u8 {
        match self {
            CellType::Vertex => 0,
            CellType::Segment => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Prism | CellType::Pyramid => 3,
        }
    }

    /// Number of vertices an element of this type references.
    pub fn vertex_count(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Segment => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral | CellType::Tetrahedron => 4,
            CellType::Pyramid => 5,
            CellType::Prism => 6,
            CellType::Hexahedron => 8,
        }
    }

    /// Maps a first-order Gmsh element type code to a cell type.
    pub fn from_gmsh(code: u32) -> Option<Self> {
        match code {
            1 => Some(CellType::Segment),
            2 => Some(CellType::Triangle),
            3 => Some(CellType::Quadrilateral),
            4 => Some(CellType::Tetrahedron),
            5 => Some(CellType::Hexahedron),
            6 => Some(CellType::Prism),
            7 => Some(CellType::Pyramid),
            15 => Some(CellType::Vertex),
            _ => None,
        }
    }

    /// Gmsh element type code for this cell type.
    pub fn gmsh_code(self) -> u32 {
        match self {
            CellType::Segment => 1,
            CellType::Triangle => 2,
            CellType::Quadrilateral => 3,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 5,
            CellType::Prism => 6,
            CellType::Pyramid => 7,
            CellType::Vertex => 15,
        }
    }
}
