//! GrainMeshError: Unified error type for grain-mesh public APIs
//!
//! Every fallible operation in the crate (fragment construction, Gmsh
//! ingestion, assembly) reports through this enum so callers can match on a
//! single type.

use crate::topology::cell_type::CellType;
use crate::topology::point::{ElementId, GrainId, NodeId};
use thiserror::Error;

/// Unified error type for grain-mesh operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrainMeshError {
    /// Attempted to construct an identifier with a zero value (invalid).
    #[error("identifier must be non-zero (0 is reserved as invalid/sentinel)")]
    InvalidId,
    /// An element of a grain fragment references a node the fragment does not define.
    #[error("malformed fragment: grain {grain} element {element} references missing node {node}")]
    MalformedFragment {
        grain: GrainId,
        element: ElementId,
        node: NodeId,
    },
    /// An element's vertex list does not match the arity of its cell type.
    #[error(
        "grain {grain} element {element}: {cell_type:?} expects {expected} vertices, found {found}"
    )]
    VertexCountMismatch {
        grain: GrainId,
        element: ElementId,
        cell_type: CellType,
        expected: usize,
        found: usize,
    },
    /// A fragment node has a NaN or infinite coordinate.
    #[error("grain {grain} node {node} has a non-finite coordinate")]
    NonFiniteCoordinate { grain: GrainId, node: NodeId },
    /// More than one global node lies within tolerance of an incoming node.
    #[error("grain {grain} node {node} is within tolerance of {candidates} existing nodes")]
    AmbiguousMatch {
        grain: GrainId,
        node: NodeId,
        candidates: usize,
    },
    /// Coincidence tolerance must be finite and strictly positive.
    #[error("invalid coincidence tolerance {0}: must be finite and > 0")]
    InvalidTolerance(f64),
    /// Grains must be merged in strictly increasing id order.
    #[error("grain {grain} merged after grain {previous}; grains must arrive in increasing order")]
    GrainOutOfOrder { previous: GrainId, grain: GrainId },
    /// A node id was inserted twice into the same fragment.
    #[error("duplicate node id {0} in fragment")]
    DuplicateNode(NodeId),
    /// An element id was inserted twice into the same fragment.
    #[error("duplicate element id {0} in fragment")]
    DuplicateElement(ElementId),
    /// Parsing error while reading a mesh fragment.
    #[error("mesh I/O parse error: {0}")]
    MeshIoParse(String),
    /// Underlying I/O failure, stringified to keep the error `Clone`.
    #[error("I/O error: {0}")]
    Io(String),
    /// The file for a grain in a sequence could not be found.
    #[error("no mesh file for grain {grain} at `{path}`")]
    MissingGrainFile { grain: GrainId, path: String },
    /// A structural invariant of the assembled mesh was violated.
    #[error("mesh invariant violated: {0}")]
    InvariantViolation(String),
}

impl GrainMeshError {
    /// Re-labels grain-scoped fragment errors with `grain`; other variants
    /// pass through unchanged.
    pub fn with_grain(self, grain: GrainId) -> Self {
        match self {
            GrainMeshError::MalformedFragment { element, node, .. } => {
                GrainMeshError::MalformedFragment {
                    grain,
                    element,
                    node,
                }
            }
            GrainMeshError::VertexCountMismatch {
                element,
                cell_type,
                expected,
                found,
                ..
            } => GrainMeshError::VertexCountMismatch {
                grain,
                element,
                cell_type,
                expected,
                found,
            },
            GrainMeshError::NonFiniteCoordinate { node, .. } => {
                GrainMeshError::NonFiniteCoordinate { grain, node }
            }
            other => other,
        }
    }
}

impl From<std::io::Error> for GrainMeshError {
    fn from(err: std::io::Error) -> Self {
        GrainMeshError::Io(err.to_string())
    }
}
