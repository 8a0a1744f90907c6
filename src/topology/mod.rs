//! Identifiers and cell shapes shared by fragments and the global mesh.

pub mod cell_type;
pub mod point;

pub use cell_type::CellType;
pub use point::{ElementId, GrainId, NodeId};
