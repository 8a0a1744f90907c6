//! Data module: fragments, elements and the assembled global mesh

pub mod element;
pub mod fragment;
pub mod global_mesh;

pub use element::Element;
pub use fragment::MeshFragment;
pub use global_mesh::{GlobalMesh, GrainRecord};
