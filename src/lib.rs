#![cfg_attr(docsrs, feature(doc_cfg))]
//! # grain-mesh
//!
//! grain-mesh assembles a single polycrystalline finite-element mesh from a
//! sequence of per-grain mesh fragments, as written by grain meshers such as
//! Neper or Dream3D through Gmsh. Each fragment numbers its nodes and
//! elements independently; neighbouring grains share boundary nodes
//! geometrically but not by id.
//!
//! ## Features
//! - Coincident-node matching under a configurable distance tolerance,
//!   backed by a uniform hash grid (or a linear scan for reference)
//! - Deterministic global renumbering: matched nodes reuse the existing id,
//!   unmatched nodes and all elements get consecutive fresh ids
//! - Per-grain provenance of every global element
//! - ASCII Gmsh v2.2 fragment reader and numbered grain-file sequences
//! - Optional parallel matching phase (`rayon` feature)
//!
//! ## Determinism
//!
//! Fragment tables iterate in id order, ties between several coincident
//! candidates resolve to the smallest global id, and ids are allocated
//! serially even when matching runs in parallel. Assembling the same grain
//! sequence twice yields identical meshes.
//!
//! ## Usage
//!
//! ```rust
//! use grain_mesh::prelude::*;
//!
//! let mut a = MeshFragment::new();
//! for (i, xyz) in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]].into_iter().enumerate() {
//!     a.insert_node(NodeId::new(i as u64 + 1)?, xyz)?;
//! }
//! let tri = Element::new(
//!     CellType::Triangle,
//!     vec![NodeId::new(1)?, NodeId::new(2)?, NodeId::new(3)?],
//! );
//! a.insert_element(ElementId::new(1)?, tri)?;
//!
//! let mut assembler = MeshAssembler::new(AssemblyConfig::default())?;
//! assembler.merge(GrainId(1), a.clone())?;
//! let report = assembler.merge(GrainId(2), a)?;
//! assert_eq!(report.nodes_added, 0);
//! assert_eq!(assembler.mesh().element_count(), 2);
//! # Ok::<(), grain_mesh::mesh_error::GrainMeshError>(())
//! ```

pub mod algs;
pub mod data;
pub mod geometry;
pub mod invariants;
pub mod io;
pub mod mesh_error;
pub mod topology;

pub use invariants::MeshInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::assembler::{MergeReport, MeshAssembler, assemble};
    pub use crate::algs::config::{AmbiguityHandling, AssemblyConfig, LocatorKind};
    pub use crate::algs::matching::{NodeLocator, NodeMatch};
    pub use crate::data::element::Element;
    pub use crate::data::fragment::MeshFragment;
    pub use crate::data::global_mesh::{GlobalMesh, GrainRecord};
    pub use crate::invariants::MeshInvariants;
    pub use crate::io::FragmentReader;
    pub use crate::io::gmsh::GmshFragmentReader;
    pub use crate::mesh_error::GrainMeshError;
    pub use crate::topology::cell_type::CellType;
    pub use crate::topology::point::{ElementId, GrainId, NodeId};
}
