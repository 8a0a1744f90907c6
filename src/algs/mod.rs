//! Mesh assembly algorithms: coincident-node matching, node id remapping,
//! element migration, and the grain-by-grain driver tying them together.

pub mod assembler;
pub mod config;
pub mod matching;
pub mod migrate;
pub mod remap;

pub use assembler::{MergeReport, MeshAssembler, assemble};
pub use config::{AmbiguityHandling, AssemblyConfig, LocatorKind};
pub use matching::{GridLocator, LinearScan, NodeLocator, NodeMatch};
