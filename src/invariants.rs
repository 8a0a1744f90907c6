//! Structural self-checks for assembled meshes.
//!
//! Checks always run through [`MeshInvariants::validate_invariants`]; the
//! panicking form is compiled in for debug builds, or for release builds
//! with `strict-invariants` / `check-invariants` enabled.

use crate::mesh_error::GrainMeshError;

/// A type whose structural invariants can be verified on demand.
pub trait MeshInvariants {
    /// Validate invariants and return the first violation encountered.
    fn validate_invariants(&self) -> Result<(), GrainMeshError>;

    /// Panic on the first violation when invariant checking is compiled in;
    /// a no-op otherwise.
    fn debug_assert_invariants(&self) {
        crate::check_invariants!(self.validate_invariants(), "mesh");
    }
}

/// Runs a fallible check and panics with `ctx` on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! check_invariants {
    ($expr:expr, $ctx:literal) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $ctx, ": {}"), e);
        }
    };
}
