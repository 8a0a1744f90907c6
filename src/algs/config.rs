//! Assembly configuration.

use serde::{Deserialize, Serialize};

use crate::mesh_error::GrainMeshError;

/// Default coincidence tolerance, in the fragments' length units.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Which spatial query structure backs coincident-node matching.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Uniform hash grid with cell edge equal to the tolerance.
    #[default]
    Grid,
    /// Scan every global node per query. Quadratic over a whole assembly;
    /// kept as a reference for testing and small meshes.
    LinearScan,
}

/// What to do when several global nodes lie within tolerance of one
/// incoming node. The smallest global id always wins under `Warn` and
/// `Ignore`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum AmbiguityHandling {
    #[default]
    Warn,
    Ignore,
    Error,
}

/// Options controlling a mesh assembly run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyConfig {
    /// Two nodes coincide iff their distance is strictly below this.
    pub tolerance: f64,
    pub locator: LocatorKind,
    pub ambiguity: AmbiguityHandling,
    /// Run the matching phase of each merge on the rayon pool. Ignored
    /// unless the `rayon` feature is enabled.
    pub parallel_matching: bool,
    /// Validate each fragment (arity, finite coordinates, dangling
    /// references) before any matching work is done.
    pub validate_fragments: bool,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            locator: LocatorKind::Grid,
            ambiguity: AmbiguityHandling::Warn,
            parallel_matching: false,
            validate_fragments: true,
        }
    }
}

impl AssemblyConfig {
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_locator(mut self, locator: LocatorKind) -> Self {
        self.locator = locator;
        self
    }

    #[must_use]
    pub fn with_ambiguity(mut self, ambiguity: AmbiguityHandling) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    #[must_use]
    pub fn with_parallel_matching(mut self, parallel: bool) -> Self {
        self.parallel_matching = parallel;
        self
    }

    #[must_use]
    pub fn with_validate_fragments(mut self, validate: bool) -> Self {
        self.validate_fragments = validate;
        self
    }

    /// Rejects a tolerance that is not finite and strictly positive.
    pub fn validate(&self) -> Result<(), GrainMeshError> {
        if self.tolerance.is_finite() && self.tolerance > 0.0 {
            Ok(())
        } else {
            Err(GrainMeshError::InvalidTolerance(self.tolerance))
        }
    }
}
