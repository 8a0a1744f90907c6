//! Grain-by-grain mesh assembly.
//!
//! [`MeshAssembler`] owns the growing [`GlobalMesh`] and folds one
//! [`MeshFragment`] into it per call to [`MeshAssembler::merge`]. A merge
//! step runs in a fixed order:
//!
//! 1. check grain order and (optionally) validate the fragment;
//! 2. match every fragment node against the frozen pre-step node set;
//! 3. build the local to global node remap, allocating ids for unmatched nodes;
//! 4. migrate every element through the completed remap;
//! 5. commit nodes, elements and the provenance record.
//!
//! Steps 1–4 do not touch the mesh, so a failing grain leaves it exactly
//! as it was. Grains merged earlier are never revisited.

use std::fmt;

use crate::algs::config::{AmbiguityHandling, AssemblyConfig};
use crate::algs::matching::{self, NodeLocator, NodeMatch};
use crate::algs::migrate::migrate_elements;
use crate::algs::remap::NodeRemap;
use crate::data::fragment::MeshFragment;
use crate::data::global_mesh::{GlobalMesh, GrainRecord};
use crate::geometry::Coord;
use crate::invariants::MeshInvariants;
use crate::mesh_error::GrainMeshError;
use crate::topology::point::{ElementId, GrainId, NodeId};

/// Summary of one merge step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub grain: GrainId,
    /// Fragment nodes mapped onto existing global nodes.
    pub nodes_matched: usize,
    /// Fragment nodes appended under fresh global ids.
    pub nodes_added: usize,
    pub elements_added: usize,
    /// Matched nodes that had more than one candidate within tolerance.
    pub ambiguous_matches: usize,
    pub first_node: Option<NodeId>,
    pub first_element: Option<ElementId>,
}

/// Sequential assembler for per-grain mesh fragments.
pub struct MeshAssembler {
    config: AssemblyConfig,
    mesh: GlobalMesh,
    locator: Box<dyn NodeLocator>,
    /// Current maximum node id; the next allocation is `node_floor + 1`.
    node_floor: u64,
    element_floor: u64,
}

impl fmt::Debug for MeshAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshAssembler")
            .field("config", &self.config)
            .field("nodes", &self.mesh.node_count())
            .field("elements", &self.mesh.element_count())
            .field("node_floor", &self.node_floor)
            .field("element_floor", &self.element_floor)
            .finish_non_exhaustive()
    }
}

impl MeshAssembler {
    /// Starts a fresh assembly run; both id counters start at zero.
    pub fn new(config: AssemblyConfig) -> Result<Self, GrainMeshError> {
        Self::from_mesh(GlobalMesh::new(), config)
    }

    /// Resumes assembly on top of an existing mesh. Counters continue from
    /// the mesh's current maxima and its nodes are indexed for matching.
    pub fn from_mesh(mesh: GlobalMesh, config: AssemblyConfig) -> Result<Self, GrainMeshError> {
        config.validate()?;
        mesh.validate_invariants()?;
        let mut locator = config.locator.build(config.tolerance)?;
        for (id, coord) in mesh.nodes() {
            locator.insert(id, *coord);
        }
        Ok(Self {
            node_floor: mesh.max_node_id(),
            element_floor: mesh.max_element_id(),
            config,
            mesh,
            locator,
        })
    }

    #[inline]
    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    /// The mesh assembled so far.
    #[inline]
    pub fn mesh(&self) -> &GlobalMesh {
        &self.mesh
    }

    pub fn into_mesh(self) -> GlobalMesh {
        self.mesh
    }

    /// Id the next newly allocated node will receive.
    pub fn next_node_id(&self) -> NodeId {
        NodeId::after(self.node_floor)
    }

    /// Id the next migrated element will receive.
    pub fn next_element_id(&self) -> ElementId {
        ElementId::after(self.element_floor)
    }

    /// Folds one grain's fragment into the global mesh.
    ///
    /// Grains must arrive in strictly increasing id order. On error the
    /// global mesh is unchanged.
    pub fn merge(
        &mut self,
        grain: GrainId,
        fragment: MeshFragment,
    ) -> Result<MergeReport, GrainMeshError> {
        if let Some(previous) = self.mesh.last_grain() {
            if grain <= previous {
                return Err(GrainMeshError::GrainOutOfOrder { previous, grain });
            }
        }
        if self.config.validate_fragments {
            fragment.validate(grain)?;
        }
        log::info!(
            "Merging grain {grain}: {} nodes, {} elements",
            fragment.node_count(),
            fragment.element_count()
        );

        let coords: Vec<Coord> = fragment.nodes().map(|(_, c)| *c).collect();
        let matches = self.match_nodes(&coords);
        let remap = NodeRemap::build(fragment.nodes(), &matches, self.node_floor);
        self.check_ambiguity(grain, &remap)?;
        let elements = migrate_elements(&fragment, &remap, grain, self.element_floor)?;

        let nodes_matched = remap.matched();
        let ambiguous_matches = remap.ambiguous().len();
        let new_nodes = remap.into_new_nodes();
        let record = GrainRecord {
            grain,
            first_node: new_nodes.first().map(|(id, _)| *id),
            nodes_added: new_nodes.len() as u64,
            first_element: elements.first().map(|(id, _)| *id),
            elements_added: elements.len() as u64,
        };
        let report = MergeReport {
            grain,
            nodes_matched,
            nodes_added: new_nodes.len(),
            elements_added: elements.len(),
            ambiguous_matches,
            first_node: record.first_node,
            first_element: record.first_element,
        };

        for (id, coord) in new_nodes {
            self.mesh.push_node(id, coord);
            self.locator.insert(id, coord);
            self.node_floor = id.get();
        }
        for (id, elem) in elements {
            self.mesh.push_element(id, elem);
            self.element_floor = id.get();
        }
        self.mesh.push_grain(record);
        self.mesh.debug_assert_invariants();

        log::debug!(
            "Grain {grain}: matched {} nodes, added {} nodes and {} elements",
            report.nodes_matched,
            report.nodes_added,
            report.elements_added
        );
        Ok(report)
    }

    fn match_nodes(&self, coords: &[Coord]) -> Vec<NodeMatch> {
        #[cfg(feature = "rayon")]
        {
            if self.config.parallel_matching {
                return matching::par_match_all(self.locator.as_ref(), coords);
            }
        }
        matching::match_all(self.locator.as_ref(), coords)
    }

    fn check_ambiguity(&self, grain: GrainId, remap: &NodeRemap) -> Result<(), GrainMeshError> {
        for &(node, candidates) in remap.ambiguous() {
            match self.config.ambiguity {
                AmbiguityHandling::Warn => {
                    log::warn!(
                        "Ambiguous match: grain={grain} node={node} candidates={candidates} chosen={:?}",
                        remap.get(node)
                    );
                }
                AmbiguityHandling::Error => {
                    return Err(GrainMeshError::AmbiguousMatch {
                        grain,
                        node,
                        candidates,
                    });
                }
                AmbiguityHandling::Ignore => {}
            }
        }
        Ok(())
    }
}

/// Assembles a whole grain sequence into a fresh mesh.
pub fn assemble<I>(config: AssemblyConfig, fragments: I) -> Result<GlobalMesh, GrainMeshError>
where
    I: IntoIterator<Item = (GrainId, MeshFragment)>,
{
    let mut assembler = MeshAssembler::new(config)?;
    for (grain, fragment) in fragments {
        assembler.merge(grain, fragment)?;
    }
    Ok(assembler.into_mesh())
}
