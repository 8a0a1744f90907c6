//! Fragment ingestion.
//!
//! Readers turn one grain's mesh file into a [`MeshFragment`]; the
//! sequence helpers walk a numbered family of grain files
//! (`<basename>1.msh`, `<basename>2.msh`, ...) and feed each fragment to a
//! [`MeshAssembler`].

pub mod gmsh;

use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::algs::assembler::{MergeReport, MeshAssembler};
use crate::data::fragment::MeshFragment;
use crate::mesh_error::GrainMeshError;
use crate::topology::point::GrainId;

/// Trait for readers that produce one grain fragment.
pub trait FragmentReader {
    /// Parse a fragment from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<MeshFragment, GrainMeshError>;
}

/// Path of the file holding `grain`: `"{basename}{grain}.msh"`.
pub fn grain_file_path(basename: &str, grain: GrainId) -> PathBuf {
    PathBuf::from(format!("{basename}{grain}.msh"))
}

/// Opens and parses the file for one grain.
pub fn read_grain_file<F: FragmentReader>(
    reader: &F,
    basename: &str,
    grain: GrainId,
) -> Result<MeshFragment, GrainMeshError> {
    let path = grain_file_path(basename, grain);
    let file = File::open(&path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => GrainMeshError::MissingGrainFile {
            grain,
            path: path.display().to_string(),
        },
        _ => GrainMeshError::from(err),
    })?;
    log::info!("Reading grain {grain} from {}", path.display());
    reader
        .read(BufReader::new(file))
        .map_err(|err| err.with_grain(grain))
}

/// Reads and merges every grain in `grains`, in increasing order.
///
/// Stops at the first failing grain; grains merged before it remain in the
/// assembler's mesh.
pub fn read_grain_sequence<F: FragmentReader>(
    reader: &F,
    basename: &str,
    grains: RangeInclusive<u32>,
    assembler: &mut MeshAssembler,
) -> Result<Vec<MergeReport>, GrainMeshError> {
    let mut reports = Vec::new();
    for raw in grains {
        let grain = GrainId(raw);
        let fragment = read_grain_file(reader, basename, grain)?;
        reports.push(assembler.merge(grain, fragment)?);
    }
    log::info!(
        "Assembled {} grains: {} nodes, {} elements",
        reports.len(),
        assembler.mesh().node_count(),
        assembler.mesh().element_count()
    );
    Ok(reports)
}
