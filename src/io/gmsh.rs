//! Gmsh `.msh` fragment reader.
//!
//! # Supported format
//! - ASCII `.msh` version **2.x** (2.0, 2.1, 2.2). The `$MeshFormat` header is optional;
//!   grain files written by Neper and Dream3D frequently omit it.
//! - Element types: 1 (line), 2 (triangle), 3 (quad), 4 (tet), 5 (hex),
//!   6 (prism), 7 (pyramid), 15 (point).
//!
//! # Limitations
//! - Binary files are not supported.
//! - `.msh` v4.x (block-based) is not supported.
//! - Higher-order elements are not supported.
//! - Element tags (physical group, entity) are skipped.
//! - Sections other than `$MeshFormat`, `$Nodes` and `$Elements` are ignored.

use std::io::Read;
use std::str::SplitWhitespace;

use crate::data::element::Element;
use crate::data::fragment::MeshFragment;
use crate::io::FragmentReader;
use crate::mesh_error::GrainMeshError;
use crate::topology::cell_type::CellType;
use crate::topology::point::{ElementId, GrainId, NodeId};

/// Options for [`GmshFragmentReader`].
#[derive(Clone, Copy, Debug)]
pub struct GmshReadOptions {
    /// Run [`MeshFragment::validate`] on the parsed fragment.
    pub validate_fragment: bool,
}

impl Default for GmshReadOptions {
    fn default() -> Self {
        Self {
            validate_fragment: true,
        }
    }
}

/// Gmsh `.msh` reader producing one [`MeshFragment`].
#[derive(Debug, Default, Clone)]
pub struct GmshFragmentReader {
    pub options: GmshReadOptions,
}

fn parse_err(msg: impl Into<String>) -> GrainMeshError {
    GrainMeshError::MeshIoParse(msg.into())
}

impl GmshFragmentReader {
    pub fn with_options(options: GmshReadOptions) -> Self {
        Self { options }
    }

    fn parse_version(line: &str) -> Result<&str, GrainMeshError> {
        let mut parts = line.split_whitespace();
        let version = parts
            .next()
            .ok_or_else(|| parse_err("missing mesh format version"))?;
        let file_type = parts
            .next()
            .ok_or_else(|| parse_err("missing mesh format type"))?;
        if file_type != "0" {
            return Err(parse_err("binary .msh files are not supported"));
        }
        Ok(version)
    }

    /// Every 2.x release shares the `$Nodes` / `$Elements` layout.
    fn is_supported_version(version: &str) -> bool {
        version.split('.').next() == Some("2")
    }

    fn next_field<'a>(parts: &mut SplitWhitespace<'a>, what: &str) -> Result<&'a str, GrainMeshError> {
        parts.next().ok_or_else(|| parse_err(format!("missing {what}")))
    }

    fn parse_count(line: Option<&str>, what: &str) -> Result<usize, GrainMeshError> {
        let line = line.ok_or_else(|| parse_err(format!("missing {what} count")))?;
        line.trim()
            .parse::<usize>()
            .map_err(|_| parse_err(format!("invalid {what} count: {line}")))
    }

    fn parse_node_id(raw: &str) -> Result<NodeId, GrainMeshError> {
        let raw = raw
            .parse::<u64>()
            .map_err(|_| parse_err(format!("invalid node id: {raw}")))?;
        NodeId::new(raw)
    }

    fn parse_element_id(raw: &str) -> Result<ElementId, GrainMeshError> {
        let raw = raw
            .parse::<u64>()
            .map_err(|_| parse_err(format!("invalid element id: {raw}")))?;
        ElementId::new(raw)
    }

    fn parse_coord(raw: &str) -> Result<f64, GrainMeshError> {
        raw.parse::<f64>()
            .map_err(|_| parse_err(format!("invalid coordinate: {raw}")))
    }

    fn parse_node_line(line: &str) -> Result<(NodeId, [f64; 3]), GrainMeshError> {
        let mut parts = line.split_whitespace();
        let id = Self::parse_node_id(Self::next_field(&mut parts, "node id")?)?;
        let x = Self::parse_coord(Self::next_field(&mut parts, "x coordinate")?)?;
        let y = Self::parse_coord(Self::next_field(&mut parts, "y coordinate")?)?;
        let z = Self::parse_coord(Self::next_field(&mut parts, "z coordinate")?)?;
        Ok((id, [x, y, z]))
    }

    fn parse_element_line(line: &str) -> Result<(ElementId, Element), GrainMeshError> {
        let mut parts = line.split_whitespace();
        let id = Self::parse_element_id(Self::next_field(&mut parts, "element id")?)?;
        let code = Self::next_field(&mut parts, "element type")?
            .parse::<u32>()
            .map_err(|_| parse_err("invalid element type"))?;
        let cell_type = CellType::from_gmsh(code)
            .ok_or_else(|| parse_err(format!("unsupported element type: {code}")))?;
        let num_tags = Self::next_field(&mut parts, "element tag count")?
            .parse::<usize>()
            .map_err(|_| parse_err("invalid element tag count"))?;
        for _ in 0..num_tags {
            Self::next_field(&mut parts, "element tag")?;
        }
        let vertices = (0..cell_type.vertex_count())
            .map(|_| Self::parse_node_id(Self::next_field(&mut parts, "element node id")?))
            .collect::<Result<Vec<_>, _>>()?;
        if parts.next().is_some() {
            return Err(parse_err(format!(
                "element {id}: trailing fields after {} node ids",
                cell_type.vertex_count()
            )));
        }
        Ok((id, Element::new(cell_type, vertices)))
    }

    fn expect_end<'a>(
        lines: &mut impl Iterator<Item = &'a str>,
        marker: &str,
    ) -> Result<(), GrainMeshError> {
        match lines.next() {
            Some(line) if line.trim() == marker => Ok(()),
            _ => Err(parse_err(format!("missing {marker}"))),
        }
    }

    /// Parses a fragment from `.msh` text.
    pub fn parse_str(&self, contents: &str) -> Result<MeshFragment, GrainMeshError> {
        let mut lines = contents.lines();
        let mut fragment = MeshFragment::new();
        let mut version: Option<String> = None;
        let mut saw_nodes = false;

        while let Some(line) = lines.next() {
            match line.trim() {
                "$MeshFormat" => {
                    let format_line = lines.next().ok_or_else(|| parse_err("missing MeshFormat"))?;
                    version = Some(Self::parse_version(format_line)?.to_string());
                    Self::expect_end(&mut lines, "$EndMeshFormat")?;
                }
                "$Nodes" => {
                    let count = Self::parse_count(lines.next(), "node")?;
                    for _ in 0..count {
                        let node_line = lines
                            .next()
                            .ok_or_else(|| parse_err("unexpected end of node list"))?;
                        let (id, xyz) = Self::parse_node_line(node_line)?;
                        fragment.insert_node(id, xyz)?;
                    }
                    Self::expect_end(&mut lines, "$EndNodes")?;
                    saw_nodes = true;
                }
                "$Elements" => {
                    let count = Self::parse_count(lines.next(), "element")?;
                    for _ in 0..count {
                        let elem_line = lines
                            .next()
                            .ok_or_else(|| parse_err("unexpected end of element list"))?;
                        let (id, elem) = Self::parse_element_line(elem_line)?;
                        fragment.insert_element(id, elem)?;
                    }
                    Self::expect_end(&mut lines, "$EndElements")?;
                }
                _ => {
                    // ignore other sections
                }
            }
        }

        let version = version.unwrap_or_else(|| "2.2".to_string());
        if !Self::is_supported_version(&version) {
            return Err(parse_err(format!("unsupported gmsh version: {version}")));
        }
        if !saw_nodes {
            return Err(parse_err("missing $Nodes section"));
        }
        if self.options.validate_fragment {
            // Grain is unknown here; `read_grain_file` re-labels the error.
            fragment.validate(GrainId::default())?;
        }
        Ok(fragment)
    }
}

impl FragmentReader for GmshFragmentReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<MeshFragment, GrainMeshError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        self.parse_str(&contents)
    }
}
