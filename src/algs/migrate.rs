//! Element migration: rewrite a fragment's elements into the global id space.

use crate::algs::remap::NodeRemap;
use crate::data::element::Element;
use crate::data::fragment::MeshFragment;
use crate::mesh_error::GrainMeshError;
use crate::topology::point::{ElementId, GrainId};

/// Renumbers every element of `fragment` through `remap`.
///
/// Elements keep the fragment's id order and receive consecutive global
/// ids after `floor`. Nothing is written to the global mesh here; the
/// caller commits the returned list once the whole grain has succeeded.
pub fn migrate_elements(
    fragment: &MeshFragment,
    remap: &NodeRemap,
    grain: GrainId,
    floor: u64,
) -> Result<Vec<(ElementId, Element)>, GrainMeshError> {
    let mut out = Vec::with_capacity(fragment.element_count());
    let mut next = ElementId::after(floor);
    for (local, elem) in fragment.elements() {
        let migrated = elem
            .try_remap(|v| remap.get(v))
            .map_err(|node| GrainMeshError::MalformedFragment {
                grain,
                element: local,
                node,
            })?;
        out.push((next, migrated));
        next = next.next();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::matching::NodeMatch;
    use crate::topology::cell_type::CellType;
    use crate::topology::point::NodeId;

    fn nid(raw: u64) -> NodeId {
        NodeId::new(raw).unwrap()
    }

    fn eid(raw: u64) -> ElementId {
        ElementId::new(raw).unwrap()
    }

    #[test]
    fn elements_are_renumbered_in_fragment_order() {
        let mut f = MeshFragment::new();
        f.insert_node(nid(1), [0.0; 3]).unwrap();
        f.insert_node(nid(2), [1.0, 0.0, 0.0]).unwrap();
        f.insert_element(eid(20), Element::new(CellType::Segment, vec![nid(2), nid(1)]))
            .unwrap();
        f.insert_element(eid(10), Element::new(CellType::Vertex, vec![nid(1)]))
            .unwrap();
        let matches = [
            NodeMatch::Coincident { node: nid(8), candidates: 1 },
            NodeMatch::New,
        ];
        let remap = NodeRemap::build(f.nodes(), &matches, 9);
        let out = migrate_elements(&f, &remap, GrainId(1), 3).unwrap();
        assert_eq!(
            out,
            vec![
                (eid(4), Element::new(CellType::Vertex, vec![nid(8)])),
                (eid(5), Element::new(CellType::Segment, vec![nid(10), nid(8)])),
            ]
        );
    }

    #[test]
    fn dangling_reference_is_malformed_fragment() {
        let mut f = MeshFragment::new();
        f.insert_node(nid(1), [0.0; 3]).unwrap();
        f.insert_element(eid(3), Element::new(CellType::Segment, vec![nid(1), nid(2)]))
            .unwrap();
        let remap = NodeRemap::build(f.nodes(), &[NodeMatch::New], 0);
        assert_eq!(
            migrate_elements(&f, &remap, GrainId(6), 0),
            Err(GrainMeshError::MalformedFragment {
                grain: GrainId(6),
                element: eid(3),
                node: nid(2),
            })
        );
    }
}
