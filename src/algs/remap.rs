//! Fragment-local to global node id mapping for one merge step.

use hashbrown::HashMap;

use crate::algs::matching::NodeMatch;
use crate::geometry::Coord;
use crate::topology::point::NodeId;

/// Total map from a fragment's node ids to global node ids, plus the nodes
/// that must be appended to the global table.
#[derive(Clone, Debug, Default)]
pub struct NodeRemap {
    map: HashMap<NodeId, NodeId>,
    /// Newly allocated `(global id, coordinate)` pairs in allocation order.
    new_nodes: Vec<(NodeId, Coord)>,
    matched: usize,
    ambiguous: Vec<(NodeId, usize)>,
}

impl NodeRemap {
    /// Builds the remap from fragment nodes and their match outcomes.
    ///
    /// `nodes` and `matches` are zipped pairwise and must be in the same
    /// order. Unmatched nodes receive consecutive ids starting right after
    /// `floor`, in iteration order.
    pub fn build<'a, I>(nodes: I, matches: &[NodeMatch], floor: u64) -> Self
    where
        I: IntoIterator<Item = (NodeId, &'a Coord)>,
    {
        let mut remap = NodeRemap {
            map: HashMap::with_capacity(matches.len()),
            ..Default::default()
        };
        let mut next = NodeId::after(floor);
        for ((local, coord), outcome) in nodes.into_iter().zip(matches) {
            let global = match *outcome {
                NodeMatch::Coincident { node, candidates } => {
                    remap.matched += 1;
                    if candidates > 1 {
                        remap.ambiguous.push((local, candidates));
                    }
                    node
                }
                NodeMatch::New => {
                    let id = next;
                    next = next.next();
                    remap.new_nodes.push((id, *coord));
                    id
                }
            };
            remap.map.insert(local, global);
        }
        remap
    }

    /// Global id for a fragment-local node id.
    #[inline]
    pub fn get(&self, local: NodeId) -> Option<NodeId> {
        self.map.get(&local).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of fragment nodes mapped onto existing global nodes.
    #[inline]
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// Nodes to append, in increasing global id order.
    #[inline]
    pub fn new_nodes(&self) -> &[(NodeId, Coord)] {
        &self.new_nodes
    }

    /// Fragment-local ids whose match had several candidates, with the
    /// candidate count.
    #[inline]
    pub fn ambiguous(&self) -> &[(NodeId, usize)] {
        &self.ambiguous
    }

    pub(crate) fn into_new_nodes(self) -> Vec<(NodeId, Coord)> {
        self.new_nodes
    }
}
