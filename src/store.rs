use std::collections::HashMap;

use tracing::trace;

use crate::node::LEAF_LEVEL;
use crate::node::Node;
use crate::node::NodeData;
use crate::node::NodeId;
use crate::rule_set::RuleSet;

/// Hash-consing registry for quadtree nodes.
///
/// This is where all of our memory goes: every node built anywhere in the
/// simulation is interned here exactly once, keyed on its structural
/// description. Structurally equal descriptions always resolve to the same
/// [`NodeId`], so id comparison is structural equality.
///
/// The store is the only mutable structure in the engine; all access is
/// serialized behind `&mut self`.
pub struct Store {
    nodes: Vec<Node>,

    /// Content-addressed table from a node description to its id
    table: HashMap<NodeData, NodeId>,

    /// Canonical empty node per level, indexed by `level - LEAF_LEVEL`
    empties: Vec<NodeId>,

    /// Reduced-speed step results, keyed by node and the log2 of the advance.
    /// Full-speed results live on the nodes themselves.
    pub(crate) partial: HashMap<(NodeId, u8), NodeId>,

    /// Leaf transition table: 4x4 block to the next state of its center 2x2
    pub(crate) rules: Vec<u16>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create a store stepping with Conway's rules
    pub fn new() -> Self {
        Self::with_rule_set(RuleSet::default())
    }

    pub fn with_rule_set(set: RuleSet) -> Self {
        Store {
            nodes: Vec::new(),
            table: HashMap::new(),
            empties: Vec::new(),
            partial: HashMap::new(),
            rules: set.compute_rules(),
        }
    }

    /// Intern a leaf with the given 4x4 bit pattern
    pub fn leaf(&mut self, bits: u16) -> NodeId {
        self.canonicalize(NodeData::Leaf(bits), LEAF_LEVEL, bits.count_ones() as u64)
    }

    /// Intern the inner node with the given four children.
    ///
    /// All four children must be of the same level; a mismatch is a defect in
    /// the caller and fails loudly.
    pub fn join(&mut self, nw: NodeId, ne: NodeId, sw: NodeId, se: NodeId) -> NodeId {
        let level = self.level(nw);
        assert_eq!(level, self.level(ne), "child level mismatch");
        assert_eq!(level, self.level(sw), "child level mismatch");
        assert_eq!(level, self.level(se), "child level mismatch");

        let population = self.population(nw)
            + self.population(ne)
            + self.population(sw)
            + self.population(se);

        self.canonicalize(NodeData::Inner { nw, ne, sw, se }, level + 1, population)
    }

    /// The canonical empty node of the given level
    pub fn empty(&mut self, level: u8) -> NodeId {
        assert!(level >= LEAF_LEVEL, "no nodes below the leaf level");

        let i = (level - LEAF_LEVEL) as usize;
        while self.empties.len() <= i {
            let last = self.empties.last().copied();
            let id = match last {
                None => self.leaf(0),
                Some(e) => self.join(e, e, e, e),
            };

            self.empties.push(id);
        }

        self.empties[i]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn level(&self, id: NodeId) -> u8 {
        self.node(id).level
    }

    pub fn population(&self, id: NodeId) -> u64 {
        self.node(id).population
    }

    /// Number of distinct nodes interned so far
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every memoized step result, keeping the nodes themselves.
    ///
    /// Results are pure functions of their node, so evicting them can only
    /// cost recomputation, never correctness.
    pub fn clear_results(&mut self) {
        for node in &mut self.nodes {
            node.result = None;
        }

        self.partial.clear();
    }

    /// Child ids of an inner node. Calling this on a leaf is a defect in the
    /// engine and fails loudly.
    pub(crate) fn children(&self, id: NodeId) -> [NodeId; 4] {
        match self.node(id).data {
            NodeData::Inner { nw, ne, sw, se } => [nw, ne, sw, se],
            NodeData::Leaf(_) => unreachable!("leaf nodes have no children"),
        }
    }

    pub(crate) fn leaf_bits(&self, id: NodeId) -> u16 {
        match self.node(id).data {
            NodeData::Leaf(bits) => bits,
            NodeData::Inner { .. } => unreachable!("inner nodes carry no bit pattern"),
        }
    }

    pub(crate) fn cached_result(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).result
    }

    /// Record a node's full-speed result. Write-once: a second write with a
    /// different value would mean the engine is not deterministic.
    pub(crate) fn set_result(&mut self, id: NodeId, res: NodeId) {
        let slot = &mut self.nodes[id.index()].result;

        debug_assert!(slot.is_none() || *slot == Some(res));
        *slot = Some(res);
    }

    fn canonicalize(&mut self, data: NodeData, level: u8, population: u64) -> NodeId {
        if let Some(&id) = self.table.get(&data) {
            return id;
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            data,
            level,
            population,
            result: None,
        });
        self.table.insert(data, id);

        trace!(?id, level, population, "interned node");

        id
    }
}

#[cfg(test)]
mod test {
    use super::Store;

    #[test]
    fn leaves_are_canonical() {
        let mut store = Store::new();

        let a = store.leaf(0b1010);
        let b = store.leaf(0b1010);
        let c = store.leaf(0b0101);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn joins_are_canonical() {
        let mut store = Store::new();

        let x = store.leaf(1);
        let y = store.leaf(2);

        let a = store.join(x, y, x, y);
        let b = store.join(x, y, x, y);
        let c = store.join(y, x, y, x);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.level(a), 3);
    }

    #[test]
    fn population_sums_children() {
        let mut store = Store::new();

        let x = store.leaf(0b1110);
        let y = store.leaf(0b0001);

        let n = store.join(x, y, x, y);

        assert_eq!(store.population(n), 8);
    }

    #[test]
    fn empties_match_level() {
        let mut store = Store::new();

        let e = store.empty(6);

        assert_eq!(store.level(e), 6);
        assert_eq!(store.population(e), 0);

        // the same node comes back, and its children are the level-5 empty
        assert_eq!(store.empty(6), e);
        assert_eq!(store.children(e)[0], store.empty(5));
    }
}
