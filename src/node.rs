use std::fmt::Debug;

/// Side length exponent of a leaf block. Leaves are 4x4.
pub const LEAF_LEVEL: u8 = 2;

/// Index of a canonical node in the store's arena.
///
/// Because nodes are hash-consed, two ids are equal exactly when the regions
/// they name are structurally equal. This is what makes result memoization
/// work across unrelated parts of the universe.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural description of a node. Doubles as the content-addressing key in
/// the store's canonical table.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum NodeData {
    /// 4x4 bit pattern, bit `row * 4 + col`, row 0 at the north edge and
    /// col 0 at the west edge.
    Leaf(u16),

    /// Four children of level - 1 covering the quadrants.
    Inner {
        nw: NodeId,
        ne: NodeId,
        sw: NodeId,
        se: NodeId,
    },
}

/// A canonical, immutable quadtree node covering a square region of side
/// `2^level` cells.
#[derive(Clone, Copy)]
pub struct Node {
    pub(crate) data: NodeData,
    pub(crate) level: u8,
    pub(crate) population: u64,

    /// Memoized result: this region's centered half, advanced by
    /// `2^(level - 2)` generations. Written at most once.
    pub(crate) result: Option<NodeId>,
}

impl Node {
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Number of live cells under this node.
    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.data, NodeData::Leaf(_))
    }

    /// Child ids in `[nw, ne, sw, se]` order, or `None` for a leaf.
    pub fn children(&self) -> Option<[NodeId; 4]> {
        match self.data {
            NodeData::Leaf(_) => None,
            NodeData::Inner { nw, ne, sw, se } => Some([nw, ne, sw, se]),
        }
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.data {
            NodeData::Leaf(bits) => {
                write!(f, "Leaf[{:#018b}, pop: {}]", bits, self.population)
            }
            NodeData::Inner { nw, ne, sw, se } => write!(
                f,
                "Node[level: {}, nw: {:?}, ne: {:?}, sw: {:?}, se: {:?}, pop: {}]",
                self.level, nw, ne, sw, se, self.population
            ),
        }
    }
}
