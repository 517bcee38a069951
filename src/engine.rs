//! The memoized stepping engine.
//!
//! A node of level `k` covers a `2^k` square. Its *result* is the canonical
//! node for the centered `2^(k - 1)` square, advanced in time. At full speed
//! the advance is `2^(k - 2)` generations, the most the node's dead border
//! can vouch for; a smaller budget caps the advance at `2^budget_log2` so a
//! caller can consume an arbitrary generation count exactly.

use tracing::trace;

use crate::node::NodeId;
use crate::store::Store;

impl Store {
    /// Advance the centered half of `id` by `2^min(budget_log2, level - 2)`
    /// generations, returning a node one level down.
    ///
    /// Only defined for nodes of level >= 3: an 8x8 block is the smallest
    /// region whose center 4x4 has a full neighborhood to evolve under.
    pub fn result(&mut self, id: NodeId, budget_log2: u8) -> NodeId {
        let node = self.node(id);
        let level = node.level();
        assert!(level >= 3, "result is undefined below level 3");

        // Nothing alive evolves to nothing alive
        if node.population() == 0 {
            return self.empty(level - 1);
        }

        let full = budget_log2 >= level - 2;

        if full {
            if let Some(res) = self.cached_result(id) {
                return res;
            }
        } else if let Some(&res) = self.partial.get(&(id, budget_log2)) {
            return res;
        }

        let res = if level == 3 {
            self.block_result(id, budget_log2)
        } else {
            self.node_result(id, budget_log2)
        };

        if full {
            self.set_result(id, res);
        } else {
            self.partial.insert((id, budget_log2), res);
        }

        trace!(?id, level, budget_log2, ?res, "computed result");

        res
    }

    /// Base case: an 8x8 block of four leaves, stepped one generation
    /// (budget 0) or two (any larger budget) through the rule table.
    fn block_result(&mut self, id: NodeId, budget_log2: u8) -> NodeId {
        let [nw, ne, sw, se] = self.children(id);
        let grid = grid_from_leaves(
            self.leaf_bits(nw),
            self.leaf_bits(ne),
            self.leaf_bits(sw),
            self.leaf_bits(se),
        );

        // After one pass only the center 6x6 of the grid is meaningful, which
        // is exactly the neighborhood the second pass needs.
        let grid = self.grid_step(grid, &[0, 2, 4]);
        let grid = if budget_log2 == 0 {
            grid
        } else {
            self.grid_step(grid, &[1, 3])
        };

        self.leaf(block_at(grid, 2, 2))
    }

    /// Recursive case: compose the results of nine overlapping sub-nodes, per
    /// the usual HashLife construction.
    fn node_result(&mut self, id: NodeId, budget_log2: u8) -> NodeId {
        let level = self.level(id);
        let [nw, ne, sw, se] = self.children(id);

        // Nine overlapping level - 1 nodes tiling the region:
        //
        //   n00 n01 n02
        //   n10 n11 n12
        //   n20 n21 n22
        //
        // Corners are the children themselves; the rest are centered on the
        // children's shared edges and on the node itself.
        let n00 = nw;
        let n01 = self.centered_horiz(nw, ne);
        let n02 = ne;
        let n10 = self.centered_vert(nw, sw);
        let n11 = self.centered(id);
        let n12 = self.centered_vert(ne, se);
        let n20 = sw;
        let n21 = self.centered_horiz(sw, se);
        let n22 = se;

        let r00 = self.result(n00, budget_log2);
        let r01 = self.result(n01, budget_log2);
        let r02 = self.result(n02, budget_log2);
        let r10 = self.result(n10, budget_log2);
        let r11 = self.result(n11, budget_log2);
        let r12 = self.result(n12, budget_log2);
        let r20 = self.result(n20, budget_log2);
        let r21 = self.result(n21, budget_log2);
        let r22 = self.result(n22, budget_log2);

        // Reassemble the nine results into the four quadrants of the answer
        let qnw = self.join(r00, r01, r10, r11);
        let qne = self.join(r01, r02, r11, r12);
        let qsw = self.join(r10, r11, r20, r21);
        let qse = self.join(r11, r12, r21, r22);

        if budget_log2 >= level - 2 {
            // Full speed: the sub-results advanced 2^(level - 3); a second
            // result layer advances the other 2^(level - 3).
            let rnw = self.result(qnw, budget_log2);
            let rne = self.result(qne, budget_log2);
            let rsw = self.result(qsw, budget_log2);
            let rse = self.result(qse, budget_log2);

            self.join(rnw, rne, rsw, rse)
        } else {
            // The sub-results already advanced the whole 2^budget_log2, so
            // the second layer only extracts centers, adding no time.
            let rnw = self.centered(qnw);
            let rne = self.centered(qne);
            let rsw = self.centered(qsw);
            let rse = self.centered(qse);

            self.join(rnw, rne, rsw, rse)
        }
    }

    /// Given an n-node, returns the n/2 node at its center
    pub(crate) fn centered(&mut self, id: NodeId) -> NodeId {
        let level = self.level(id);
        let [nw, ne, sw, se] = self.children(id);

        if level == 3 {
            // Children are leaves; cut the center 4x4 out of the bit grid
            let grid = grid_from_leaves(
                self.leaf_bits(nw),
                self.leaf_bits(ne),
                self.leaf_bits(sw),
                self.leaf_bits(se),
            );

            return self.leaf(block_at(grid, 2, 2));
        }

        let a = self.children(nw)[3];
        let b = self.children(ne)[2];
        let c = self.children(sw)[1];
        let d = self.children(se)[0];

        self.join(a, b, c, d)
    }

    /// Given two n-nodes with `w` to the left and `e` to the right, returns
    /// the n-node centered on their shared vertical edge
    fn centered_horiz(&mut self, w: NodeId, e: NodeId) -> NodeId {
        let [_, wne, _, wse] = self.children(w);
        let [enw, _, esw, _] = self.children(e);

        self.join(wne, enw, wse, esw)
    }

    /// Given two n-nodes with `n` above and `s` below, returns the n-node
    /// centered on their shared horizontal edge
    fn centered_vert(&mut self, n: NodeId, s: NodeId) -> NodeId {
        let [_, _, nsw, nse] = self.children(n);
        let [snw, sne, _, _] = self.children(s);

        self.join(nsw, nse, snw, sne)
    }

    /// One generation of `grid` through the rule table, evaluating the 4x4
    /// blocks anchored at the given rows and columns. Only the centers of the
    /// evaluated blocks are written.
    fn grid_step(&self, grid: u64, anchors: &[usize]) -> u64 {
        let mut next = 0u64;

        for &row in anchors {
            for &col in anchors {
                let block = block_at(grid, row, col);
                put_center(&mut next, row, col, self.rules[block as usize]);
            }
        }

        next
    }
}

/// Pack four 4x4 leaves into an 8x8 grid with bit `row * 8 + col`
fn grid_from_leaves(nw: u16, ne: u16, sw: u16, se: u16) -> u64 {
    let mut grid = 0u64;

    for row in 0..4 {
        let north = ((nw as u64 >> (row * 4)) & 0xF) | (((ne as u64 >> (row * 4)) & 0xF) << 4);
        let south = ((sw as u64 >> (row * 4)) & 0xF) | (((se as u64 >> (row * 4)) & 0xF) << 4);

        grid |= north << (row * 8);
        grid |= south << ((row + 4) * 8);
    }

    grid
}

/// Extract the 4x4 block whose north-west corner is at (`row`, `col`)
fn block_at(grid: u64, row: usize, col: usize) -> u16 {
    let mut bits = 0u16;

    for r in 0..4 {
        bits |= (((grid >> ((row + r) * 8 + col)) & 0xF) as u16) << (r * 4);
    }

    bits
}

/// Write a center 2x2 result (bits 5, 6, 9, 10 of a 4x4 block) into `grid`,
/// at the center of the block anchored at (`row`, `col`)
fn put_center(grid: &mut u64, row: usize, col: usize, res: u16) {
    let top = ((res >> 5) & 0b11) as u64;
    let bot = ((res >> 9) & 0b11) as u64;

    *grid |= top << ((row + 1) * 8 + col + 1);
    *grid |= bot << ((row + 2) * 8 + col + 1);
}

#[cfg(test)]
mod test {
    use crate::store::Store;

    use super::block_at;
    use super::grid_from_leaves;

    /// Set the grid bits for the given (col, row) cells of an 8x8 block
    fn grid_of(cells: &[(usize, usize)]) -> u64 {
        let mut grid = 0u64;

        for &(x, y) in cells {
            grid |= 1 << (y * 8 + x);
        }

        grid
    }

    fn leaves_of(grid: u64) -> [u16; 4] {
        [
            block_at(grid, 0, 0),
            block_at(grid, 0, 4),
            block_at(grid, 4, 0),
            block_at(grid, 4, 4),
        ]
    }

    #[test]
    fn grid_round_trip() {
        let grid = grid_of(&[(0, 0), (3, 1), (4, 2), (7, 7), (2, 5)]);
        let [nw, ne, sw, se] = leaves_of(grid);

        assert_eq!(grid_from_leaves(nw, ne, sw, se), grid);
    }

    #[test]
    fn block_result_of_still_life() {
        let mut store = Store::new();

        // A 2x2 block sitting at the center of the 8x8
        let grid = grid_of(&[(3, 3), (4, 3), (3, 4), (4, 4)]);
        let [nw, ne, sw, se] = leaves_of(grid);

        let nw = store.leaf(nw);
        let ne = store.leaf(ne);
        let sw = store.leaf(sw);
        let se = store.leaf(se);
        let node = store.join(nw, ne, sw, se);

        let res = store.result(node, 1);

        // The center 4x4 is all four cells, untouched
        assert_eq!(store.leaf_bits(res), block_at(grid, 2, 2));
        assert_eq!(store.population(res), 4);
    }

    #[test]
    fn block_result_one_generation() {
        let mut store = Store::new();

        // A vertical blinker through the center: flips to horizontal
        let grid = grid_of(&[(3, 2), (3, 3), (3, 4)]);
        let [nw, ne, sw, se] = leaves_of(grid);

        let nw = store.leaf(nw);
        let ne = store.leaf(ne);
        let sw = store.leaf(sw);
        let se = store.leaf(se);
        let node = store.join(nw, ne, sw, se);

        let res = store.result(node, 0);

        let want = grid_of(&[(2, 3), (3, 3), (4, 3)]);
        assert_eq!(store.leaf_bits(res), block_at(want, 2, 2));
    }

    #[test]
    fn block_result_two_generations() {
        let mut store = Store::new();

        // Two generations bring the blinker back to its vertical phase
        let grid = grid_of(&[(3, 2), (3, 3), (3, 4)]);
        let [nw, ne, sw, se] = leaves_of(grid);

        let nw = store.leaf(nw);
        let ne = store.leaf(ne);
        let sw = store.leaf(sw);
        let se = store.leaf(se);
        let node = store.join(nw, ne, sw, se);

        let res = store.result(node, 1);

        assert_eq!(store.leaf_bits(res), block_at(grid, 2, 2));
    }

    #[test]
    fn results_are_memoized() {
        let mut store = Store::new();

        let grid = grid_of(&[(3, 3), (4, 3), (3, 4), (4, 4)]);
        let [nw, ne, sw, se] = leaves_of(grid);

        let nw = store.leaf(nw);
        let ne = store.leaf(ne);
        let sw = store.leaf(sw);
        let se = store.leaf(se);
        let node = store.join(nw, ne, sw, se);

        let a = store.result(node, 1);
        let interned = store.len();
        let b = store.result(node, 1);

        assert_eq!(a, b);
        assert_eq!(store.len(), interned);
    }
}
