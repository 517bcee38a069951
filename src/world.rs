use std::collections::HashSet;

use thiserror::Error;
use tracing::debug;

use crate::WorldOffset;
use crate::aabb::Aabb;
use crate::node::LEAF_LEVEL;
use crate::node::NodeData;
use crate::node::NodeId;
use crate::point::Point;
use crate::rule_set::RuleSet;
use crate::store::Store;
use crate::util::partition_in_place;

/// Deepest root the world will grow to. Offsets are `i64`, so one more level
/// would make the root's side length unrepresentable.
const MAX_LEVEL: u8 = 61;

/// Largest single time jump, bounded by the deepest root we can pad around
const MAX_BUDGET: u8 = MAX_LEVEL - 3;

pub type WorldResult<T> = Result<T, WorldError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorldError {
    #[error("World offset overflowed while growing the universe")]
    OffsetOverflow,
}

/// An unbounded Life universe tracked as a canonical quadtree.
///
/// The root covers the currently interesting square region; everything
/// outside it is dead by convention, and the root grows on demand whenever
/// live cells approach its edge.
pub struct World {
    store: Store,

    /// Root node of the tracked region
    root: NodeId,

    /// World coordinate of the root's north-west corner
    x: WorldOffset,
    y: WorldOffset,

    /// Generations elapsed since the initial state
    generation: u64,
}

/// Advance a sparse cell set by exactly `generations` generations.
///
/// `generations = 0` canonicalizes and reads back, which is a semantic no-op.
pub fn step(cells: &HashSet<Point>, generations: u64) -> WorldResult<HashSet<Point>> {
    let mut world = World::from_cells(cells.iter().copied())?;
    world.advance(generations)?;

    Ok(world.cells())
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create an empty world stepping with Conway's rules
    pub fn new() -> Self {
        Self::with_rule_set(RuleSet::default())
    }

    pub fn with_rule_set(set: RuleSet) -> Self {
        let mut store = Store::with_rule_set(set);
        let root = store.empty(3);

        World {
            store,
            root,
            x: -4,
            y: -4,
            generation: 0,
        }
    }

    /// Build a world from a sparse cell set.
    ///
    /// The root is the minimal power-of-two square containing every live
    /// cell with at least a one-cell dead margin, live region centered.
    pub fn from_cells<I>(cells: I) -> WorldResult<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        Self::from_cells_with(cells, RuleSet::default())
    }

    pub fn from_cells_with<I>(cells: I, set: RuleSet) -> WorldResult<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut points: Vec<Point> = cells.into_iter().collect();
        if points.is_empty() {
            return Ok(Self::with_rule_set(set));
        }

        let bbox = Aabb::from_points(points.iter().copied());
        let (w, h) = bbox.extent();

        // Smallest level whose side fits the pattern plus the dead margin
        let mut level = 3u8;
        while (1i128 << level) < w.max(h) + 2 {
            if level == MAX_LEVEL {
                return Err(WorldError::OffsetOverflow);
            }

            level += 1;
        }

        let side = 1i128 << level;
        let x = center_offset(bbox.min.x, side, w)?;
        let y = center_offset(bbox.min.y, side, h)?;

        let mut store = Store::with_rule_set(set);
        let root = build(&mut store, &mut points, x, y, level);

        Ok(World {
            store,
            root,
            x,
            y,
            generation: 0,
        })
    }

    /// Number of live cells in the universe
    pub fn population(&self) -> u64 {
        self.store.population(self.root)
    }

    /// Generations elapsed since the initial state
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Level of the root node, for diagnostics: the tracked region is a
    /// square of side `2^level`
    pub fn level(&self) -> u8 {
        self.store.level(self.root)
    }

    /// Advance the universe by exactly `generations` generations.
    ///
    /// The count is consumed in decreasing power-of-two jumps, each taken at
    /// whatever level gives the engine a result window of that exact size,
    /// so the requested count is never overshot.
    pub fn advance(&mut self, generations: u64) -> WorldResult<()> {
        let mut remaining = generations;

        while remaining > 0 {
            // An empty universe is a fixpoint
            if self.population() == 0 {
                break;
            }

            let budget = (63 - remaining.leading_zeros() as u8).min(MAX_BUDGET);

            self.ensure_headroom(budget)?;

            let level = self.store.level(self.root);
            let root = self.store.result(self.root, budget);

            // The result is the centered half of the old root
            let shift = 1 << (level - 2);
            self.x = self.x.checked_add(shift).ok_or(WorldError::OffsetOverflow)?;
            self.y = self.y.checked_add(shift).ok_or(WorldError::OffsetOverflow)?;
            self.root = root;

            debug!(
                budget,
                level,
                remaining = remaining - (1 << budget),
                nodes = self.store.len(),
                "advanced"
            );

            remaining -= 1u64 << budget;
        }

        self.generation = self.generation.saturating_add(generations);

        Ok(())
    }

    /// Wrap the root in a node one level larger, old root centered and the
    /// border filled with dead cells
    pub fn grow(&mut self) -> WorldResult<()> {
        let level = self.store.level(self.root);
        if level >= MAX_LEVEL {
            return Err(WorldError::OffsetOverflow);
        }

        // Validate both corners of the grown region before touching the tree
        let half = 1i64 << (level - 1);
        let x = self.x.checked_sub(half).ok_or(WorldError::OffsetOverflow)?;
        let y = self.y.checked_sub(half).ok_or(WorldError::OffsetOverflow)?;

        let side = 1i128 << (level + 1);
        if x as i128 + side - 1 > WorldOffset::MAX as i128
            || y as i128 + side - 1 > WorldOffset::MAX as i128
        {
            return Err(WorldError::OffsetOverflow);
        }

        let empty = self.store.empty(level - 1);
        let [nw, ne, sw, se] = self.store.children(self.root);

        let rnw = self.store.join(empty, empty, empty, nw);
        let rne = self.store.join(empty, empty, ne, empty);
        let rsw = self.store.join(empty, sw, empty, empty);
        let rse = self.store.join(se, empty, empty, empty);
        self.root = self.store.join(rnw, rne, rsw, rse);

        self.x = x;
        self.y = y;

        debug!(level = level + 1, "grew universe");

        Ok(())
    }

    /// Grow until a `2^budget_log2` generation jump cannot push live cells
    /// past the engine's result window.
    ///
    /// Idempotent: once the root is deep enough and the population sits in
    /// the centered quarter, this returns without touching the tree.
    fn ensure_headroom(&mut self, budget_log2: u8) -> WorldResult<()> {
        let min_level = (budget_log2 + 3).max(5);

        while self.store.level(self.root) < min_level || !self.centered_in_quarter() {
            self.grow()?;
        }

        Ok(())
    }

    /// Whether every live cell lies inside the centered quarter-size block
    /// of the root. Checked through population counts alone.
    fn centered_in_quarter(&self) -> bool {
        let root = self.root;
        if self.store.population(root) == 0 {
            return true;
        }

        // Need great-grandchildren to name the centered quarter
        if self.store.level(root) < 5 {
            return false;
        }

        let [nw, ne, sw, se] = self.store.children(root);

        let a = self.store.children(self.store.children(nw)[3])[3];
        let b = self.store.children(self.store.children(ne)[2])[2];
        let c = self.store.children(self.store.children(sw)[1])[1];
        let d = self.store.children(self.store.children(se)[0])[0];

        let inner = self.store.population(a)
            + self.store.population(b)
            + self.store.population(c)
            + self.store.population(d);

        inner == self.store.population(root)
    }

    /// The live cells intersecting `bounds`, for rendering a viewport of an
    /// otherwise unbounded universe.
    ///
    /// Descends the tree pruning empty regions and regions disjoint from the
    /// window, so the cost scales with the window and the live area in it,
    /// not with the universe.
    pub fn cells_in(&self, bounds: &Aabb) -> HashSet<Point> {
        let mut out = HashSet::new();
        self.collect(self.root, self.x, self.y, bounds, &mut out);

        out
    }

    /// Every live cell in the universe
    pub fn cells(&self) -> HashSet<Point> {
        self.cells_in(&self.bounds())
    }

    /// Bounding box of the tracked region. Live cells always lie strictly
    /// inside it.
    pub fn bounds(&self) -> Aabb {
        let side = 1i64 << self.store.level(self.root);

        Aabb {
            min: Point::new(self.x, self.y),
            max: Point::new(
                self.x.saturating_add(side - 1),
                self.y.saturating_add(side - 1),
            ),
        }
    }

    fn collect(
        &self,
        id: NodeId,
        x: WorldOffset,
        y: WorldOffset,
        bounds: &Aabb,
        out: &mut HashSet<Point>,
    ) {
        let node = self.store.node(id);
        if node.population() == 0 {
            return;
        }

        let side = 1i64 << node.level();
        let region = Aabb {
            min: Point::new(x, y),
            max: Point::new(x.saturating_add(side - 1), y.saturating_add(side - 1)),
        };
        if !bounds.intersects(&region) {
            return;
        }

        match node.data {
            NodeData::Leaf(bits) => {
                for row in 0..4 {
                    for col in 0..4 {
                        if bits >> (row * 4 + col) & 1 == 1 {
                            let p = Point::new(x + col, y + row);

                            if bounds.contains(p) {
                                out.insert(p);
                            }
                        }
                    }
                }
            }
            NodeData::Inner { nw, ne, sw, se } => {
                let half = side / 2;

                self.collect(nw, x, y, bounds, out);
                self.collect(ne, x + half, y, bounds, out);
                self.collect(sw, x, y + half, bounds, out);
                self.collect(se, x + half, y + half, bounds, out);
            }
        }
    }
}

/// North-west corner of a side-length `side` square centering a pattern of
/// extent `w` that starts at `min`.
///
/// Both corners of the square must be representable: the south-east corner
/// `corner + side - 1` is range-checked here, and `try_into` rejects a
/// north-west corner below the offset range.
fn center_offset(min: WorldOffset, side: i128, w: i128) -> WorldResult<WorldOffset> {
    let corner = min as i128 - (side - w) / 2;

    if corner + side - 1 > WorldOffset::MAX as i128 {
        return Err(WorldError::OffsetOverflow);
    }

    corner.try_into().map_err(|_| WorldError::OffsetOverflow)
}

/// Recursively partition `points` into quadrants and canonicalize bottom-up.
/// (`x`, `y`) is the north-west corner of the region at this `level`.
fn build(store: &mut Store, points: &mut [Point], x: WorldOffset, y: WorldOffset, level: u8) -> NodeId {
    if points.is_empty() {
        return store.empty(level);
    }

    if level == LEAF_LEVEL {
        let mut bits = 0u16;
        for p in points.iter() {
            bits |= 1 << ((p.y - y) * 4 + (p.x - x));
        }

        return store.leaf(bits);
    }

    let half = 1i64 << (level - 1);
    let (mx, my) = (x + half, y + half);

    let split = partition_in_place(points, |p| p.y < my);
    let split_n = partition_in_place(&mut points[..split], |p| p.x < mx);
    let split_s = partition_in_place(&mut points[split..], |p| p.x < mx) + split;

    let (north, south) = points.split_at_mut(split);
    let (pnw, pne) = north.split_at_mut(split_n);
    let (psw, pse) = south.split_at_mut(split_s - split);

    let nw = build(store, pnw, x, y, level - 1);
    let ne = build(store, pne, mx, y, level - 1);
    let sw = build(store, psw, x, my, level - 1);
    let se = build(store, pse, mx, my, level - 1);

    store.join(nw, ne, sw, se)
}
