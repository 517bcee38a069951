use core::fmt::Debug;

use crate::WorldOffset;

/// A cell position in world coordinates.
///
/// `x` grows eastward and `y` grows southward.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub x: WorldOffset,
    pub y: WorldOffset,
}

impl Point {
    pub const fn new(x: WorldOffset, y: WorldOffset) -> Self {
        Point { x, y }
    }
}

impl From<(WorldOffset, WorldOffset)> for Point {
    fn from((x, y): (WorldOffset, WorldOffset)) -> Self {
        Point { x, y }
    }
}

impl Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
