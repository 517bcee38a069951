use crate::WorldOffset;
use crate::point::Point;

/// Axis-Aligned Bounding Box over cell coordinates.
///
/// Both corners are inclusive, so a single cell is the box with `min == max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new()
    }
}

impl Aabb {
    /// The empty box. Adding any `Point` to it yields that point's unit box.
    pub fn new() -> Self {
        Aabb {
            min: Point::new(WorldOffset::MAX, WorldOffset::MAX),
            max: Point::new(WorldOffset::MIN, WorldOffset::MIN),
        }
    }

    /// Create an AABB from a list of `Point`s.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Point>,
    {
        let mut b = Aabb::new();

        for p in points {
            b.add(p);
        }

        b
    }

    /// A `w` by `h` cell window whose north-west corner is `origin`.
    pub fn window(origin: Point, w: u32, h: u32) -> Self {
        Aabb {
            min: origin,
            max: Point::new(
                origin.x.saturating_add(w as WorldOffset - 1),
                origin.y.saturating_add(h as WorldOffset - 1),
            ),
        }
    }

    /// Add a `Point` `p` to the current Axis-Aligned Bounding Box.
    pub fn add(&mut self, p: Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, p: Point) -> bool {
        self.min.x <= p.x && p.x <= self.max.x && self.min.y <= p.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// Side lengths as `(width, height)`. Computed in `i128` since an AABB
    /// may span most of the offset range.
    pub fn extent(&self) -> (i128, i128) {
        (
            self.max.x as i128 - self.min.x as i128 + 1,
            self.max.y as i128 - self.min.y as i128 + 1,
        )
    }
}
