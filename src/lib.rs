pub mod aabb;
pub mod node;
pub mod point;
pub mod rule_set;
pub mod store;
pub mod world;

mod engine;
mod util;

/// Signed cell coordinate in the world.
pub type WorldOffset = i64;

pub use crate::aabb::Aabb;
pub use crate::point::Point;
pub use crate::world::World;
pub use crate::world::WorldError;
pub use crate::world::step;
