//! Dungeon regeneration domain split into coherent submodules.

pub mod model;
pub mod verify;

mod doors;
mod fitter;
mod generator;
mod items;
mod monsters;
mod requirements;
mod seed;
mod shape;
mod stats;
mod transport;

pub use generator::regenerate_worlds;
pub use model::{CellKind, DungeonShape, RegenFlags, ShapeCell};
pub use requirements::{PathItems, RequirementsCache, RoomRequirements, RoutePoint};
pub use stats::DungeonStats;
