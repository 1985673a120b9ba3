pub mod content;
pub mod regen;
pub mod types;
pub mod world;

pub use regen::{RegenFlags, regenerate_worlds};
pub use types::*;
pub use world::{
    DoorMap, DungeonWorld, EntranceKind, Room, RoomObject, TileGrid, WorldRegistry,
};
