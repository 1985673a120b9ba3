//! Item redistribution: pops the shuffled per-dungeon pool into fitted
//! item-staircase and floor-drop cells.

use crate::types::{GridPos, RegenError};
use crate::world::{EntranceKind, RoomObject};

use super::model::{CellKind, DungeonShape, RegenState};

pub(super) fn place_items(
    shape: &DungeonShape,
    state: &mut RegenState,
    dungeon: &str,
    level: u8,
) -> Result<(), RegenError> {
    let mut pool = state.item_pools.remove(&level).unwrap_or_default();
    let pinned = state.pinned_items.remove(&level).unwrap_or_default();
    let mut pinned_iter = pinned.into_iter();

    // Every original floor drop already went into the pool; clear the stale
    // objects so a room rebound to a plain cell does not duplicate its item.
    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        state.rooms[key].objects.retain(|object| !object.is_floor_item());
    }

    for pos in cells_of_kind(shape, CellKind::ItemStaircase) {
        let Some(item) = pool.pop() else {
            return Err(RegenError::ItemPoolExhausted { dungeon: dungeon.to_string() });
        };
        let key = shape.bound_key(pos).expect("item staircase cell is bound");
        let room = &mut state.rooms[key];
        let index = room.entrance_index().expect("staircase cell holds a staircase room");
        room.objects[index] =
            RoomObject::Entrance { kind: EntranceKind::Cellar, item: Some(item), exit: None };
    }

    // Guaranteed items take the first floor-drop cells, bypassing the pool.
    for pos in cells_of_kind(shape, CellKind::FloorDrop) {
        let item = match pinned_iter.next() {
            Some(item) => item,
            None => match pool.pop() {
                Some(item) => item,
                None => {
                    return Err(RegenError::ItemPoolExhausted { dungeon: dungeon.to_string() });
                }
            },
        };

        let key = shape.bound_key(pos).expect("floor drop cell is bound");
        let room = &mut state.rooms[key];
        let drop = RoomObject::FloorItem { item, persistent: true, announced: true };
        match room.floor_item_index() {
            Some(index) => room.objects[index] = drop,
            None => room.objects.push(drop),
        }
    }

    // The pool must come out empty: items popped equal item-bearing cells
    // exactly, and a leftover means the shape and statistics disagree.
    let leftover = pool.len() + pinned_iter.count();
    if leftover > 0 {
        return Err(RegenError::ItemPoolRemainder { dungeon: dungeon.to_string(), leftover });
    }
    Ok(())
}

fn cells_of_kind(shape: &DungeonShape, kind: CellKind) -> Vec<GridPos> {
    shape
        .bound_positions()
        .into_iter()
        .filter(|pos| shape.cell(*pos).is_some_and(|cell| cell.kind == kind))
        .collect()
}
