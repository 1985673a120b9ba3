//! Transport hallway linking: pairs transport-staircase cells and cross-wires
//! their entrance metadata.

use crate::types::{GridPos, RegenError};
use crate::world::{EntranceKind, RoomObject};

use super::model::{CellKind, DungeonShape, RegenState};
use super::seed::shuffle;

pub(super) fn link_transports(
    shape: &DungeonShape,
    state: &mut RegenState,
    dungeon: &str,
) -> Result<(), RegenError> {
    let mut transport_cells: Vec<GridPos> = shape
        .bound_positions()
        .into_iter()
        .filter(|pos| {
            shape.cell(*pos).is_some_and(|cell| cell.kind == CellKind::TransportStaircase)
        })
        .collect();

    shuffle(&mut state.streams.shape, &mut transport_cells);
    if transport_cells.len() % 2 != 0 {
        return Err(RegenError::OddTransportCount { dungeon: dungeon.to_string() });
    }

    for pair in transport_cells.chunks_exact(2) {
        wire_transport(shape, state, pair[0], pair[1]);
        wire_transport(shape, state, pair[1], pair[0]);
    }
    Ok(())
}

fn wire_transport(shape: &DungeonShape, state: &mut RegenState, from: GridPos, to: GridPos) {
    let key = shape.bound_key(from).expect("transport cell is bound");
    let room = &mut state.rooms[key];
    let index = room.entrance_index().expect("transport cell holds a staircase room");
    room.objects[index] =
        RoomObject::Entrance { kind: EntranceKind::Transport, item: None, exit: Some(to) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regen::model::RegenFlags;
    use crate::types::{Direction, GridPos, LockType, OriginalRoomId, TileBehavior};
    use crate::world::{DungeonWorld, ROOM_COLUMNS, ROOM_ROWS, Room, TileGrid, WorldRegistry};

    fn stair_grid() -> TileGrid {
        let mut behaviors = vec![TileBehavior::Wall; ROOM_COLUMNS * ROOM_ROWS];
        for y in 1..ROOM_ROWS - 1 {
            for x in 1..ROOM_COLUMNS - 1 {
                behaviors[y * ROOM_COLUMNS + x] = TileBehavior::GenericWalkable;
            }
        }
        behaviors[2 * ROOM_COLUMNS + 3] = TileBehavior::Stairs;
        TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors)
    }

    fn transport_room(id: u16) -> Room {
        let mut room = Room::new(OriginalRoomId(id), stair_grid());
        room.doors.set(Direction::Up, LockType::Open);
        room.objects.push(RoomObject::Entrance {
            kind: EntranceKind::Transport,
            item: None,
            exit: None,
        });
        room
    }

    fn state_with_rooms(rooms: Vec<Room>) -> RegenState {
        let mut world = DungeonWorld::new("transport-test".to_string(), 1, 8, 8);
        for (index, room) in rooms.into_iter().enumerate() {
            world.insert_room(room, GridPos { y: 0, x: index as i32 });
        }
        let mut registry = WorldRegistry::new();
        registry.install(world);
        RegenState::new(registry.take_worlds(), &RegenFlags::default(), 7)
    }

    fn bind(shape: &mut DungeonShape, state: &RegenState, pool_slot: usize, pos: GridPos) {
        let cell = shape.cell_mut(pos).unwrap();
        cell.kind = CellKind::TransportStaircase;
        cell.room = Some(state.room_pool[pool_slot]);
    }

    #[test]
    fn pairs_link_each_other_bidirectionally() {
        let mut state = state_with_rooms(vec![transport_room(0), transport_room(1)]);
        let mut shape = DungeonShape::new();
        let left = GridPos { y: 2, x: 1 };
        let right = GridPos { y: 5, x: 6 };
        bind(&mut shape, &state, 0, left);
        bind(&mut shape, &state, 1, right);

        link_transports(&shape, &mut state, "transport-test").unwrap();

        let left_room = &state.rooms[shape.bound_key(left).unwrap()];
        let right_room = &state.rooms[shape.bound_key(right).unwrap()];
        assert_eq!(left_room.transport_exit(), Some(right));
        assert_eq!(right_room.transport_exit(), Some(left));
    }

    #[test]
    fn unpaired_leftover_cell_is_fatal() {
        let mut state = state_with_rooms(vec![transport_room(0)]);
        let mut shape = DungeonShape::new();
        bind(&mut shape, &state, 0, GridPos { y: 2, x: 1 });

        assert_eq!(
            link_transports(&shape, &mut state, "transport-test"),
            Err(RegenError::OddTransportCount { dungeon: "transport-test".to_string() })
        );
    }
}
