//! Door assignment: a reachability-driven discovery walk decides which
//! adjacent cells get a door, then weighted lock types are written
//! symmetrically and shutter triggers reconciled.
//!
//! Runs last in the pipeline; it needs bound rooms, coordinates, and
//! transport links to judge reachability.

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;
use slotmap::SlotMap;

use crate::types::{Direction, GridPos, LockType, RegenError, RoomKey};
use crate::world::{Room, RoomObject};

use super::model::{DungeonShape, RegenState};
use super::requirements::{RequirementsCache, RoutePoint};
use super::seed::{percent_roll, shuffle};
use super::stats::DungeonStats;

/// Chance to door an adjacency whose far side is already reachable. Without
/// it every layout degenerates to a spanning tree.
pub(super) const BONUS_DOOR_CHANCE_PERCENT: u32 = 25;

pub(super) fn assign_doors(
    shape: &mut DungeonShape,
    state: &mut RegenState,
    stats: &DungeonStats,
    dungeon: &str,
) -> Result<(), RegenError> {
    let RegenState { streams, rooms, cache, .. } = state;
    let rng = &mut streams.doors;

    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        cache.analyze(&rooms[key])?;
    }

    discover_required_doors(shape, rooms, cache, rng);

    let reachable = reachable_cells(shape, rooms, cache);
    for pos in shape.bound_positions() {
        if !reachable.contains(&pos) {
            return Err(RegenError::UnsatisfiableShape { dungeon: dungeon.to_string() });
        }
    }

    assign_lock_types(shape, rooms, stats, rng);

    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        reconcile_shutters(&mut rooms[key]);
    }
    Ok(())
}

/// Depth-first walk over the cell grid from the entrance, neighbor order
/// re-shuffled at every step. An adjacency to a not-yet-reachable cell is
/// doored unconditionally; one to an already-reachable cell only on the
/// bonus roll. Masks are mirrored onto both cells immediately.
fn discover_required_doors(
    shape: &mut DungeonShape,
    rooms: &SlotMap<RoomKey, Room>,
    cache: &RequirementsCache,
    rng: &mut ChaCha8Rng,
) {
    let mut stack = vec![shape.entrance];
    let mut visited = BTreeSet::new();

    while let Some(pos) = stack.pop() {
        if !visited.insert(pos) {
            continue;
        }
        let mut directions = Direction::ALL;
        shuffle(rng, &mut directions);

        for direction in directions {
            let neighbor = pos.step(direction);
            if !shape.is_bound(neighbor) {
                continue;
            }
            let already_doored = shape
                .cell(pos)
                .expect("walk stays inside the grid")
                .required_doors
                .contains(direction.as_set());
            if !already_doored {
                if !reachable_cells(shape, rooms, cache).contains(&neighbor) {
                    add_door(shape, pos, direction);
                } else if percent_roll(rng) < BONUS_DOOR_CHANCE_PERCENT {
                    add_door(shape, pos, direction);
                }
            }
            stack.push(neighbor);
        }
    }
}

fn add_door(shape: &mut DungeonShape, pos: GridPos, direction: Direction) {
    shape.cell_mut(pos).expect("door owner is in bounds").required_doors |= direction.as_set();
    shape
        .cell_mut(pos.step(direction))
        .expect("door target is in bounds")
        .required_doors |= direction.opposite().as_set();
}

/// Cells reachable from the entrance through the current door masks and
/// transport links. States are (cell, entry point); leaving a room consults
/// its internal path table, with item gating ignored.
fn reachable_cells(
    shape: &DungeonShape,
    rooms: &SlotMap<RoomKey, Room>,
    cache: &RequirementsCache,
) -> BTreeSet<GridPos> {
    let mut reached = BTreeSet::new();
    let mut seen_states = BTreeSet::new();
    let mut open = vec![(shape.entrance, RoutePoint::Door(Direction::Down))];

    while let Some((pos, entry)) = open.pop() {
        if !seen_states.insert((pos, entry)) {
            continue;
        }
        reached.insert(pos);

        let Some(cell) = shape.cell(pos) else { continue };
        let Some(key) = cell.room else { continue };
        let room = &rooms[key];
        let Some(requirements) = cache.get(room.original_id) else { continue };

        for direction in Direction::ALL {
            if !cell.required_doors.contains(direction.as_set()) {
                continue;
            }
            let neighbor = pos.step(direction);
            if !shape.is_bound(neighbor) {
                continue;
            }
            if requirements.route_open(entry, RoutePoint::Door(direction), true) {
                open.push((neighbor, RoutePoint::Door(direction.opposite())));
            }
        }

        if let Some(exit) = room.transport_exit() {
            if shape.is_bound(exit) && requirements.route_open(entry, RoutePoint::Stairs, true) {
                open.push((exit, RoutePoint::Stairs));
            }
        }
    }
    reached
}

/// Lock pass: door maps reset to walls, the entrance keeps its fixed open
/// exterior door, and every required edge draws one weighted lock written
/// into both rooms. Edges are owned by the cell closer to the origin in
/// row-major order, so each is drawn exactly once.
fn assign_lock_types(
    shape: &DungeonShape,
    rooms: &mut SlotMap<RoomKey, Room>,
    stats: &DungeonStats,
    rng: &mut ChaCha8Rng,
) {
    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        rooms[key].doors.reset();
    }

    let entrance_key = shape.bound_key(shape.entrance).expect("entrance cell is bound");
    rooms[entrance_key].doors.set(Direction::Down, LockType::Open);

    for pos in shape.positions() {
        let Some(key) = shape.bound_key(pos) else { continue };
        let mask = shape.cell(pos).expect("position is in bounds").required_doors;

        for direction in [Direction::Down, Direction::Right] {
            if !mask.contains(direction.as_set()) {
                continue;
            }
            let Some(neighbor_key) = shape.bound_key(pos.step(direction)) else { continue };
            let lock = stats.random_door_type(rng);
            rooms[key].doors.set(direction, lock);
            rooms[neighbor_key].doors.set(direction.opposite(), lock);
        }
    }
}

/// A shutter door needs something that opens it. Rooms that rolled one keep
/// (or gain) a trigger; rooms that lost all shutters drop the push-block
/// role so stale triggers don't linger.
pub(super) fn reconcile_shutters(room: &mut Room) {
    let has_shutter =
        Direction::ALL.iter().any(|direction| room.doors.get(*direction) == LockType::Shutter);

    if has_shutter {
        let push_block_opens = room
            .objects
            .iter()
            .any(|object| matches!(object, RoomObject::PushBlock { opens_shutters: true }));
        if !push_block_opens && !room.clear_opens_shutters {
            room.clear_opens_shutters = true;
        }
    } else {
        for object in &mut room.objects {
            if let RoomObject::PushBlock { opens_shutters } = object {
                *opens_shutters = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OriginalRoomId, TileBehavior};
    use crate::world::{ROOM_COLUMNS, ROOM_ROWS, TileGrid};

    fn open_room() -> Room {
        let mut behaviors = vec![TileBehavior::Wall; ROOM_COLUMNS * ROOM_ROWS];
        for y in 1..ROOM_ROWS - 1 {
            for x in 1..ROOM_COLUMNS - 1 {
                behaviors[y * ROOM_COLUMNS + x] = TileBehavior::GenericWalkable;
            }
        }
        Room::new(OriginalRoomId(0), TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors))
    }

    #[test]
    fn shutter_room_without_trigger_gains_a_room_clear_trigger() {
        let mut room = open_room();
        room.doors.set(Direction::Left, LockType::Shutter);
        reconcile_shutters(&mut room);
        assert!(room.clear_opens_shutters);
    }

    #[test]
    fn shutter_room_with_push_block_keeps_it_and_stays_unclear_triggered() {
        let mut room = open_room();
        room.doors.set(Direction::Left, LockType::Shutter);
        room.objects.push(RoomObject::PushBlock { opens_shutters: true });
        reconcile_shutters(&mut room);
        assert!(!room.clear_opens_shutters);
    }

    #[test]
    fn shutterless_room_loses_the_push_block_role() {
        let mut room = open_room();
        room.doors.set(Direction::Left, LockType::Open);
        room.objects.push(RoomObject::PushBlock { opens_shutters: true });
        reconcile_shutters(&mut room);
        assert!(
            room.objects
                .iter()
                .all(|object| matches!(object, RoomObject::PushBlock { opens_shutters: false }))
        );
    }
}
