//! Post-build checks over a rebuilt world: full reachability through the
//! written door maps, and no key item locked behind itself.

use std::collections::BTreeSet;

use crate::types::{Direction, GridPos, ItemKind, LockType, RegenError};
use crate::world::{DungeonWorld, RoomObject};

use super::requirements::{RequirementsCache, RoutePoint};

/// Grid positions reachable from the dungeon entrance, traversing non-wall
/// doors and transport links and honoring each room's internal path table.
/// With `allow_ladder` off, ladder-requiring routes count as closed.
pub fn reachable_positions(
    world: &DungeonWorld,
    cache: &mut RequirementsCache,
    allow_ladder: bool,
) -> Result<BTreeSet<GridPos>, RegenError> {
    let Some(entrance) = world.entrance_pos() else {
        return Err(RegenError::UnsatisfiableShape { dungeon: world.name.clone() });
    };
    for pos in world.occupied_positions() {
        let room = world.room_at(pos).expect("occupied position resolves to a room");
        cache.analyze(room)?;
    }

    let mut reached = BTreeSet::new();
    let mut seen_states = BTreeSet::new();
    let mut open = vec![(entrance, RoutePoint::Door(Direction::Down))];

    while let Some((pos, entry)) = open.pop() {
        if !seen_states.insert((pos, entry)) {
            continue;
        }
        reached.insert(pos);

        let Some(room) = world.room_at(pos) else { continue };
        let Some(requirements) = cache.get(room.original_id) else { continue };

        for direction in Direction::ALL {
            if room.doors.get(direction) == LockType::Wall {
                continue;
            }
            let neighbor = pos.step(direction);
            if world.room_at(neighbor).is_none() {
                continue;
            }
            if requirements.route_open(entry, RoutePoint::Door(direction), allow_ladder) {
                open.push((neighbor, RoutePoint::Door(direction.opposite())));
            }
        }

        if let Some(exit) = room.transport_exit() {
            if world.room_at(exit).is_some()
                && requirements.route_open(entry, RoutePoint::Stairs, allow_ladder)
            {
                open.push((exit, RoutePoint::Stairs));
            }
        }
    }
    Ok(reached)
}

/// The completability contract: every room reachable, and the ladder never
/// findable only on the far side of a ladder-requiring route.
pub fn verify_world(world: &DungeonWorld, cache: &mut RequirementsCache) -> Result<(), RegenError> {
    let reachable = reachable_positions(world, cache, true)?;
    for pos in world.occupied_positions() {
        if !reachable.contains(&pos) {
            return Err(RegenError::UnsatisfiableShape { dungeon: world.name.clone() });
        }
    }

    let ladder_cells: Vec<GridPos> = world
        .occupied_positions()
        .into_iter()
        .filter(|pos| {
            world.room_at(*pos).is_some_and(|room| {
                room.objects.iter().any(|object| match object {
                    RoomObject::Entrance { item, .. } => *item == Some(ItemKind::Ladder),
                    RoomObject::FloorItem { item, .. } => *item == ItemKind::Ladder,
                    RoomObject::PushBlock { .. } => false,
                })
            })
        })
        .collect();

    if !ladder_cells.is_empty() {
        let ladder_free = reachable_positions(world, cache, false)?;
        for pos in ladder_cells {
            if !ladder_free.contains(&pos) {
                return Err(RegenError::LadderGated { dungeon: world.name.clone() });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OriginalRoomId, TileBehavior};
    use crate::world::{ROOM_COLUMNS, ROOM_ROWS, Room, TileGrid};

    fn grid_from(rows: [&str; ROOM_ROWS]) -> TileGrid {
        let mut behaviors = Vec::new();
        for row in rows {
            for glyph in row.chars() {
                behaviors.push(match glyph {
                    '#' => TileBehavior::Wall,
                    '.' => TileBehavior::GenericWalkable,
                    '~' => TileBehavior::Water,
                    _ => unreachable!("unknown test glyph {glyph}"),
                });
            }
        }
        TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors)
    }

    const OPEN_ROOM: [&str; ROOM_ROWS] = [
        "############",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "############",
    ];

    const WATER_CHANNEL: [&str; ROOM_ROWS] = [
        "############",
        "#....~.....#",
        "#....~.....#",
        "#....~.....#",
        "#....~.....#",
        "#....~.....#",
        "############",
    ];

    fn chain_world(far_item: ItemKind) -> DungeonWorld {
        // entrance -> water channel -> prize room, connected left to right;
        // the channel's left-right crossing needs the ladder.
        let mut world = DungeonWorld::new("verify-test".to_string(), 1, 8, 8);

        let mut entrance = Room::new(OriginalRoomId(0), grid_from(OPEN_ROOM));
        entrance.is_entrance = true;
        entrance.doors.set(Direction::Down, LockType::Open);
        entrance.doors.set(Direction::Right, LockType::Open);
        world.insert_room(entrance, GridPos { y: 7, x: 3 });

        let mut channel = Room::new(OriginalRoomId(1), grid_from(WATER_CHANNEL));
        channel.doors.set(Direction::Left, LockType::Open);
        channel.doors.set(Direction::Right, LockType::Open);
        world.insert_room(channel, GridPos { y: 7, x: 4 });

        let mut prize = Room::new(OriginalRoomId(2), grid_from(OPEN_ROOM));
        prize.doors.set(Direction::Left, LockType::Open);
        prize.objects.push(RoomObject::FloorItem {
            item: far_item,
            persistent: true,
            announced: true,
        });
        world.insert_room(prize, GridPos { y: 7, x: 5 });

        world
    }

    #[test]
    fn ladder_routes_count_with_ladder_allowed() {
        let world = chain_world(ItemKind::HeartContainer);
        let mut cache = RequirementsCache::new();

        let reachable = reachable_positions(&world, &mut cache, true).unwrap();
        assert_eq!(reachable.len(), 3);

        let ladder_free = reachable_positions(&world, &mut cache, false).unwrap();
        assert!(!ladder_free.contains(&GridPos { y: 7, x: 5 }));

        verify_world(&world, &mut cache).unwrap();
    }

    #[test]
    fn ladder_behind_its_own_route_is_rejected() {
        let world = chain_world(ItemKind::Ladder);
        let mut cache = RequirementsCache::new();
        assert_eq!(
            verify_world(&world, &mut cache),
            Err(RegenError::LadderGated { dungeon: "verify-test".to_string() })
        );
    }
}
