//! Hand-authored demo catalog standing in for the game's static room and
//! dungeon definitions. Two dungeons: a 20-room ruin and a 14-room flooded
//! crypt whose water rooms only cross with the ladder.

use crate::types::{
    Direction, GridPos, ItemKind, LockType, MonsterKind, OriginalRoomId, TileBehavior,
};
use crate::world::{
    DungeonWorld, EntranceKind, ROOM_COLUMNS, ROOM_ROWS, Room, RoomObject, TileGrid,
    WorldRegistry,
};

pub const SUNKEN_RUINS: &str = "sunken-ruins";
pub const FLOODED_CRYPT: &str = "flooded-crypt";

/// Builds the full demo registry. Cheap and pure; the documented recovery
/// after a failed run is to rebuild this and reroll.
pub fn demo_registry() -> WorldRegistry {
    let mut registry = WorldRegistry::new();
    registry.install(sunken_ruins());
    registry.install(flooded_crypt());
    registry
}

const OPEN_HALL: [&str; ROOM_ROWS] = [
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

const SAND_GARDEN: [&str; ROOM_ROWS] = [
    "############",
    "#..........#",
    "#...%%%....#",
    "#...%%%....#",
    "#...%%%....#",
    "#..........#",
    "############",
];

const STAIR_CHAMBER: [&str; ROOM_ROWS] = [
    "############",
    "#..........#",
    "#..>.......#",
    "#..........#",
    "#..........#",
    "#..........#",
    "############",
];

const SLOW_STAIR_HALL: [&str; ROOM_ROWS] = [
    "############",
    "#..........#",
    "#..........#",
    "#..........#",
    "#.......^..#",
    "#..........#",
    "############",
];

const PILLAR_HALL: [&str; ROOM_ROWS] = [
    "############",
    "#..........#",
    "#..##..##..#",
    "#..........#",
    "#..##..##..#",
    "#..........#",
    "############",
];

const DOORED_HALL: [&str; ROOM_ROWS] = [
    "######+#####",
    "#..........#",
    "#..........#",
    "+..........+",
    "#..........#",
    "#..........#",
    "######+#####",
];

fn parse_tiles(rows: [&str; ROOM_ROWS]) -> TileGrid {
    let mut behaviors = Vec::with_capacity(ROOM_COLUMNS * ROOM_ROWS);
    for row in rows {
        assert_eq!(row.len(), ROOM_COLUMNS, "template row width mismatch");
        for glyph in row.chars() {
            behaviors.push(match glyph {
                '#' => TileBehavior::Wall,
                '.' => TileBehavior::GenericWalkable,
                '~' => TileBehavior::Water,
                '%' => TileBehavior::Sand,
                '+' => TileBehavior::Door,
                '>' => TileBehavior::Stairs,
                '^' => TileBehavior::SlowStairs,
                _ => unreachable!("unknown tile glyph {glyph}"),
            });
        }
    }
    TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors)
}

fn room(id: u16, template: [&str; ROOM_ROWS]) -> Room {
    Room::new(OriginalRoomId(id), parse_tiles(template))
}

fn cellar_room(id: u16, item: ItemKind) -> Room {
    let mut cellar = room(id, STAIR_CHAMBER);
    cellar.objects.push(RoomObject::Entrance {
        kind: EntranceKind::Cellar,
        item: Some(item),
        exit: None,
    });
    cellar
}

fn transport_room(id: u16, exit: GridPos) -> Room {
    let mut hallway = room(id, STAIR_CHAMBER);
    hallway.objects.push(RoomObject::Entrance {
        kind: EntranceKind::Transport,
        item: None,
        exit: Some(exit),
    });
    hallway
}

fn floor_item_room(id: u16, template: [&str; ROOM_ROWS], item: ItemKind) -> Room {
    let mut holder = room(id, template);
    holder.objects.push(RoomObject::FloorItem { item, persistent: true, announced: true });
    holder
}

fn sunken_ruins() -> DungeonWorld {
    let mut rooms = vec![
        room(100, OPEN_HALL),
        cellar_room(101, ItemKind::Bow),
        cellar_room(102, ItemKind::Raft),
        cellar_room(103, ItemKind::Boomerang),
        transport_room(104, GridPos { y: 1, x: 0 }),
        transport_room(105, GridPos { y: 0, x: 4 }),
        floor_item_room(106, PILLAR_HALL, ItemKind::HeartContainer),
        floor_item_room(107, OPEN_HALL, ItemKind::SmallKey),
        room(108, WATER_CHANNEL),
        room(109, OPEN_HALL),
        room(110, WATER_CHANNEL),
        room(111, SAND_GARDEN),
        room(112, PILLAR_HALL),
        room(113, DOORED_HALL),
        room(114, OPEN_HALL),
        room(115, OPEN_HALL),
        room(116, SLOW_STAIR_HALL),
        room(117, OPEN_HALL),
        room(118, PILLAR_HALL),
        room(119, OPEN_HALL),
    ];

    rooms[0].is_entrance = true;
    rooms[8].monsters = vec![MonsterKind::Bat, MonsterKind::Bat];
    rooms[9].monsters =
        vec![MonsterKind::Skeleton, MonsterKind::Skeleton, MonsterKind::Skeleton];
    rooms[10].monsters = vec![MonsterKind::Slime, MonsterKind::Slime];
    rooms[11].monsters = vec![MonsterKind::Bat, MonsterKind::Slime];
    rooms[12].monsters = vec![MonsterKind::BladeTrap, MonsterKind::BladeTrap];
    rooms[13].monsters = vec![MonsterKind::ArmoredGuard];
    rooms[14].monsters =
        vec![MonsterKind::Skeleton, MonsterKind::Skeleton, MonsterKind::ArmoredGuard];
    rooms[14].clear_opens_shutters = true;
    rooms[15].monsters = vec![MonsterKind::Slime];
    rooms[15].objects.push(RoomObject::PushBlock { opens_shutters: true });
    rooms[16].monsters = vec![MonsterKind::Bat];
    rooms[18].monsters = vec![MonsterKind::Skeleton, MonsterKind::Bat];
    rooms[19].monsters = vec![MonsterKind::Slime, MonsterKind::Slime, MonsterKind::Slime];

    let door_rolls: [(usize, Direction, LockType); 20] = [
        (0, Direction::Down, LockType::Open),
        (1, Direction::Up, LockType::Open),
        (1, Direction::Down, LockType::Open),
        (2, Direction::Left, LockType::Open),
        (2, Direction::Right, LockType::Open),
        (3, Direction::Up, LockType::Open),
        (4, Direction::Down, LockType::Open),
        (5, Direction::Up, LockType::Open),
        (6, Direction::Left, LockType::Open),
        (7, Direction::Right, LockType::Open),
        (8, Direction::Up, LockType::Key),
        (9, Direction::Down, LockType::Key),
        (10, Direction::Left, LockType::Key),
        (11, Direction::Right, LockType::Key),
        (12, Direction::Up, LockType::Bombable),
        (13, Direction::Down, LockType::Bombable),
        (14, Direction::Up, LockType::Shutter),
        (14, Direction::Down, LockType::Shutter),
        (15, Direction::Left, LockType::Shutter),
        (16, Direction::Right, LockType::FalseWall),
    ];
    for (index, direction, lock) in door_rolls {
        rooms[index].doors.set(direction, lock);
    }

    let mut world = DungeonWorld::new(SUNKEN_RUINS.to_string(), 1, 8, 8);
    for (index, fitted) in rooms.into_iter().enumerate() {
        world.insert_room(fitted, GridPos { y: (index / 5) as i32, x: (index % 5) as i32 });
    }
    world
}

fn flooded_crypt() -> DungeonWorld {
    let mut rooms = vec![
        room(200, OPEN_HALL),
        transport_room(201, GridPos { y: 0, x: 2 }),
        transport_room(202, GridPos { y: 0, x: 1 }),
        cellar_room(203, ItemKind::SilverArrows),
        floor_item_room(204, PILLAR_HALL, ItemKind::BombPack),
        room(205, WATER_CHANNEL),
        room(206, WATER_CHANNEL),
        room(207, WATER_CHANNEL),
        room(208, OPEN_HALL),
        room(209, OPEN_HALL),
        room(210, SAND_GARDEN),
        room(211, SLOW_STAIR_HALL),
        room(212, PILLAR_HALL),
        room(213, DOORED_HALL),
    ];

    rooms[0].is_entrance = true;
    rooms[5].monsters = vec![MonsterKind::Bat, MonsterKind::Bat, MonsterKind::Bat];
    rooms[6].monsters = vec![MonsterKind::Slime];
    rooms[7].monsters = vec![MonsterKind::Skeleton, MonsterKind::Skeleton];
    rooms[7].clear_opens_shutters = true;
    rooms[8].monsters = vec![MonsterKind::ArmoredGuard, MonsterKind::Bat];
    rooms[10].monsters = vec![MonsterKind::BladeTrap];
    rooms[12].monsters = vec![MonsterKind::Skeleton];

    let door_rolls: [(usize, Direction, LockType); 10] = [
        (0, Direction::Down, LockType::Open),
        (1, Direction::Up, LockType::Open),
        (2, Direction::Down, LockType::Open),
        (3, Direction::Left, LockType::Open),
        (4, Direction::Right, LockType::Open),
        (5, Direction::Up, LockType::Key),
        (6, Direction::Down, LockType::Key),
        (7, Direction::Up, LockType::Shutter),
        (8, Direction::Left, LockType::Bombable),
        (9, Direction::Right, LockType::Open),
    ];
    for (index, direction, lock) in door_rolls {
        rooms[index].doors.set(direction, lock);
    }

    let mut world = DungeonWorld::new(FLOODED_CRYPT.to_string(), 2, 8, 8);
    for (index, fitted) in rooms.into_iter().enumerate() {
        world.insert_room(fitted, GridPos { y: (index / 5) as i32, x: (index % 5) as i32 });
    }
    world
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regen::{DungeonStats, RequirementsCache, RoutePoint};
    use crate::types::DirectionSet;

    #[test]
    fn ruins_statistics_match_the_authored_tally() {
        let registry = demo_registry();
        let stats = DungeonStats::create(registry.get(SUNKEN_RUINS).unwrap()).unwrap();

        assert_eq!(stats.item_staircase_rooms, 3);
        assert_eq!(stats.floor_drop_rooms, 2);
        assert_eq!(stats.transport_pairs, 1);
        assert_eq!(stats.door_count(LockType::Open), 10);
        assert_eq!(stats.door_count(LockType::Key), 4);
        assert_eq!(stats.door_count(LockType::Bombable), 2);
        assert_eq!(stats.door_count(LockType::FalseWall), 1);
        assert_eq!(stats.door_count(LockType::Shutter), 3);
        assert_eq!(stats.total_doors(), 20);
    }

    #[test]
    fn crypt_statistics_match_the_authored_tally() {
        let registry = demo_registry();
        let stats = DungeonStats::create(registry.get(FLOODED_CRYPT).unwrap()).unwrap();

        assert_eq!(stats.item_staircase_rooms, 1);
        assert_eq!(stats.floor_drop_rooms, 1);
        assert_eq!(stats.transport_pairs, 1);
    }

    #[test]
    fn every_demo_room_is_usable_on_all_four_sides() {
        // The fitter matches usable-direction supersets; catalog rooms are
        // authored to satisfy any cell so no seed can strand the pool.
        let registry = demo_registry();
        let mut cache = RequirementsCache::new();
        for name in registry.names() {
            let world = registry.get(&name).unwrap();
            for pos in world.occupied_positions() {
                let room = world.room_at(pos).unwrap();
                let requirements = cache.analyze(room).unwrap();
                assert_eq!(
                    requirements.usable_doors,
                    DirectionSet::all(),
                    "room {:?} in {name}",
                    room.original_id
                );
            }
        }
    }

    #[test]
    fn every_demo_room_pair_connects_internally() {
        let registry = demo_registry();
        let mut cache = RequirementsCache::new();
        for name in registry.names() {
            let world = registry.get(&name).unwrap();
            for pos in world.occupied_positions() {
                let room = world.room_at(pos).unwrap();
                let requirements = cache.analyze(room).unwrap().clone();
                for first in Direction::ALL {
                    for second in Direction::ALL {
                        assert!(
                            requirements.route_open(
                                RoutePoint::Door(first),
                                RoutePoint::Door(second),
                                true
                            ),
                            "room {:?} in {name} severs {first:?} from {second:?}",
                            room.original_id
                        );
                    }
                }
            }
        }
    }
}
