//! Per-room requirement analysis: which sides can hold a door, which door
//! pairs connect internally, and what item a route depends on.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use bitflags::bitflags;

use crate::types::{Direction, DirectionSet, OriginalRoomId, Pos, RegenError, TileBehavior};
use crate::world::{Room, TileGrid};

bitflags! {
    /// Items a route through a room depends on. Only the ladder today; the
    /// mask leaves room for more gating items.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct PathItems: u8 {
        const LADDER = 1;
    }
}

/// Endpoint of an internal route: a door seat, or the staircase tile acting
/// as the transport pseudo-direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoutePoint {
    Door(Direction),
    Stairs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomRequirements {
    pub usable_doors: DirectionSet,
    /// Keyed by the normalized unordered endpoint pair. Absent pair means no
    /// internal route exists at all.
    pub paths: BTreeMap<(RoutePoint, RoutePoint), PathItems>,
    pub has_staircase: bool,
    pub has_floor_drop: bool,
    pub has_push_block: bool,
    pub is_entrance: bool,
    /// Object indices held for later metadata rewrites.
    pub entrance_object: Option<usize>,
    pub push_block_object: Option<usize>,
}

impl RoomRequirements {
    /// Whether the room can be crossed between two endpoints. Standing at a
    /// point always "reaches" that same point.
    pub fn route_open(&self, from: RoutePoint, to: RoutePoint, allow_ladder: bool) -> bool {
        if from == to {
            return true;
        }
        match self.paths.get(&ordered_pair(from, to)) {
            Some(items) => allow_ladder || !items.contains(PathItems::LADDER),
            None => false,
        }
    }
}

fn ordered_pair(a: RoutePoint, b: RoutePoint) -> (RoutePoint, RoutePoint) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Run-owned cache keyed by stable room identity. The solver asks once per
/// door per pass; recomputing per query would be quadratic in dungeon size.
#[derive(Debug, Default)]
pub struct RequirementsCache {
    entries: BTreeMap<OriginalRoomId, RoomRequirements>,
}

impl RequirementsCache {
    pub fn new() -> RequirementsCache {
        RequirementsCache { entries: BTreeMap::new() }
    }

    /// Analyzes on first sight, then serves the cached descriptor.
    pub fn analyze(&mut self, room: &Room) -> Result<&RoomRequirements, RegenError> {
        if !self.entries.contains_key(&room.original_id) {
            let requirements = analyze_room(room)?;
            self.entries.insert(room.original_id, requirements);
        }
        Ok(&self.entries[&room.original_id])
    }

    pub fn get(&self, id: OriginalRoomId) -> Option<&RoomRequirements> {
        self.entries.get(&id)
    }
}

fn analyze_room(room: &Room) -> Result<RoomRequirements, RegenError> {
    let mut usable_doors = DirectionSet::empty();
    for direction in Direction::ALL {
        let probe = room.tiles.door_probe(direction);
        if matches!(
            room.tiles.behavior(probe.x, probe.y),
            TileBehavior::GenericWalkable | TileBehavior::Sand
        ) {
            usable_doors |= direction.as_set();
        }
    }
    if room.blocks_upper_door() {
        usable_doors.remove(DirectionSet::UP);
    }

    let mut route_points: Vec<(RoutePoint, Pos)> = Direction::ALL
        .into_iter()
        .filter(|direction| usable_doors.contains(direction.as_set()))
        .map(|direction| (RoutePoint::Door(direction), room.tiles.door_probe(direction)))
        .collect();
    if let Some(stairs) = room.tiles.stairs_pos() {
        route_points.push((RoutePoint::Stairs, stairs));
    }

    let mut paths = BTreeMap::new();
    for first in 0..route_points.len() {
        for second in (first + 1)..route_points.len() {
            let (point_a, start) = route_points[first];
            let (point_b, target) = route_points[second];
            if let Some(items) = find_route(&room.tiles, start, target) {
                paths.insert(ordered_pair(point_a, point_b), items);
            }
        }
    }

    if room.doors.count() > 0 && usable_doors.is_empty() && paths.is_empty() {
        // Single-exit prize rooms legitimately dead-end onto their loot.
        let prize_room = room.doors.count() == 1 && room.holds_item();
        if !prize_room {
            return Err(RegenError::IsolatedRoom { room: room.original_id });
        }
    }

    Ok(RoomRequirements {
        usable_doors,
        paths,
        has_staircase: room.entrance_index().is_some(),
        has_floor_drop: room.tiles.has_open_floor(),
        has_push_block: room.push_block_index().is_some(),
        is_entrance: room.is_entrance,
        entrance_object: room.entrance_index(),
        push_block_object: room.push_block_index(),
    })
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct SearchNode {
    distance_to_target: u32,
    crossed_water: bool,
    pos: Pos,
}

/// Best-first search between two tiles, expanding in single-tile steps
/// ordered by Manhattan distance to the target. Water extends a path only if
/// none has been crossed yet (the ladder bridges exactly one water tile) and
/// marks the path ladder-requiring. Returns at the first dry route; otherwise
/// reports the recorded ladder route, or `None` when the pair is severed.
fn find_route(tiles: &TileGrid, start: Pos, target: Pos) -> Option<PathItems> {
    let mut open = BinaryHeap::new();
    let mut seen = BTreeSet::new();
    let mut ladder_route_found = false;

    open.push(Reverse(SearchNode {
        distance_to_target: manhattan(start, target),
        crossed_water: false,
        pos: start,
    }));

    while let Some(Reverse(node)) = open.pop() {
        if !seen.insert((node.pos, node.crossed_water)) {
            continue;
        }
        if node.pos == target {
            if !node.crossed_water {
                return Some(PathItems::empty());
            }
            ladder_route_found = true;
            continue;
        }

        for direction in Direction::ALL {
            let (dy, dx) = direction.offset();
            let next = Pos { y: node.pos.y + dy, x: node.pos.x + dx };
            let crossed_water = match tiles.behavior(next.x, next.y) {
                TileBehavior::Wall => continue,
                TileBehavior::Water => {
                    if node.crossed_water {
                        continue;
                    }
                    true
                }
                _ => node.crossed_water,
            };
            if seen.contains(&(next, crossed_water)) {
                continue;
            }
            open.push(Reverse(SearchNode {
                distance_to_target: manhattan(next, target),
                crossed_water,
                pos: next,
            }));
        }
    }

    if ladder_route_found { Some(PathItems::LADDER) } else { None }
}

fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ItemKind, LockType, MonsterKind};
    use crate::world::{EntranceKind, ROOM_COLUMNS, ROOM_ROWS, Room, RoomObject};

    fn grid_from(rows: [&str; ROOM_ROWS]) -> TileGrid {
        let mut behaviors = Vec::with_capacity(ROOM_COLUMNS * ROOM_ROWS);
        for row in rows {
            assert_eq!(row.len(), ROOM_COLUMNS);
            for glyph in row.chars() {
                behaviors.push(match glyph {
                    '#' => TileBehavior::Wall,
                    '.' => TileBehavior::GenericWalkable,
                    '~' => TileBehavior::Water,
                    '%' => TileBehavior::Sand,
                    '>' => TileBehavior::Stairs,
                    _ => unreachable!("unknown test glyph {glyph}"),
                });
            }
        }
        TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors)
    }

    fn room_from(rows: [&str; ROOM_ROWS]) -> Room {
        Room::new(OriginalRoomId(1), grid_from(rows))
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

    #[test]
    fn open_room_is_usable_on_all_sides_with_free_paths() {
        let requirements = analyze_room(&room_from(OPEN_ROOM)).unwrap();
        assert_eq!(requirements.usable_doors, DirectionSet::all());
        for direction in [Direction::Down, Direction::Left, Direction::Right] {
            assert!(requirements.route_open(
                RoutePoint::Door(Direction::Up),
                RoutePoint::Door(direction),
                false
            ));
        }
    }

    #[test]
    fn walled_probe_disables_that_side() {
        let requirements = analyze_room(&room_from([
            "############",
            "#..........#",
            "#..........#",
            "##.........#",
            "#..........#",
            "#..........#",
            "############",
        ]))
        .unwrap();
        assert!(!requirements.usable_doors.contains(DirectionSet::LEFT));
        assert!(requirements.usable_doors.contains(DirectionSet::RIGHT));
    }

    #[test]
    fn single_water_column_marks_crossing_routes_ladder_only() {
        let requirements = analyze_room(&room_from([
            "############",
            "#....~.....#",
            "#....~.....#",
            "#....~.....#",
            "#....~.....#",
            "#....~.....#",
            "############",
        ]))
        .unwrap();

        let left_to_right =
            ordered_pair(RoutePoint::Door(Direction::Left), RoutePoint::Door(Direction::Right));
        assert_eq!(requirements.paths[&left_to_right], PathItems::LADDER);
        assert!(!requirements.route_open(
            RoutePoint::Door(Direction::Left),
            RoutePoint::Door(Direction::Right),
            false
        ));
        assert!(requirements.route_open(
            RoutePoint::Door(Direction::Left),
            RoutePoint::Door(Direction::Right),
            true
        ));

        // The up and down probes sit east of the channel; no water involved.
        assert!(requirements.route_open(
            RoutePoint::Door(Direction::Up),
            RoutePoint::Door(Direction::Down),
            false
        ));
    }

    #[test]
    fn double_water_column_severs_the_pair_entirely() {
        let requirements = analyze_room(&room_from([
            "############",
            "#....~~....#",
            "#....~~....#",
            "#....~~....#",
            "#....~~....#",
            "#....~~....#",
            "############",
        ]))
        .unwrap();
        assert!(!requirements.route_open(
            RoutePoint::Door(Direction::Left),
            RoutePoint::Door(Direction::Right),
            true
        ));
    }

    #[test]
    fn sand_probe_counts_as_usable() {
        let requirements = analyze_room(&room_from([
            "############",
            "#%%%%%%%%%%#",
            "#%%%%%%%%%%#",
            "#%%%%%%%%%%#",
            "#%%%%%%%%%%#",
            "#%%%%%%%%%%#",
            "############",
        ]))
        .unwrap();
        assert_eq!(requirements.usable_doors, DirectionSet::all());
    }

    #[test]
    fn dweller_blocks_the_upper_door_unconditionally() {
        let mut room = room_from(OPEN_ROOM);
        room.monsters = vec![MonsterKind::ElderDweller];
        let requirements = analyze_room(&room).unwrap();
        assert!(!requirements.usable_doors.contains(DirectionSet::UP));
        assert!(requirements.usable_doors.contains(DirectionSet::DOWN));
    }

    #[test]
    fn staircase_tile_yields_a_transport_route_point() {
        let mut room = room_from([
            "############",
            "#..........#",
            "#..>.......#",
            "#..........#",
            "#..........#",
            "#..........#",
            "############",
        ]);
        room.objects.push(RoomObject::Entrance {
            kind: EntranceKind::Cellar,
            item: Some(ItemKind::Bow),
            exit: None,
        });
        let requirements = analyze_room(&room).unwrap();
        assert!(requirements.has_staircase);
        assert!(requirements.route_open(
            RoutePoint::Door(Direction::Left),
            RoutePoint::Stairs,
            false
        ));
    }

    const SEALED_ROOM: [&str; ROOM_ROWS] = [
        "############",
        "#..#########",
        "#..#########",
        "############",
        "############",
        "############",
        "############",
    ];

    #[test]
    fn sealed_room_with_doors_is_a_construction_error() {
        let mut room = room_from(SEALED_ROOM);
        room.doors.set(Direction::Up, LockType::Open);
        room.doors.set(Direction::Down, LockType::Open);
        assert_eq!(
            analyze_room(&room),
            Err(RegenError::IsolatedRoom { room: OriginalRoomId(1) })
        );
    }

    #[test]
    fn single_exit_prize_room_is_exempt_from_the_isolation_check() {
        let mut room = room_from(SEALED_ROOM);
        room.doors.set(Direction::Up, LockType::Open);
        room.objects.push(RoomObject::FloorItem {
            item: ItemKind::HeartContainer,
            persistent: true,
            announced: true,
        });
        let requirements = analyze_room(&room).unwrap();
        assert!(requirements.usable_doors.is_empty());
    }

    #[test]
    fn cache_serves_the_first_analysis_for_a_stable_id() {
        let mut cache = RequirementsCache::new();
        let room = room_from(OPEN_ROOM);
        let first = cache.analyze(&room).unwrap().clone();

        // Same identity, different monsters: the cached descriptor stands.
        let mut altered = room_from(OPEN_ROOM);
        altered.monsters = vec![MonsterKind::ElderDweller];
        let second = cache.analyze(&altered).unwrap();
        assert_eq!(&first, second);
        assert!(second.usable_doors.contains(DirectionSet::UP));
    }
}
