//! In-memory world model: rooms, their interactable objects, dungeon worlds,
//! and the registry the game loop reads from.

use std::collections::BTreeMap;

use slotmap::SlotMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::types::{
    Direction, GridPos, ItemKind, LockType, MonsterKind, OriginalRoomId, Pos, RoomKey,
    TileBehavior,
};

pub const ROOM_COLUMNS: usize = 12;
pub const ROOM_ROWS: usize = 7;

/// A room's tile-behavior map. Read-only once authored; the regenerator never
/// edits tiles, only metadata around them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    pub width: usize,
    pub height: usize,
    behaviors: Vec<TileBehavior>,
}

impl TileGrid {
    pub fn new(width: usize, height: usize, behaviors: Vec<TileBehavior>) -> TileGrid {
        assert_eq!(behaviors.len(), width * height, "tile grid dimensions mismatch");
        TileGrid { width, height, behaviors }
    }

    pub fn behavior(&self, x: i32, y: i32) -> TileBehavior {
        if x < 0 || y < 0 {
            return TileBehavior::Wall;
        }
        let xu = x as usize;
        let yu = y as usize;
        if xu >= self.width || yu >= self.height {
            return TileBehavior::Wall;
        }
        self.behaviors[yu * self.width + xu]
    }

    /// The walkable tile directly in front of where a door on that side would
    /// sit. Doors seat mid-edge; the probe is one step inside the border wall.
    pub fn door_probe(&self, direction: Direction) -> Pos {
        let center_x = (self.width / 2) as i32;
        let center_y = (self.height / 2) as i32;
        match direction {
            Direction::Up => Pos { y: 1, x: center_x },
            Direction::Down => Pos { y: self.height as i32 - 2, x: center_x },
            Direction::Left => Pos { y: center_y, x: 1 },
            Direction::Right => Pos { y: center_y, x: self.width as i32 - 2 },
        }
    }

    /// First staircase tile in row-major order, if the room has one.
    pub fn stairs_pos(&self) -> Option<Pos> {
        for y in 0..self.height {
            for x in 0..self.width {
                if matches!(
                    self.behaviors[y * self.width + x],
                    TileBehavior::Stairs | TileBehavior::SlowStairs
                ) {
                    return Some(Pos { y: y as i32, x: x as i32 });
                }
            }
        }
        None
    }

    /// Whether the interior has at least one plain floor tile an item could
    /// drop onto.
    pub fn has_open_floor(&self) -> bool {
        for y in 1..self.height.saturating_sub(1) {
            for x in 1..self.width.saturating_sub(1) {
                if self.behaviors[y * self.width + x] == TileBehavior::GenericWalkable {
                    return true;
                }
            }
        }
        false
    }
}

/// Per-direction lock map, indexed in the fixed direction order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DoorMap {
    locks: [LockType; 4],
}

impl DoorMap {
    pub fn new() -> DoorMap {
        DoorMap { locks: [LockType::Wall; 4] }
    }

    pub fn get(&self, direction: Direction) -> LockType {
        self.locks[direction.index()]
    }

    pub fn set(&mut self, direction: Direction, lock: LockType) {
        self.locks[direction.index()] = lock;
    }

    pub fn reset(&mut self) {
        self.locks = [LockType::Wall; 4];
    }

    /// Number of non-wall entries.
    pub fn count(&self) -> usize {
        self.locks.iter().filter(|lock| **lock != LockType::Wall).count()
    }
}

impl Default for DoorMap {
    fn default() -> DoorMap {
        DoorMap::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntranceKind {
    /// Leads to a below-ground cellar holding one item.
    Cellar,
    /// Paired teleport to another room in the same dungeon.
    Transport,
}

/// Interactable object inside a room. Tagged variants inspected through the
/// capability queries below; nothing downcasts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoomObject {
    Entrance { kind: EntranceKind, item: Option<ItemKind>, exit: Option<GridPos> },
    FloorItem { item: ItemKind, persistent: bool, announced: bool },
    PushBlock { opens_shutters: bool },
}

impl RoomObject {
    pub fn is_entrance(&self) -> bool {
        matches!(self, RoomObject::Entrance { .. })
    }

    pub fn is_floor_item(&self) -> bool {
        matches!(self, RoomObject::FloorItem { .. })
    }

    pub fn is_push_block(&self) -> bool {
        matches!(self, RoomObject::PushBlock { .. })
    }
}

#[derive(Clone, Debug)]
pub struct Room {
    pub key: RoomKey,
    pub original_id: OriginalRoomId,
    pub tiles: TileGrid,
    pub objects: Vec<RoomObject>,
    pub monsters: Vec<MonsterKind>,
    pub doors: DoorMap,
    pub is_entrance: bool,
    /// Clearing the room of monsters opens its shutter doors.
    pub clear_opens_shutters: bool,
    pub level: u8,
    pub grid_pos: GridPos,
}

impl Room {
    pub fn new(original_id: OriginalRoomId, tiles: TileGrid) -> Room {
        Room {
            key: RoomKey::default(),
            original_id,
            tiles,
            objects: Vec::new(),
            monsters: Vec::new(),
            doors: DoorMap::new(),
            is_entrance: false,
            clear_opens_shutters: false,
            level: 0,
            grid_pos: GridPos { y: 0, x: 0 },
        }
    }

    pub fn entrance_index(&self) -> Option<usize> {
        self.objects.iter().position(RoomObject::is_entrance)
    }

    pub fn floor_item_index(&self) -> Option<usize> {
        self.objects.iter().position(RoomObject::is_floor_item)
    }

    pub fn push_block_index(&self) -> Option<usize> {
        self.objects.iter().position(RoomObject::is_push_block)
    }

    pub fn transport_exit(&self) -> Option<GridPos> {
        self.objects.iter().find_map(|object| match object {
            RoomObject::Entrance { kind: EntranceKind::Transport, exit, .. } => *exit,
            _ => None,
        })
    }

    pub fn holds_item(&self) -> bool {
        self.objects.iter().any(|object| match object {
            RoomObject::Entrance { item, .. } => item.is_some(),
            RoomObject::FloorItem { .. } => true,
            RoomObject::PushBlock { .. } => false,
        })
    }

    pub fn blocks_upper_door(&self) -> bool {
        self.monsters.iter().any(|monster| monster.blocks_upper_door())
    }
}

pub struct DungeonWorld {
    pub name: String,
    pub level: u8,
    pub columns: usize,
    pub rows: usize,
    layout: Vec<Option<RoomKey>>,
    pub rooms: SlotMap<RoomKey, Room>,
}

impl DungeonWorld {
    pub fn new(name: String, level: u8, columns: usize, rows: usize) -> DungeonWorld {
        DungeonWorld {
            name,
            level,
            columns,
            rows,
            layout: vec![None; columns * rows],
            rooms: SlotMap::with_key(),
        }
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.columns
            && (pos.y as usize) < self.rows
    }

    pub fn insert_room(&mut self, mut room: Room, pos: GridPos) -> RoomKey {
        assert!(self.in_bounds(pos), "room inserted outside the dungeon grid");
        room.grid_pos = pos;
        room.level = self.level;
        let key = self.rooms.insert(room);
        self.rooms[key].key = key;
        let index = (pos.y as usize) * self.columns + (pos.x as usize);
        self.layout[index] = Some(key);
        key
    }

    pub fn room_key_at(&self, pos: GridPos) -> Option<RoomKey> {
        if !self.in_bounds(pos) {
            return None;
        }
        self.layout[(pos.y as usize) * self.columns + (pos.x as usize)]
    }

    pub fn room_at(&self, pos: GridPos) -> Option<&Room> {
        self.room_key_at(pos).map(|key| &self.rooms[key])
    }

    /// Occupied grid positions in row-major order.
    pub fn occupied_positions(&self) -> Vec<GridPos> {
        let mut positions = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.columns {
                let pos = GridPos { y: y as i32, x: x as i32 };
                if self.room_key_at(pos).is_some() {
                    positions.push(pos);
                }
            }
        }
        positions
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn entrance_pos(&self) -> Option<GridPos> {
        self.occupied_positions()
            .into_iter()
            .find(|pos| self.room_at(*pos).is_some_and(|room| room.is_entrance))
    }

    /// Stable byte encoding of everything the regenerator is allowed to touch.
    /// Tile grids are omitted; they are immutable per original id.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend((self.name.len() as u32).to_le_bytes());
        bytes.extend(self.name.as_bytes());
        bytes.push(self.level);
        bytes.extend((self.columns as u32).to_le_bytes());
        bytes.extend((self.rows as u32).to_le_bytes());

        for pos in self.occupied_positions() {
            let room = self.room_at(pos).expect("occupied position resolves to a room");
            bytes.extend(pos.y.to_le_bytes());
            bytes.extend(pos.x.to_le_bytes());
            bytes.extend(room.original_id.0.to_le_bytes());
            for direction in Direction::ALL {
                bytes.push(lock_code(room.doors.get(direction)));
            }
            bytes.push(u8::from(room.is_entrance));
            bytes.push(u8::from(room.clear_opens_shutters));

            bytes.push(room.objects.len() as u8);
            for object in &room.objects {
                encode_object(&mut bytes, object);
            }

            bytes.push(room.monsters.len() as u8);
            for monster in &room.monsters {
                bytes.push(monster_code(*monster));
            }
        }
        bytes
    }

    pub fn snapshot_hash(&self) -> u64 {
        xxh3_64(&self.canonical_bytes())
    }
}

fn encode_object(bytes: &mut Vec<u8>, object: &RoomObject) {
    match object {
        RoomObject::Entrance { kind, item, exit } => {
            bytes.push(1);
            bytes.push(match kind {
                EntranceKind::Cellar => 0,
                EntranceKind::Transport => 1,
            });
            bytes.push(item.map_or(0, |item| item_code(item) + 1));
            match exit {
                Some(exit) => {
                    bytes.push(1);
                    bytes.extend(exit.y.to_le_bytes());
                    bytes.extend(exit.x.to_le_bytes());
                }
                None => bytes.push(0),
            }
        }
        RoomObject::FloorItem { item, persistent, announced } => {
            bytes.push(2);
            bytes.push(item_code(*item));
            bytes.push(u8::from(*persistent));
            bytes.push(u8::from(*announced));
        }
        RoomObject::PushBlock { opens_shutters } => {
            bytes.push(3);
            bytes.push(u8::from(*opens_shutters));
        }
    }
}

fn lock_code(lock: LockType) -> u8 {
    match lock {
        LockType::Wall => 0,
        LockType::Open => 1,
        LockType::Key => 2,
        LockType::Bombable => 3,
        LockType::FalseWall => 4,
        LockType::Shutter => 5,
    }
}

fn item_code(item: ItemKind) -> u8 {
    match item {
        ItemKind::Compass => 0,
        ItemKind::DungeonMap => 1,
        ItemKind::SmallKey => 2,
        ItemKind::BombPack => 3,
        ItemKind::Rupees => 4,
        ItemKind::HeartContainer => 5,
        ItemKind::Ladder => 6,
        ItemKind::Bow => 7,
        ItemKind::Raft => 8,
        ItemKind::Boomerang => 9,
        ItemKind::SilverArrows => 10,
    }
}

fn monster_code(monster: MonsterKind) -> u8 {
    match monster {
        MonsterKind::Bat => 0,
        MonsterKind::Skeleton => 1,
        MonsterKind::Slime => 2,
        MonsterKind::BladeTrap => 3,
        MonsterKind::ArmoredGuard => 4,
        MonsterKind::ElderDweller => 5,
    }
}

/// The live world registry the game loop resolves dungeons through. The
/// regenerator replaces entries wholesale by name.
pub struct WorldRegistry {
    worlds: BTreeMap<String, DungeonWorld>,
}

impl WorldRegistry {
    pub fn new() -> WorldRegistry {
        WorldRegistry { worlds: BTreeMap::new() }
    }

    pub fn install(&mut self, world: DungeonWorld) {
        self.worlds.insert(world.name.clone(), world);
    }

    pub fn get(&self, name: &str) -> Option<&DungeonWorld> {
        self.worlds.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.worlds.keys().cloned().collect()
    }

    /// Removes every world, ordered by dungeon level. The regeneration run
    /// consumes this and installs replacements one by one.
    pub fn take_worlds(&mut self) -> Vec<DungeonWorld> {
        let mut worlds: Vec<DungeonWorld> =
            std::mem::take(&mut self.worlds).into_values().collect();
        worlds.sort_by_key(|world| world.level);
        worlds
    }
}

impl Default for WorldRegistry {
    fn default() -> WorldRegistry {
        WorldRegistry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid() -> TileGrid {
        let mut behaviors = vec![TileBehavior::Wall; ROOM_COLUMNS * ROOM_ROWS];
        for y in 1..ROOM_ROWS - 1 {
            for x in 1..ROOM_COLUMNS - 1 {
                behaviors[y * ROOM_COLUMNS + x] = TileBehavior::GenericWalkable;
            }
        }
        TileGrid::new(ROOM_COLUMNS, ROOM_ROWS, behaviors)
    }

    #[test]
    fn insert_room_wires_key_position_and_level() {
        let mut world = DungeonWorld::new("test".to_string(), 3, 8, 8);
        let key = world.insert_room(Room::new(OriginalRoomId(7), open_grid()), GridPos {
            y: 2,
            x: 5,
        });

        let room = &world.rooms[key];
        assert_eq!(room.key, key);
        assert_eq!(room.level, 3);
        assert_eq!(room.grid_pos, GridPos { y: 2, x: 5 });
        assert_eq!(world.room_key_at(GridPos { y: 2, x: 5 }), Some(key));
    }

    #[test]
    fn canonical_bytes_react_to_door_changes() {
        let mut world = DungeonWorld::new("test".to_string(), 1, 8, 8);
        let key = world.insert_room(Room::new(OriginalRoomId(1), open_grid()), GridPos {
            y: 0,
            x: 0,
        });
        let before = world.canonical_bytes();

        world.rooms[key].doors.set(Direction::Left, LockType::Key);
        assert_ne!(before, world.canonical_bytes());
    }

    #[test]
    fn door_probes_sit_inside_the_border() {
        let grid = open_grid();
        for direction in Direction::ALL {
            let probe = grid.door_probe(direction);
            assert_eq!(grid.behavior(probe.x, probe.y), TileBehavior::GenericWalkable);
        }
    }
}
