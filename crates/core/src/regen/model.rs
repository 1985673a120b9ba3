//! Data model for a regeneration run: the abstract shape grid, the flags
//! object, and the per-run mutable state every pass consumes.

use std::collections::BTreeMap;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

use crate::types::{Direction, DirectionSet, GridPos, ItemKind, MonsterKind, RoomKey};
use crate::world::{DungeonWorld, Room, RoomObject};

use super::requirements::RequirementsCache;
use super::seed::{RngStreams, shuffle};

pub const SHAPE_COLUMNS: usize = 8;
pub const SHAPE_ROWS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CellKind {
    None,
    Normal,
    Entrance,
    FloorDrop,
    ItemStaircase,
    TransportStaircase,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeCell {
    pub kind: CellKind,
    /// Bound once by the fitter, never rebound.
    pub room: Option<RoomKey>,
    /// Filled in by the door solver.
    pub required_doors: DirectionSet,
}

impl ShapeCell {
    fn empty() -> ShapeCell {
        ShapeCell { kind: CellKind::None, room: None, required_doors: DirectionSet::empty() }
    }
}

pub struct DungeonShape {
    pub columns: usize,
    pub rows: usize,
    cells: Vec<ShapeCell>,
    /// Fixed walk origin: horizontal center of the bottom row.
    pub entrance: GridPos,
    pub room_count: usize,
}

impl DungeonShape {
    pub fn new() -> DungeonShape {
        DungeonShape {
            columns: SHAPE_COLUMNS,
            rows: SHAPE_ROWS,
            cells: vec![ShapeCell::empty(); SHAPE_COLUMNS * SHAPE_ROWS],
            entrance: GridPos { y: SHAPE_ROWS as i32 - 1, x: (SHAPE_COLUMNS / 2) as i32 },
            room_count: 0,
        }
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.columns
            && (pos.y as usize) < self.rows
    }

    fn index(&self, pos: GridPos) -> usize {
        (pos.y as usize) * self.columns + (pos.x as usize)
    }

    pub fn cell(&self, pos: GridPos) -> Option<&ShapeCell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&self.cells[self.index(pos)])
    }

    pub fn cell_mut(&mut self, pos: GridPos) -> Option<&mut ShapeCell> {
        if !self.in_bounds(pos) {
            return None;
        }
        let index = self.index(pos);
        Some(&mut self.cells[index])
    }

    pub fn is_claimed(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|cell| cell.kind != CellKind::None)
    }

    pub fn is_bound(&self, pos: GridPos) -> bool {
        self.cell(pos).is_some_and(|cell| cell.room.is_some())
    }

    pub fn bound_key(&self, pos: GridPos) -> Option<RoomKey> {
        self.cell(pos).and_then(|cell| cell.room)
    }

    /// Every grid position in row-major order; the fixed scan order all
    /// passes share.
    pub fn positions(&self) -> Vec<GridPos> {
        let mut positions = Vec::with_capacity(self.columns * self.rows);
        for y in 0..self.rows {
            for x in 0..self.columns {
                positions.push(GridPos { y: y as i32, x: x as i32 });
            }
        }
        positions
    }

    pub fn claimed_positions(&self) -> Vec<GridPos> {
        self.positions().into_iter().filter(|pos| self.is_claimed(*pos)).collect()
    }

    pub fn bound_positions(&self) -> Vec<GridPos> {
        self.positions().into_iter().filter(|pos| self.is_bound(*pos)).collect()
    }

    /// Directions a room bound at `pos` must be able to open a door toward:
    /// one per claimed neighbor, plus the exterior door below the entrance.
    pub fn required_directions(&self, pos: GridPos) -> DirectionSet {
        let mut required = DirectionSet::empty();
        for direction in Direction::ALL {
            if self.is_claimed(pos.step(direction)) {
                required |= direction.as_set();
            }
        }
        if self.cell(pos).is_some_and(|cell| cell.kind == CellKind::Entrance) {
            required |= DirectionSet::DOWN;
        }
        required
    }
}

impl Default for DungeonShape {
    fn default() -> DungeonShape {
        DungeonShape::new()
    }
}

/// Player-facing randomization toggles. Serializable so front ends can persist
/// or ship preset files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenFlags {
    /// Master switch; off leaves the registry untouched.
    pub randomize_rooms: bool,
    /// Off pins the shape size to the original room count.
    pub randomize_shapes: bool,
    pub size_variance: u32,
    pub randomize_monsters: bool,
    pub guarantee_compass: bool,
    pub guarantee_map: bool,
}

impl Default for RegenFlags {
    fn default() -> RegenFlags {
        RegenFlags {
            randomize_rooms: true,
            randomize_shapes: true,
            size_variance: 0,
            randomize_monsters: true,
            guarantee_compass: true,
            guarantee_map: true,
        }
    }
}

pub(super) struct MonsterPool {
    lists: Vec<Vec<MonsterKind>>,
    shuffled: bool,
}

impl MonsterPool {
    fn new(lists: Vec<Vec<MonsterKind>>) -> MonsterPool {
        MonsterPool { lists, shuffled: false }
    }

    /// Shuffles on first access only; untouched pools cost no draws.
    pub(super) fn take(&mut self, rng: &mut ChaCha8Rng) -> Option<Vec<MonsterKind>> {
        if !self.shuffled {
            shuffle(rng, &mut self.lists);
            self.shuffled = true;
        }
        self.lists.pop()
    }
}

/// Root of per-run mutable state. Built once, threaded through every pass,
/// discarded after the rebuilt worlds are installed.
pub(super) struct RegenState {
    pub(super) streams: RngStreams,
    /// Owning store for every room drained out of the original worlds.
    pub(super) rooms: SlotMap<RoomKey, Room>,
    /// Cross-dungeon pool; fitting removes keys permanently.
    pub(super) room_pool: Vec<RoomKey>,
    pub(super) item_pools: BTreeMap<u8, Vec<ItemKind>>,
    pub(super) pinned_items: BTreeMap<u8, Vec<ItemKind>>,
    /// Extra floor-drop cells owed to guaranteed items the pool did not hold.
    pub(super) floor_target_bonus: BTreeMap<u8, usize>,
    pub(super) monster_pools: BTreeMap<u8, MonsterPool>,
    pub(super) cache: RequirementsCache,
}

impl RegenState {
    /// Drains rooms out of the original worlds (layout order, levels
    /// ascending), shuffles the cross-dungeon pool and the per-dungeon item
    /// pools, and resolves the guaranteed-item bookkeeping. Dungeon levels
    /// are assumed unique per run.
    pub(super) fn new(worlds: Vec<DungeonWorld>, flags: &RegenFlags, run_seed: u64) -> RegenState {
        let mut streams = RngStreams::new(run_seed);
        let mut rooms: SlotMap<RoomKey, Room> = SlotMap::with_key();
        let mut room_pool = Vec::new();
        let mut item_pools = BTreeMap::new();
        let mut pinned_items = BTreeMap::new();
        let mut floor_target_bonus = BTreeMap::new();
        let mut monster_pools = BTreeMap::new();

        for mut world in worlds {
            let level = world.level;
            let mut pool_items = Vec::new();
            let mut monster_lists = Vec::new();

            for pos in world.occupied_positions() {
                let key = world.room_key_at(pos).expect("occupied position has a key");
                let room = world.rooms.remove(key).expect("room store matches layout");

                for object in &room.objects {
                    match object {
                        RoomObject::Entrance { item: Some(item), .. } => pool_items.push(*item),
                        RoomObject::FloorItem { item, .. } => pool_items.push(*item),
                        _ => {}
                    }
                }
                if !room.blocks_upper_door() {
                    monster_lists.push(room.monsters.clone());
                }

                let new_key = rooms.insert(room);
                rooms[new_key].key = new_key;
                room_pool.push(new_key);
            }

            let mut pinned = Vec::new();
            let mut bonus = 0;
            let guarantees = [
                (flags.guarantee_compass, ItemKind::Compass),
                (flags.guarantee_map, ItemKind::DungeonMap),
            ];
            for (wanted, item) in guarantees {
                if !wanted {
                    continue;
                }
                match pool_items.iter().position(|candidate| *candidate == item) {
                    Some(index) => {
                        pool_items.remove(index);
                    }
                    None => bonus += 1,
                }
                pinned.push(item);
            }

            shuffle(&mut streams.items, &mut pool_items);
            item_pools.insert(level, pool_items);
            pinned_items.insert(level, pinned);
            floor_target_bonus.insert(level, bonus);
            monster_pools.insert(level, MonsterPool::new(monster_lists));
        }

        shuffle(&mut streams.rooms, &mut room_pool);

        RegenState {
            streams,
            rooms,
            room_pool,
            item_pools,
            pinned_items,
            floor_target_bonus,
            monster_pools,
            cache: RequirementsCache::new(),
        }
    }
}
