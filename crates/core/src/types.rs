use bitflags::bitflags;
use slotmap::new_key_type;

new_key_type! {
    pub struct RoomKey;
}

/// Identity a room keeps across runs and store transfers. Requirement caching
/// keys on this, never on the run-local `RoomKey`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OriginalRoomId(pub u16);

/// Tile coordinate inside a single room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

/// Cell coordinate on the dungeon grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GridPos {
    pub y: i32,
    pub x: i32,
}

impl GridPos {
    pub fn step(self, direction: Direction) -> GridPos {
        let (dy, dx) = direction.offset();
        GridPos { y: self.y + dy, x: self.x + dx }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Offset as (dy, dx); up points toward row zero.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }

    pub fn as_set(self) -> DirectionSet {
        match self {
            Direction::Up => DirectionSet::UP,
            Direction::Down => DirectionSet::DOWN,
            Direction::Left => DirectionSet::LEFT,
            Direction::Right => DirectionSet::RIGHT,
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct DirectionSet: u8 {
        const UP = 1;
        const DOWN = 2;
        const LEFT = 4;
        const RIGHT = 8;
    }
}

/// Traversal requirement written into a room's per-direction door map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockType {
    Wall,
    Open,
    Key,
    Bombable,
    FalseWall,
    Shutter,
}

impl LockType {
    /// The subset a regenerated door can roll, in the fixed sampling order.
    pub const REROLLABLE: [LockType; 5] = [
        LockType::Open,
        LockType::Key,
        LockType::Bombable,
        LockType::FalseWall,
        LockType::Shutter,
    ];
}

/// Per-tile answer from the tile engine. The regenerator only ever asks this
/// question; rendering and collision stay on the engine side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TileBehavior {
    Wall,
    GenericWalkable,
    Sand,
    Water,
    Door,
    Stairs,
    SlowStairs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ItemKind {
    Compass,
    DungeonMap,
    SmallKey,
    BombPack,
    Rupees,
    HeartContainer,
    Ladder,
    Bow,
    Raft,
    Boomerang,
    SilverArrows,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonsterKind {
    Bat,
    Skeleton,
    Slime,
    BladeTrap,
    ArmoredGuard,
    ElderDweller,
}

impl MonsterKind {
    /// Dwellers camp in front of the upper door and make it unusable.
    pub fn blocks_upper_door(self) -> bool {
        matches!(self, MonsterKind::ElderDweller)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegenError {
    OddTransportCount { dungeon: String },
    ZeroDoorDungeon { dungeon: String },
    IsolatedRoom { room: OriginalRoomId },
    RoomPoolExhausted { dungeon: String, cell: GridPos },
    ItemPoolExhausted { dungeon: String },
    ItemPoolRemainder { dungeon: String, leftover: usize },
    UnsatisfiableShape { dungeon: String },
    LadderGated { dungeon: String },
}

impl RegenError {
    /// Whether rerolling the seed can help. Everything else is a defect in the
    /// generator or its input data and aborts for good.
    pub fn seed_retryable(&self) -> bool {
        matches!(
            self,
            RegenError::UnsatisfiableShape { .. } | RegenError::LadderGated { .. }
        )
    }
}
