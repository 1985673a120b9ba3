//! Per-dungeon door and special-room statistics gathered from the original
//! layout. Drives shape sizing and weighted lock sampling.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use crate::types::{Direction, LockType, RegenError};
use crate::world::{DungeonWorld, EntranceKind, RoomObject};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DungeonStats {
    /// Counts per re-rollable lock type, in the fixed sampling order.
    door_counts: [u32; LockType::REROLLABLE.len()],
    total_doors: u32,
    pub item_staircase_rooms: usize,
    pub floor_drop_rooms: usize,
    pub transport_pairs: usize,
}

impl DungeonStats {
    pub fn create(world: &DungeonWorld) -> Result<DungeonStats, RegenError> {
        let mut door_counts = [0_u32; LockType::REROLLABLE.len()];
        let mut item_staircase_rooms = 0;
        let mut floor_drop_rooms = 0;
        let mut transport_ends = 0;

        for pos in world.occupied_positions() {
            let room = world.room_at(pos).expect("occupied position resolves to a room");

            for direction in Direction::ALL {
                let lock = room.doors.get(direction);
                if let Some(slot) =
                    LockType::REROLLABLE.iter().position(|candidate| *candidate == lock)
                {
                    door_counts[slot] += 1;
                }
            }

            let mut drops_item = false;
            for object in &room.objects {
                match object {
                    RoomObject::Entrance { kind: EntranceKind::Cellar, item: Some(_), .. } => {
                        item_staircase_rooms += 1;
                    }
                    RoomObject::Entrance { kind: EntranceKind::Transport, .. } => {
                        transport_ends += 1;
                    }
                    RoomObject::FloorItem { .. } => drops_item = true,
                    _ => {}
                }
            }
            if drops_item {
                floor_drop_rooms += 1;
            }
        }

        if transport_ends % 2 != 0 {
            return Err(RegenError::OddTransportCount { dungeon: world.name.clone() });
        }
        let total_doors: u32 = door_counts.iter().sum();
        if total_doors == 0 {
            return Err(RegenError::ZeroDoorDungeon { dungeon: world.name.clone() });
        }

        Ok(DungeonStats {
            door_counts,
            total_doors,
            item_staircase_rooms,
            floor_drop_rooms,
            transport_pairs: transport_ends / 2,
        })
    }

    pub fn door_count(&self, lock: LockType) -> u32 {
        LockType::REROLLABLE
            .iter()
            .position(|candidate| *candidate == lock)
            .map_or(0, |slot| self.door_counts[slot])
    }

    pub fn total_doors(&self) -> u32 {
        self.total_doors
    }

    /// Frequency-weighted lock draw: uniform in [0, total), first bucket whose
    /// cumulative count exceeds the draw. Ties fall to the fixed order, and a
    /// type the original dungeon never used can never be rolled.
    pub fn random_door_type(&self, rng: &mut ChaCha8Rng) -> LockType {
        let draw = (rng.next_u64() % u64::from(self.total_doors)) as u32;
        let mut cumulative = 0;
        for (slot, lock) in LockType::REROLLABLE.iter().enumerate() {
            cumulative += self.door_counts[slot];
            if draw < cumulative {
                return *lock;
            }
        }
        unreachable!("cumulative table covers the whole draw range")
    }
}
