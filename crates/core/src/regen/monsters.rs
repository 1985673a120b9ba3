//! Monster randomization: fitted rooms draw replacement monster lists from
//! their dungeon level's lazily shuffled pool.

use super::model::{DungeonShape, RegenState};

pub(super) fn randomize_monsters(shape: &DungeonShape, state: &mut RegenState, level: u8) {
    let RegenState { streams, rooms, monster_pools, .. } = state;
    let Some(pool) = monster_pools.get_mut(&level) else {
        return;
    };

    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        let room = &mut rooms[key];
        // Dweller rooms keep their residents; moving one would silently
        // invalidate the cached door requirements of both rooms involved.
        if room.blocks_upper_door() {
            continue;
        }
        if let Some(list) = pool.take(&mut streams.monsters) {
            room.monsters = list;
        }
    }
}
