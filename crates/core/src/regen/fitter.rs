//! Greedy room fitting: assigns concrete rooms out of the shuffled
//! cross-dungeon pool into shape cells, special cells first.
//!
//! The scan is backtracking-free on purpose: the first pool room satisfying a
//! cell wins, which keeps the outcome a pure function of pool order and hence
//! of the seed. A failed cell is a generator defect, never retried.

use crate::types::RegenError;

use super::model::{CellKind, DungeonShape, RegenState};
use super::requirements::RoomRequirements;

pub(super) fn fit_rooms(
    shape: &mut DungeonShape,
    state: &mut RegenState,
    dungeon: &str,
) -> Result<(), RegenError> {
    fit_pass(shape, state, dungeon, true)?;
    fit_pass(shape, state, dungeon, false)
}

fn fit_pass(
    shape: &mut DungeonShape,
    state: &mut RegenState,
    dungeon: &str,
    special_cells: bool,
) -> Result<(), RegenError> {
    for pos in shape.claimed_positions() {
        let kind = shape.cell(pos).expect("claimed position is in bounds").kind;
        if is_special(kind) != special_cells {
            continue;
        }
        if shape.is_bound(pos) {
            continue;
        }

        let required = shape.required_directions(pos);
        let RegenState { rooms, room_pool, cache, .. } = state;

        let mut chosen = None;
        for (pool_index, key) in room_pool.iter().enumerate() {
            let requirements = cache.analyze(&rooms[*key])?;
            if !requirements.usable_doors.contains(required) {
                continue;
            }
            if !classification_matches(kind, requirements) {
                continue;
            }
            chosen = Some(pool_index);
            break;
        }

        let Some(pool_index) = chosen else {
            return Err(RegenError::RoomPoolExhausted { dungeon: dungeon.to_string(), cell: pos });
        };
        let key = room_pool.remove(pool_index);
        rooms[key].is_entrance = kind == CellKind::Entrance;
        shape.cell_mut(pos).expect("claimed position is in bounds").room = Some(key);
    }
    Ok(())
}

fn is_special(kind: CellKind) -> bool {
    matches!(
        kind,
        CellKind::Entrance
            | CellKind::FloorDrop
            | CellKind::ItemStaircase
            | CellKind::TransportStaircase
    )
}

/// Entrance and staircase rooms are structural and stay reserved for their
/// cell classes; floor drops are a capability most rooms have.
fn classification_matches(kind: CellKind, requirements: &RoomRequirements) -> bool {
    match kind {
        CellKind::Entrance => requirements.is_entrance,
        CellKind::ItemStaircase | CellKind::TransportStaircase => {
            requirements.has_staircase && !requirements.is_entrance
        }
        CellKind::FloorDrop => {
            requirements.has_floor_drop
                && !requirements.has_staircase
                && !requirements.is_entrance
        }
        CellKind::Normal => !requirements.has_staircase && !requirements.is_entrance,
        CellKind::None => false,
    }
}
