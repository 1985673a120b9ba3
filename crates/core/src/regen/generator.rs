//! Run orchestration: statistics, state assembly, the per-dungeon pipeline,
//! and installation of the rebuilt worlds.

use crate::types::RegenError;
use crate::world::{DungeonWorld, WorldRegistry};

use super::doors;
use super::fitter;
use super::items;
use super::model::{DungeonShape, RegenFlags, RegenState, SHAPE_COLUMNS, SHAPE_ROWS};
use super::monsters;
use super::shape::{self, ShapeTargets};
use super::stats::DungeonStats;
use super::transport;
use super::verify;

struct DungeonPlan {
    name: String,
    level: u8,
    room_count: usize,
    stats: DungeonStats,
}

/// Regenerates every dungeon in the registry from one seed. Dungeons are
/// processed in ascending level order; rooms pool across all of them. On
/// error the registry is left partially rebuilt — callers discard it and
/// reconstruct from static definitions before retrying.
pub fn regenerate_worlds(
    registry: &mut WorldRegistry,
    flags: &RegenFlags,
    seed: u64,
) -> Result<(), RegenError> {
    if !flags.randomize_rooms {
        return Ok(());
    }

    let originals = registry.take_worlds();
    let mut plans = Vec::with_capacity(originals.len());
    for world in &originals {
        plans.push(DungeonPlan {
            name: world.name.clone(),
            level: world.level,
            room_count: world.room_count(),
            stats: DungeonStats::create(world)?,
        });
    }

    let mut state = RegenState::new(originals, flags, seed);
    for plan in &plans {
        let world = regenerate_dungeon(plan, &mut state, flags)?;
        registry.install(world);
    }
    Ok(())
}

fn regenerate_dungeon(
    plan: &DungeonPlan,
    state: &mut RegenState,
    flags: &RegenFlags,
) -> Result<DungeonWorld, RegenError> {
    let floor_bonus = state.floor_target_bonus.get(&plan.level).copied().unwrap_or(0);
    let targets = ShapeTargets {
        original_room_count: plan.room_count,
        size_variance: if flags.randomize_shapes { flags.size_variance } else { 0 },
        transport_cells: plan.stats.transport_pairs * 2,
        item_staircase_cells: plan.stats.item_staircase_rooms,
        floor_drop_cells: plan.stats.floor_drop_rooms + floor_bonus,
    };

    let mut shape = shape::build_shape(&targets, &mut state.streams.shape, &plan.name)?;
    fitter::fit_rooms(&mut shape, state, &plan.name)?;
    transport::link_transports(&shape, state, &plan.name)?;
    assign_coordinates(&shape, state, plan.level);
    if flags.randomize_monsters {
        monsters::randomize_monsters(&shape, state, plan.level);
    }
    items::place_items(&shape, state, &plan.name, plan.level)?;
    doors::assign_doors(&mut shape, state, &plan.stats, &plan.name)?;

    let mut world = DungeonWorld::new(plan.name.clone(), plan.level, SHAPE_COLUMNS, SHAPE_ROWS);
    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        let room = state.rooms.remove(key).expect("fitted room is still in the store");
        world.insert_room(room, pos);
    }

    verify::verify_world(&world, &mut state.cache)?;
    Ok(world)
}

/// Writes every fitted room's new grid coordinates and dungeon level, the
/// identity the engine addresses it by from now on.
fn assign_coordinates(shape: &DungeonShape, state: &mut RegenState, level: u8) {
    for pos in shape.bound_positions() {
        let key = shape.bound_key(pos).expect("bound position has a key");
        let room = &mut state.rooms[key];
        room.grid_pos = pos;
        room.level = level;
    }
}
