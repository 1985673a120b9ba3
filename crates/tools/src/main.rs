use std::fs;

use anyhow::{Context, Result};
use clap::Parser;

use undercroft_core::content;
use undercroft_core::regen::{RegenFlags, regenerate_worlds};
use undercroft_core::types::{Direction, GridPos, LockType};
use undercroft_core::world::{DungeonWorld, EntranceKind, Room, RoomObject};

#[derive(Parser)]
#[command(author, version, about = "Regenerate the demo dungeons and dump the result")]
struct Args {
    /// Seed for the regeneration run
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Path to a JSON file with randomization flags
    #[arg(short, long)]
    flags: Option<String>,

    /// Only print the dungeon with this name
    #[arg(short, long)]
    dungeon: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let flags: RegenFlags = match &args.flags {
        Some(path) => {
            let data = fs::read_to_string(path)
                .with_context(|| format!("failed to read flags file: {path}"))?;
            serde_json::from_str(&data).with_context(|| "failed to deserialize flags JSON")?
        }
        None => RegenFlags::default(),
    };

    let mut registry = content::demo_registry();
    regenerate_worlds(&mut registry, &flags, args.seed)
        .map_err(|error| anyhow::anyhow!("regeneration failed: {error:?}"))?;

    for name in registry.names() {
        if args.dungeon.as_ref().is_some_and(|wanted| wanted != &name) {
            continue;
        }
        let world = registry.get(&name).expect("listed name resolves");
        print_world(world);
    }
    Ok(())
}

fn print_world(world: &DungeonWorld) {
    println!("== {} (level {}) ==", world.name, world.level);
    println!("rooms: {}", world.room_count());
    println!("snapshot hash: {:016x}", world.snapshot_hash());

    for y in 0..world.rows {
        let mut line = String::new();
        for x in 0..world.columns {
            let pos = GridPos { y: y as i32, x: x as i32 };
            line.push(world.room_at(pos).map_or('.', room_glyph));
        }
        println!("{line}");
    }

    for pos in world.occupied_positions() {
        let room = world.room_at(pos).expect("occupied position resolves");
        println!(
            "  ({},{}) room {:<3} doors {}  {}",
            pos.x,
            pos.y,
            room.original_id.0,
            door_summary(room),
            object_summary(room),
        );
    }
    println!();
}

fn room_glyph(room: &Room) -> char {
    if room.is_entrance {
        return 'E';
    }
    if room.transport_exit().is_some() {
        return 'T';
    }
    for object in &room.objects {
        match object {
            RoomObject::Entrance { kind: EntranceKind::Cellar, item: Some(_), .. } => return 'S',
            RoomObject::FloorItem { .. } => return 'F',
            _ => {}
        }
    }
    '#'
}

fn door_summary(room: &Room) -> String {
    Direction::ALL.iter().map(|direction| lock_glyph(room.doors.get(*direction))).collect()
}

fn lock_glyph(lock: LockType) -> char {
    match lock {
        LockType::Wall => '-',
        LockType::Open => 'O',
        LockType::Key => 'K',
        LockType::Bombable => 'B',
        LockType::FalseWall => 'F',
        LockType::Shutter => 'S',
    }
}

fn object_summary(room: &Room) -> String {
    let mut parts = Vec::new();
    for object in &room.objects {
        match object {
            RoomObject::Entrance { kind: EntranceKind::Cellar, item, .. } => {
                parts.push(format!("cellar:{item:?}"));
            }
            RoomObject::Entrance { kind: EntranceKind::Transport, exit, .. } => {
                parts.push(format!("transport:{exit:?}"));
            }
            RoomObject::FloorItem { item, .. } => parts.push(format!("floor:{item:?}")),
            RoomObject::PushBlock { opens_shutters } => {
                parts.push(format!("push-block(shutters:{opens_shutters})"));
            }
        }
    }
    parts.join(" ")
}
