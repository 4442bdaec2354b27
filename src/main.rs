//! Holdout - headless skirmish runner
//!
//! Spawns a colony of survivors with a few open tasks, surrounds it with
//! hostiles, runs the simulation for a fixed number of ticks and prints a
//! summary as JSON or text.

use clap::Parser;
use holdout::combat::damage_kind::{DamageKind, DamageKindTable};
use holdout::combat::hit::DamageEvent;
use holdout::combat::weapons::WeaponCatalog;
use holdout::core::config::SimulationConfig;
use holdout::core::error::Result;
use holdout::core::types::{EntityId, Faction, TaskId, Vec2};
use holdout::ecs::world::World;
use holdout::entity::survivor::Skill;
use holdout::entity::tasks::{Task, TaskKind, TaskTarget};
use holdout::services::Services;
use holdout::simulation::{fixed_tick, tick, SimulationEvent};
use holdout::spatial::query::{Classification, SpatialQuery};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seconds per simulation tick (30 Hz)
const TICK_DT: f64 = 1.0 / 30.0;

/// Hostile melee profile used by the runner's simple pursuit logic
const HOSTILE_SPEED: f32 = 2.0;
const HOSTILE_REACH: f32 = 1.2;
const HOSTILE_DAMAGE: f32 = 8.0;
const HOSTILE_HEALTH: f32 = 60.0;

/// Headless skirmish runner
#[derive(Parser, Debug)]
#[command(name = "holdout")]
#[command(about = "Run a headless survivor skirmish and print a summary")]
struct Args {
    /// Number of ticks to simulate (30 per second)
    #[arg(long, default_value_t = 1800)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Survivors in the colony
    #[arg(long, default_value_t = 6)]
    survivors: usize,

    /// Hostiles spawned around the colony
    #[arg(long, default_value_t = 12)]
    enemies: usize,

    /// Simulation config (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Weapon catalog (TOML); built-in weapons are used when omitted
    #[arg(long)]
    weapons: Option<PathBuf>,

    /// Damage-kind table (TOML); built-in table is used when omitted
    #[arg(long)]
    damage_kinds: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

/// Summary printed at the end of a run
#[derive(Debug, Default, Serialize)]
struct SkirmishSummary {
    seed: u64,
    ticks: u64,
    seconds: f64,
    survivors_alive: usize,
    hostiles_alive: usize,
    hostiles_killed: usize,
    survivors_lost: usize,
    shots_fired: usize,
    reloads: usize,
    damage_dealt: f32,
    critical_hits: usize,
    tasks_completed: usize,
    resources_gathered: u32,
    actors_remaining: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("holdout=info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    config.seed = seed;
    let catalog = match &args.weapons {
        Some(path) => WeaponCatalog::load_from_toml(path)?,
        None => WeaponCatalog::with_defaults(),
    };
    let kinds = match &args.damage_kinds {
        Some(path) => DamageKindTable::load_from_toml(path)?,
        None => DamageKindTable::with_defaults(),
    };

    let mut world = World::with_data(config, catalog, kinds, Services::default())?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(7));
    let hostiles = populate(&mut world, &args, &mut rng)?;
    tracing::info!(
        "Skirmish: {} survivors vs {} hostiles, seed {}",
        args.survivors,
        hostiles.len(),
        seed
    );

    let mut summary = SkirmishSummary {
        seed,
        ticks: args.ticks,
        ..SkirmishSummary::default()
    };
    let mut hostile_cooldowns = vec![0.0_f64; hostiles.len()];

    for _ in 0..args.ticks {
        press_attack(&mut world, &hostiles, &mut hostile_cooldowns);
        let mut events = tick(&mut world, TICK_DT);
        events.extend(fixed_tick(&mut world, TICK_DT));
        tally(&world, &events, &mut summary);
    }

    summary.seconds = world.now();
    summary.actors_remaining = world.actor_count();
    summary.survivors_alive = world.survivors.iter().filter(|s| !s.is_dead()).count();
    summary.hostiles_alive = world
        .actors
        .iter()
        .filter(|a| a.faction == Faction::Hostile && a.is_alive())
        .count();

    match args.format.as_str() {
        "text" => print_text(&summary),
        "json" => println!("{}", to_json(&summary)),
        other => {
            eprintln!("Unknown format '{}', defaulting to json", other);
            println!("{}", to_json(&summary));
        }
    }
    Ok(())
}

fn to_json(summary: &SkirmishSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Place survivors at the base, open a few tasks and ring the base with hostiles
fn populate(world: &mut World, args: &Args, rng: &mut ChaCha8Rng) -> Result<Vec<EntityId>> {
    let loadouts = ["rifle", "pistol", "shotgun", "machete", "rocket_launcher"];
    let skills = Skill::all();

    for i in 0..args.survivors {
        let angle = i as f32 / args.survivors.max(1) as f32 * std::f32::consts::TAU;
        let position = Vec2::from_angle(angle) * 2.0;
        let skill = skills[i % skills.len()];
        let level = rng.gen_range(10.0..80.0);
        let survivor = world.spawn_survivor(format!("survivor-{}", i), skill, level, position);

        // Every other survivor is armed; the rest fight unarmed
        if i % 2 == 0 {
            let loadout = loadouts[(i / 2) % loadouts.len()];
            if world.catalog.get(loadout).is_some() {
                world.equip(survivor, loadout)?;
            }
        }
    }

    world.add_obstacle(Vec2::new(6.0, 6.0), 1.5);
    world.add_obstacle(Vec2::new(-7.0, 3.0), 1.0);

    world.add_task_with(
        Task::new(
            TaskId(0),
            TaskKind::Resource,
            Skill::Gathering,
            20.0,
            TaskTarget::Position(Vec2::new(4.0, -3.0)),
        )
        .with_reward("scrap", 40)
        .repeating(),
    );
    world.add_task(TaskKind::Build, Skill::Building, 30.0, TaskTarget::Position(Vec2::new(-3.0, -2.0)));
    world.add_task(TaskKind::Defend, Skill::Combat, 60.0, TaskTarget::Position(Vec2::new(0.0, 5.0)));

    let hostiles = (0..args.enemies)
        .map(|i| {
            let angle = rng.gen_range(0.0..std::f32::consts::TAU);
            let distance = rng.gen_range(18.0..35.0);
            world.spawn_hostile(format!("hostile-{}", i), Vec2::from_angle(angle) * distance, HOSTILE_HEALTH)
        })
        .collect();
    Ok(hostiles)
}

/// Hostiles walk at the nearest living survivor and strike when in reach
fn press_attack(world: &mut World, hostiles: &[EntityId], cooldowns: &mut [f64]) {
    let now = world.now();
    for (i, &hostile) in hostiles.iter().enumerate() {
        let Some(position) = world.actor(hostile).filter(|a| a.is_alive()).map(|a| a.position) else {
            continue;
        };
        let nearest = world
            .actors
            .query_radius(position, 60.0, Classification::HostileTo(Faction::Hostile))
            .first()
            .copied();
        let Some((target, distance)) = nearest else {
            continue;
        };

        if distance > HOSTILE_REACH {
            if let Some(goal) = world.actor(target).map(|a| a.position) {
                let next = position.move_towards(goal, HOSTILE_SPEED * TICK_DT as f32);
                world.actors.set_position(hostile, next);
            }
        } else if now >= cooldowns[i] {
            cooldowns[i] = now + 1.0;
            let hit = DamageEvent::new(target, HOSTILE_DAMAGE, DamageKind::Physical).from_source(hostile);
            if let Err(e) = world.apply_damage(hit) {
                tracing::trace!("Hostile strike dropped: {}", e);
            }
        }
    }
}

fn tally(world: &World, events: &[SimulationEvent], summary: &mut SkirmishSummary) {
    for event in events {
        match event {
            SimulationEvent::WeaponFired { .. } => summary.shots_fired += 1,
            SimulationEvent::ReloadStarted { .. } => summary.reloads += 1,
            SimulationEvent::DamageApplied {
                source: Some(source),
                amount,
                critical,
                ..
            } => {
                let from_colony = world.actor(*source).is_some_and(|a| a.faction == Faction::Colony);
                if from_colony {
                    summary.damage_dealt += amount;
                    if *critical {
                        summary.critical_hits += 1;
                    }
                }
            }
            SimulationEvent::EntityDied { entity, .. } => {
                if world.survivor(*entity).is_some() {
                    summary.survivors_lost += 1;
                } else if world.actor(*entity).is_some_and(|a| a.faction == Faction::Hostile) {
                    summary.hostiles_killed += 1;
                }
            }
            SimulationEvent::TaskCompleted { resources_added, .. } => {
                summary.tasks_completed += 1;
                summary.resources_gathered += resources_added.unwrap_or(0);
            }
            _ => {}
        }
    }
}

fn print_text(summary: &SkirmishSummary) {
    println!("Skirmish Result");
    println!("===============");
    println!("Seed: {}", summary.seed);
    println!("Ticks: {} ({:.1}s)", summary.ticks, summary.seconds);
    println!("Survivors alive: {} (lost {})", summary.survivors_alive, summary.survivors_lost);
    println!("Hostiles alive: {} (killed {})", summary.hostiles_alive, summary.hostiles_killed);
    println!(
        "Shots fired: {}, reloads: {}, crits: {}",
        summary.shots_fired, summary.reloads, summary.critical_hits
    );
    println!("Damage dealt: {:.0}", summary.damage_dealt);
    println!(
        "Tasks completed: {}, resources gathered: {}",
        summary.tasks_completed, summary.resources_gathered
    );
    println!("Actors remaining: {}", summary.actors_remaining);
}
