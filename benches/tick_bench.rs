//! Benchmarks for the simulation tick.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use holdout::core::config::SimulationConfig;
use holdout::core::types::Vec2;
use holdout::ecs::world::World;
use holdout::entity::survivor::Skill;
use holdout::entity::tasks::{TaskKind, TaskTarget};
use holdout::services::Services;
use holdout::simulation::{fixed_tick, tick};

const DT: f64 = 1.0 / 30.0;

/// 20 survivors, half armed, with a few tasks and 40 hostiles in a ring
fn populated_world() -> World {
    let mut config = SimulationConfig::default();
    config.seed = 1234;
    let mut world = World::new(config, Services::default()).unwrap();

    let loadouts = ["rifle", "pistol", "shotgun", "rocket_launcher", "machete"];
    for i in 0..20 {
        let angle = i as f32 / 20.0 * std::f32::consts::TAU;
        let skill = Skill::all()[i % 5];
        let survivor = world.spawn_survivor(format!("s{}", i), skill, 50.0, Vec2::from_angle(angle) * 3.0);
        if i % 2 == 0 {
            world.equip(survivor, loadouts[(i / 2) % loadouts.len()]).unwrap();
        }
    }
    for i in 0..4 {
        let spot = TaskTarget::Position(Vec2::new(i as f32 * 2.0 - 3.0, -2.0));
        world.add_task(TaskKind::Build, Skill::Building, 30.0, spot);
        world.add_task(TaskKind::Resource, Skill::Gathering, 20.0, spot);
    }
    for i in 0..40 {
        let angle = i as f32 / 40.0 * std::f32::consts::TAU;
        world.spawn_hostile(format!("h{}", i), Vec2::from_angle(angle) * 14.0, 80.0);
    }
    world
}

fn bench_tick(c: &mut Criterion) {
    c.bench_function("tick_populated", |b| {
        b.iter_batched(
            populated_world,
            |mut world| {
                black_box(tick(&mut world, DT));
                black_box(fixed_tick(&mut world, DT));
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_one_second(c: &mut Criterion) {
    c.bench_function("run_one_second", |b| {
        b.iter_batched(
            populated_world,
            |mut world| {
                for _ in 0..30 {
                    black_box(tick(&mut world, DT));
                    black_box(fixed_tick(&mut world, DT));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_tick, bench_one_second);
criterion_main!(benches);
