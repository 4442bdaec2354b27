//! Tick system - the two entry points an external driver loop calls
//!
//! `tick` is the think step, run once per frame. `fixed_tick` is the
//! movement / projectile integration step, run at a fixed interval.
//! Both return the notifications produced since the last call, in order.

use crate::combat::hit::DamageEvent;
use crate::combat::projectile::ProjectileStep;
use crate::core::clock::Deferred;
use crate::core::types::{EntityId, Seconds};
use crate::ecs::world::World;
use crate::simulation::behavior;
use crate::simulation::events::SimulationEvent;

/// Run one think step
///
/// 1. Advance the clock and reload progress
/// 2. Run deferred work that came due (reload completion, burst shots, removals)
/// 3. Hand open tasks to idle survivors
/// 4. Think for every living survivor, in roster order
pub fn tick(world: &mut World, dt: Seconds) -> Vec<SimulationEvent> {
    let dt = sanitize(dt);
    let now = world.clock.advance(dt);
    world.advance_weapons(dt);

    run_due_timers(world, now);

    if world.config.tasks.auto_assign {
        let assigned = world
            .scheduler
            .assign_idle(&mut world.survivors, &mut world.tasks, &mut world.events);
        if assigned > 0 {
            tracing::debug!("Assigned {} idle survivors", assigned);
        }
    }

    let roster: Vec<EntityId> = world
        .survivors
        .iter()
        .filter(|s| !s.is_dead())
        .map(|s| s.id)
        .collect();
    for survivor in roster {
        behavior::think(world, survivor, dt);
    }

    world.drain_events()
}

/// Run one fixed integration step
///
/// 1. Move survivors toward their move targets
/// 2. Advance projectiles, resolving hits against the new positions
pub fn fixed_tick(world: &mut World, dt: Seconds) -> Vec<SimulationEvent> {
    let dt = sanitize(dt);
    integrate_movement(world, dt);
    advance_projectiles(world, dt);
    world.drain_events()
}

fn sanitize(dt: Seconds) -> Seconds {
    if dt.is_finite() && dt > 0.0 {
        dt
    } else {
        0.0
    }
}

fn run_due_timers(world: &mut World, now: Seconds) {
    while let Some((_, deferred)) = world.timers.pop_due(now) {
        match deferred {
            Deferred::ReloadComplete(weapon) => world.finish_reload(weapon),
            Deferred::BurstShot(weapon) => world.continue_burst(weapon),
            Deferred::RemoveEntity(entity) => world.remove_actor(entity),
        }
    }
}

fn integrate_movement(world: &mut World, dt: Seconds) {
    if dt <= 0.0 {
        return;
    }
    let moves: Vec<_> = world
        .survivors
        .iter()
        .filter(|s| !s.is_dead())
        .filter_map(|s| s.move_target.map(|target| (s.id, target, s.combat.move_speed)))
        .collect();

    for (id, target, speed) in moves {
        let Some(position) = world.actors.get(id).map(|a| a.position) else {
            continue;
        };
        let next = position.move_towards(target, speed * dt as f32);
        world.actors.set_position(id, next);
    }
}

fn advance_projectiles(world: &mut World, dt: Seconds) {
    let in_flight = std::mem::take(&mut world.projectiles);
    let mut still_flying = Vec::with_capacity(in_flight.len());

    for mut projectile in in_flight {
        match projectile.advance(dt as f32, &world.actors) {
            ProjectileStep::Flying => still_flying.push(projectile),
            ProjectileStep::Hit(hit) => {
                if let Some(target) = hit.entity {
                    let location = world.hit_location(hit.offset_ratio);
                    let event = DamageEvent::new(target, projectile.damage, projectile.kind)
                        .from_source(projectile.source)
                        .at(location);
                    if let Err(e) = world.apply_damage(event) {
                        tracing::trace!("Projectile hit dropped: {}", e);
                    }
                }
                world.services.pool.release(projectile.instance);
            }
            ProjectileStep::Expired => world.services.pool.release(projectile.instance),
        }
    }

    still_flying.append(&mut world.projectiles);
    world.projectiles = still_flying;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::core::types::Vec2;
    use crate::entity::survivor::Skill;
    use crate::services::Services;

    #[test]
    fn test_fixed_tick_moves_toward_target() {
        let mut world = World::new(SimulationConfig::default(), Services::default()).unwrap();
        let survivor = world.spawn_survivor("Ana", Skill::Scouting, 10.0, Vec2::ZERO);
        world.survivor_mut(survivor).unwrap().move_target = Some(Vec2::new(10.0, 0.0));

        fixed_tick(&mut world, 0.5);

        let position = world.actor(survivor).unwrap().position;
        assert!((position.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_negative_dt_does_nothing() {
        let mut world = World::new(SimulationConfig::default(), Services::default()).unwrap();
        tick(&mut world, -1.0);
        tick(&mut world, f64::NAN);
        assert_eq!(world.now(), 0.0);
    }
}
