//! Survivor behavior state machine
//!
//! One think step per survivor per tick:
//! 1. Dead survivors do nothing
//! 2. Drop a combat target that died or ran past leash range
//! 3. Without a target, scan for hostiles (idle, or working a Defend/Follow task)
//! 4. With a target: close to attack range, then attack on cooldown
//! 5. Otherwise walk to the task and work it on arrival
//!
//! Damage from a hostile source and deaths arrive as reactions, routed here
//! by the world as soon as the notification is produced.

use crate::combat::damage_kind::DamageKind;
use crate::combat::fire_control::Aim;
use crate::combat::hit::DamageEvent;
use crate::core::clock::Deferred;
use crate::core::types::{EntityId, Seconds, TaskId, Vec2};
use crate::ecs::world::World;
use crate::entity::survivor::BehaviorState;
use crate::entity::tasks::{TaskKind, TaskTarget};
use crate::spatial::query::{Classification, SpatialQuery};

pub fn think(world: &mut World, survivor: EntityId, dt: Seconds) {
    let Some(index) = world.survivor_index(survivor) else {
        return;
    };
    if world.survivors[index].is_dead() {
        return;
    }
    let Some((position, faction)) = world.actors.get(survivor).map(|a| (a.position, a.faction)) else {
        return;
    };
    let detection_range = world.config.survivors.detection_range;
    let leash_range = world.config.survivors.leash_range;

    if let Some(target) = world.survivors[index].combat_target {
        let keep = world
            .actors
            .get(target)
            .filter(|a| a.is_alive())
            .is_some_and(|a| a.position.distance(&position) <= leash_range);
        if !keep {
            tracing::trace!("{} drops target {}", world.survivors[index].name, target);
            let record = &mut world.survivors[index];
            record.combat_target = None;
            record.move_target = None;
        }
    }

    let task_kind = world.survivors[index]
        .task
        .and_then(|t| world.tasks.get(t))
        .map(|t| t.kind);

    if world.survivors[index].combat_target.is_none() && task_kind.map_or(true, |k| k.scans_for_enemies()) {
        let nearest = world
            .actors
            .query_radius(position, detection_range, Classification::HostileTo(faction))
            .first()
            .copied();
        if let Some((enemy, distance)) = nearest {
            tracing::debug!(
                "{} engages {} at {:.1}",
                world.survivors[index].name,
                enemy,
                distance
            );
            world.survivors[index].combat_target = Some(enemy);
        }
    }

    if let Some(target) = world.survivors[index].combat_target {
        world.survivors[index].state = task_kind.map_or(BehaviorState::Defending, |k| k.behavior());
        engage(world, index, position, target);
        return;
    }

    match world.survivors[index].task {
        Some(task) => work(world, index, position, task, dt),
        None => {
            let record = &mut world.survivors[index];
            record.state = BehaviorState::Idle;
            record.move_target = None;
        }
    }
}

/// Close to attack range, then attack
fn engage(world: &mut World, index: usize, position: Vec2, target: EntityId) {
    let Some(target_position) = world.actors.get(target).map(|a| a.position) else {
        return;
    };

    // A gun with no rounds anywhere is as good as no weapon
    let weapon = world.survivors[index].weapon.and_then(|id| {
        let instance = world.weapons.get(&id)?;
        let dry = instance.definition().gun().is_some()
            && instance.current_ammo() == 0
            && instance.reserve_ammo() == 0
            && !instance.is_reloading();
        (!dry).then(|| (id, instance.definition().range))
    });
    let range = weapon.map_or(world.survivors[index].combat.melee_range, |(_, range)| range);

    if position.distance(&target_position) > range {
        world.survivors[index].move_target = Some(target_position);
        return;
    }
    world.survivors[index].move_target = None;

    match weapon {
        Some((weapon, _)) => {
            // The fire-rate gate inside fire control is the attack cooldown
            match world.fire_weapon(weapon, Aim::at(position, target_position)) {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {
                    tracing::trace!("{} holds fire: {}", world.survivors[index].name, e)
                }
                Err(e) => tracing::debug!("{} cannot fire: {}", world.survivors[index].name, e),
            }
        }
        None => unarmed_attack(world, index, target),
    }
}

/// Direct melee hit at the survivor's own rate, bypassing fire control
fn unarmed_attack(world: &mut World, index: usize, target: EntityId) {
    let now = world.clock.now();
    let record = &mut world.survivors[index];
    let interval = 1.0 / f64::from(record.combat.attack_rate);
    if record.last_attack.is_some_and(|last| now < last + interval) {
        return;
    }
    record.last_attack = Some(now);

    let hit = DamageEvent::new(target, record.combat.melee_damage, DamageKind::Physical).from_source(record.id);
    if let Err(e) = world.apply_damage(hit) {
        tracing::trace!("Unarmed attack missed: {}", e);
    }
}

/// Walk to the task target; advance progress once there
fn work(world: &mut World, index: usize, position: Vec2, task_id: TaskId, dt: Seconds) {
    let Some((kind, target)) = world.tasks.get(task_id).map(|t| (t.kind, t.target)) else {
        world
            .scheduler
            .unassign(&mut world.survivors[index], &mut world.tasks, &mut world.events);
        return;
    };
    let arrival_radius = world.config.survivors.arrival_radius;
    let follow_distance = world.config.survivors.follow_distance;

    let destination = match target {
        TaskTarget::Position(point) => Some(point),
        TaskTarget::Entity(entity) => world
            .actors
            .get(entity)
            .filter(|a| a.is_alive())
            .map(|a| a.position),
    };
    let Some(destination) = destination else {
        tracing::debug!("{} abandons task {:?}: target gone", world.survivors[index].name, task_id);
        world
            .scheduler
            .unassign(&mut world.survivors[index], &mut world.tasks, &mut world.events);
        return;
    };

    world.survivors[index].state = kind.behavior();
    let (arrive_within, stop_at) = if kind == TaskKind::Follow {
        // Trail behind the followed entity instead of walking into it
        let back = (position - destination).normalize();
        (follow_distance, destination + back * (follow_distance * 0.8))
    } else {
        (arrival_radius, destination)
    };

    if position.distance(&destination) > arrive_within {
        world.survivors[index].move_target = Some(stop_at);
        return;
    }
    world.survivors[index].move_target = None;

    let health = world.actors.get(world.survivors[index].id).map_or(1.0, |a| a.health_fraction());
    world.scheduler.advance(
        &mut world.survivors[index],
        &mut world.tasks,
        health,
        dt,
        world.services.economy.as_mut(),
        &mut world.events,
    );
}

/// Damage reaction: a hostile attacker becomes the current target.
/// The assigned task is kept.
pub fn on_damaged(world: &mut World, target: EntityId, source: EntityId) {
    let Some(index) = world.survivor_index(target) else {
        return;
    };
    if world.survivors[index].is_dead() {
        return;
    }
    let (Some(victim), Some(attacker)) = (world.actors.get(target), world.actors.get(source)) else {
        return;
    };
    if !attacker.is_alive() || !attacker.faction.is_hostile_to(victim.faction) {
        return;
    }

    let record = &mut world.survivors[index];
    if record.combat_target != Some(source) {
        tracing::debug!("{} turns on {}", record.name, source);
        record.combat_target = Some(source);
    }
}

/// Death reaction
///
/// Tasks tracking the dead entity (follow it, defend it) are dropped. A dead
/// survivor stops moving, loses its task and weapon timers. Every dead
/// actor is scheduled for removal after the grace period.
pub fn on_death(world: &mut World, entity: EntityId) {
    let orphaned: Vec<TaskId> = world
        .tasks
        .iter()
        .filter(|t| t.target == TaskTarget::Entity(entity))
        .map(|t| t.id)
        .collect();
    for task in orphaned {
        tracing::debug!("Task {:?} abandoned: {} died", task, entity);
        if let Err(e) = world.remove_task(task) {
            tracing::trace!("Task cleanup skipped: {}", e);
        }
    }

    if let Some(index) = world.survivor_index(entity) {
        let record = &mut world.survivors[index];
        record.state = BehaviorState::Dead;
        record.move_target = None;
        record.combat_target = None;
        let weapon = record.weapon;
        tracing::info!("{} died", record.name);

        world
            .scheduler
            .unassign(&mut world.survivors[index], &mut world.tasks, &mut world.events);
        if let Some(instance) = weapon.and_then(|w| world.weapons.get_mut(&w)) {
            instance.cancel_pending(&mut world.timers);
        }
    }

    let due = world.clock.now() + world.config.survivors.death_grace;
    world.timers.schedule(due, Deferred::RemoveEntity(entity));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;
    use crate::entity::survivor::Skill;
    use crate::services::Services;

    fn world() -> World {
        let mut config = SimulationConfig::default();
        config.damage.critical_chance = 0.0;
        World::new(config, Services::default()).unwrap()
    }

    #[test]
    fn test_idle_survivor_engages_nearest_hostile() {
        let mut world = world();
        let survivor = world.spawn_survivor("Ana", Skill::Combat, 50.0, Vec2::ZERO);
        let near = world.spawn_hostile("near", Vec2::new(5.0, 0.0), 100.0);
        world.spawn_hostile("far", Vec2::new(12.0, 0.0), 100.0);

        think(&mut world, survivor, 0.1);

        let record = world.survivor(survivor).unwrap();
        assert_eq!(record.combat_target, Some(near));
        assert_eq!(record.state, BehaviorState::Defending);
        assert_eq!(record.move_target, Some(Vec2::new(5.0, 0.0)));
    }

    #[test]
    fn test_hostile_beyond_detection_is_ignored() {
        let mut world = world();
        let survivor = world.spawn_survivor("Ben", Skill::Combat, 50.0, Vec2::ZERO);
        world.spawn_hostile("distant", Vec2::new(40.0, 0.0), 100.0);

        think(&mut world, survivor, 0.1);

        let record = world.survivor(survivor).unwrap();
        assert_eq!(record.combat_target, None);
        assert_eq!(record.state, BehaviorState::Idle);
        assert_eq!(record.move_target, None);
    }

    #[test]
    fn test_build_task_does_not_scan() {
        let mut world = world();
        let survivor = world.spawn_survivor("Cy", Skill::Building, 50.0, Vec2::ZERO);
        world.spawn_hostile("near", Vec2::new(5.0, 0.0), 100.0);
        let task = world.add_task(TaskKind::Build, Skill::Building, 10.0, TaskTarget::Position(Vec2::new(0.0, 8.0)));
        world.assign_task(survivor, task).unwrap();

        think(&mut world, survivor, 0.1);

        let record = world.survivor(survivor).unwrap();
        assert_eq!(record.combat_target, None);
        assert_eq!(record.state, BehaviorState::Building);
        assert_eq!(record.move_target, Some(Vec2::new(0.0, 8.0)));
    }

    #[test]
    fn test_hostile_damage_preempts_without_clearing_task() {
        let mut world = world();
        let survivor = world.spawn_survivor("Dee", Skill::Building, 50.0, Vec2::ZERO);
        let raider = world.spawn_hostile("raider", Vec2::new(1.0, 0.0), 100.0);
        let task = world.add_task(TaskKind::Build, Skill::Building, 10.0, TaskTarget::Position(Vec2::ZERO));
        world.assign_task(survivor, task).unwrap();

        world
            .apply_damage(DamageEvent::new(survivor, 5.0, DamageKind::Physical).from_source(raider))
            .unwrap();

        let record = world.survivor(survivor).unwrap();
        assert_eq!(record.combat_target, Some(raider));
        assert_eq!(record.task, Some(task));
    }

    #[test]
    fn test_unarmed_attack_respects_cooldown() {
        let mut world = world();
        let survivor = world.spawn_survivor("Eve", Skill::Combat, 50.0, Vec2::ZERO);
        let hostile = world.spawn_hostile("walker", Vec2::new(1.0, 0.0), 100.0);

        think(&mut world, survivor, 0.1);
        think(&mut world, survivor, 0.1);

        let health = world.actor(hostile).unwrap().health.as_ref().unwrap().current();
        assert_eq!(health, 90.0);
    }

    #[test]
    fn test_death_clears_task_and_schedules_removal() {
        let mut world = world();
        let survivor = world.spawn_survivor("Fay", Skill::Gathering, 50.0, Vec2::ZERO);
        let task = world.add_task(TaskKind::Resource, Skill::Gathering, 10.0, TaskTarget::Position(Vec2::ZERO));
        world.assign_task(survivor, task).unwrap();

        world
            .apply_damage(DamageEvent::new(survivor, 500.0, DamageKind::Physical))
            .unwrap();

        let record = world.survivor(survivor).unwrap();
        assert_eq!(record.state, BehaviorState::Dead);
        assert_eq!(record.task, None);
        assert_eq!(world.task(task).unwrap().assigned, None);
        assert_eq!(world.timers.len(), 1);
    }
}
