//! World - owns every actor, weapon, task and pending timer
//!
//! Collaborators (config, asset provider, pool, economy, feedback) are
//! handed in at construction; nothing here reaches for global state.

use ahash::AHashMap;
use crate::combat::damage_kind::DamageKindTable;
use crate::combat::fire_control::{Aim, Delivery, FireContext, Volley, WeaponInstance};
use crate::combat::health::{HealthState, Intake, IntakeRejection};
use crate::combat::hit::{DamageEvent, DamageReport, HitLocation};
use crate::combat::projectile::Projectile;
use crate::combat::resolver::DamageResolver;
use crate::combat::weapons::{FireMode, WeaponCatalog, WeaponDefinition};
use crate::core::clock::{Deferred, SimClock, TimerQueue};
use crate::core::config::SimulationConfig;
use crate::core::error::{Conflict, Result, Shortage, SimError};
use crate::core::types::{EntityId, Faction, Seconds, TaskId, Vec2, WeaponId};
use crate::ecs::actors::{Actor, ActorStore, Obstacle, DEFAULT_ACTOR_RADIUS};
use crate::entity::survivor::{CombatProfile, Skill, SurvivorRecord};
use crate::entity::tasks::{Task, TaskBoard, TaskKind, TaskTarget};
use crate::services::assets::AssetHandle;
use crate::services::Services;
use crate::simulation::behavior;
use crate::simulation::events::SimulationEvent;
use crate::simulation::scheduler::TaskScheduler;
use crate::spatial::query::SpatialQuery;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Health every survivor spawns with
pub const SURVIVOR_MAX_HEALTH: f32 = 100.0;

/// The simulation state
pub struct World {
    pub clock: SimClock,
    pub config: SimulationConfig,
    pub actors: ActorStore,
    /// Survivors in spawn order; scheduling walks them in this order
    pub survivors: Vec<SurvivorRecord>,
    pub weapons: AHashMap<WeaponId, WeaponInstance>,
    pub tasks: TaskBoard,
    pub scheduler: TaskScheduler,
    pub projectiles: Vec<Projectile>,
    pub timers: TimerQueue<Deferred>,
    pub resolver: DamageResolver,
    pub catalog: WeaponCatalog,
    pub services: Services,
    /// Notifications not yet handed to the driver
    pub events: Vec<SimulationEvent>,
    weapon_rng: ChaCha8Rng,
    next_weapon: u32,
}

impl World {
    /// World with the built-in weapon catalog and damage-kind table
    pub fn new(config: SimulationConfig, services: Services) -> Result<Self> {
        Self::with_data(
            config,
            WeaponCatalog::with_defaults(),
            DamageKindTable::with_defaults(),
            services,
        )
    }

    pub fn with_data(
        config: SimulationConfig,
        catalog: WeaponCatalog,
        kinds: DamageKindTable,
        services: Services,
    ) -> Result<Self> {
        config.validate()?;
        let resolver = DamageResolver::from_config(&config, kinds);
        Ok(Self {
            clock: SimClock::new(),
            actors: ActorStore::new(config.spatial.grid_cell_size),
            survivors: Vec::new(),
            weapons: AHashMap::new(),
            tasks: TaskBoard::new(),
            scheduler: TaskScheduler::new(config.tasks.clone()),
            projectiles: Vec::new(),
            timers: TimerQueue::new(),
            resolver,
            catalog,
            services,
            events: Vec::new(),
            // Spread draws get their own stream so crit rolls replay independently
            weapon_rng: ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1)),
            next_weapon: 0,
            config,
        })
    }

    pub fn now(&self) -> Seconds {
        self.clock.now()
    }

    // === SPAWNING ===

    pub fn spawn_actor(
        &mut self,
        name: impl Into<String>,
        faction: Faction,
        position: Vec2,
        health: Option<HealthState>,
    ) -> EntityId {
        let id = EntityId::new();
        self.actors.insert(Actor {
            id,
            name: name.into(),
            faction,
            position,
            radius: DEFAULT_ACTOR_RADIUS,
            health,
        });
        id
    }

    pub fn spawn_survivor(&mut self, name: impl Into<String>, skill: Skill, skill_level: f32, position: Vec2) -> EntityId {
        let name = name.into();
        let id = self.spawn_actor(
            name.clone(),
            Faction::Colony,
            position,
            Some(HealthState::new(SURVIVOR_MAX_HEALTH)),
        );
        let record = SurvivorRecord::new(id, name, skill, skill_level)
            .with_combat(CombatProfile::from_config(&self.config.survivors));
        tracing::debug!("Spawned survivor {} ({:?} {:.0})", record.name, skill, skill_level);
        self.survivors.push(record);
        id
    }

    pub fn spawn_hostile(&mut self, name: impl Into<String>, position: Vec2, max_health: f32) -> EntityId {
        self.spawn_actor(name, Faction::Hostile, position, Some(HealthState::new(max_health)))
    }

    pub fn add_obstacle(&mut self, center: Vec2, radius: f32) {
        self.actors.add_obstacle(Obstacle { center, radius });
    }

    // === LOOKUPS ===

    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// Actors still in the active set (dead ones stay until their grace period ends)
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn survivor(&self, id: EntityId) -> Option<&SurvivorRecord> {
        self.survivors.iter().find(|s| s.id == id)
    }

    pub fn survivor_mut(&mut self, id: EntityId) -> Option<&mut SurvivorRecord> {
        self.survivors.iter_mut().find(|s| s.id == id)
    }

    pub(crate) fn survivor_index(&self, id: EntityId) -> Option<usize> {
        self.survivors.iter().position(|s| s.id == id)
    }

    pub fn weapon(&self, id: WeaponId) -> Option<&WeaponInstance> {
        self.weapons.get(&id)
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn hit_location(&self, offset_ratio: f32) -> HitLocation {
        HitLocation::from_offset_ratio(
            offset_ratio,
            self.config.weapons.body_zone_ratio,
            self.config.weapons.head_zone_ratio,
        )
    }

    /// Hand all pending notifications to the caller
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }

    // === WEAPONS ===

    /// Equip a catalog weapon by name
    pub fn equip(&mut self, owner: EntityId, weapon: &str) -> Result<WeaponId> {
        let definition = self
            .catalog
            .get(weapon)
            .cloned()
            .ok_or_else(|| SimError::InvalidInput(format!("unknown weapon '{}'", weapon)))?;
        self.equip_definition(owner, definition)
    }

    /// Create a weapon instance for `owner`, replacing a survivor's current weapon
    pub fn equip_definition(&mut self, owner: EntityId, definition: WeaponDefinition) -> Result<WeaponId> {
        definition.validate()?;
        let actor = self.actors.get(owner).ok_or(SimError::EntityNotFound(owner))?;
        if !actor.is_alive() {
            return Err(SimError::StateConflict(Conflict::Dead));
        }

        if let Some(previous) = self.survivor(owner).and_then(|s| s.weapon) {
            self.unequip(previous)?;
        }

        let id = WeaponId(self.next_weapon);
        self.next_weapon += 1;
        let instance = WeaponInstance::equip(id, owner, definition);
        tracing::debug!("{} equipped {} as {:?}", owner, instance.definition().name, id);

        if instance.definition().gun().is_some() {
            self.events.push(SimulationEvent::AmmoChanged {
                weapon: id,
                owner,
                current: instance.current_ammo(),
                reserve: instance.reserve_ammo(),
            });
        }
        self.weapons.insert(id, instance);
        if let Some(survivor) = self.survivor_mut(owner) {
            survivor.weapon = Some(id);
        }
        Ok(id)
    }

    /// Destroy a weapon instance. A reload or burst still pending is cancelled.
    pub fn unequip(&mut self, weapon: WeaponId) -> Result<WeaponDefinition> {
        let mut instance = self.weapons.remove(&weapon).ok_or(SimError::WeaponNotFound(weapon))?;
        instance.cancel_pending(&mut self.timers);
        if let Some(survivor) = self.survivor_mut(instance.owner()) {
            if survivor.weapon == Some(weapon) {
                survivor.weapon = None;
            }
        }
        tracing::debug!("{:?} unequipped from {}", weapon, instance.owner());
        Ok(instance.definition().clone())
    }

    /// One attack attempt. Hitscan and melee hits resolve immediately and
    /// their reports are returned; projectiles resolve later in `fixed_tick`.
    pub fn fire_weapon(&mut self, weapon: WeaponId, aim: Aim) -> Result<Vec<DamageReport>> {
        let start = self.events.len();
        let instance = self.weapons.get(&weapon).ok_or(SimError::WeaponNotFound(weapon))?;
        if !self.actors.is_alive(instance.owner()) {
            return Err(SimError::StateConflict(Conflict::Dead));
        }

        // Load the prefab before committing anything: a failed load aborts the shot
        let projectile = instance.definition().gun().and_then(|g| g.projectile.clone());
        let prefab = match projectile {
            Some(projectile) => Some(self.load_prefab(&projectile.prefab)?),
            None => None,
        };

        let instance = self.weapons.get_mut(&weapon).ok_or(SimError::WeaponNotFound(weapon))?;
        let mut ctx = FireContext {
            now: self.clock.now(),
            timers: &mut self.timers,
            events: &mut self.events,
            config: &self.config.weapons,
            rng: &mut self.weapon_rng,
        };
        let volley = instance.try_fire(&mut ctx, aim)?;

        let definition = instance.definition();
        if let Some(sound) = &definition.fire_sound {
            self.services.feedback.play_sound(sound, aim.origin);
        }
        if let Some(effect) = &definition.muzzle_effect {
            self.services.feedback.trigger_animation(volley.owner, effect);
        }

        let reports = self.deliver(volley, prefab);
        self.react_from(start);
        Ok(reports)
    }

    /// Fire at a point, aiming from the owner's position
    pub fn fire_at(&mut self, weapon: WeaponId, target: Vec2) -> Result<Vec<DamageReport>> {
        let owner = self.weapons.get(&weapon).ok_or(SimError::WeaponNotFound(weapon))?.owner();
        let origin = self.actors.get(owner).ok_or(SimError::EntityNotFound(owner))?.position;
        self.fire_weapon(weapon, Aim::at(origin, target))
    }

    pub fn reload(&mut self, weapon: WeaponId) -> Result<()> {
        let instance = self.weapons.get_mut(&weapon).ok_or(SimError::WeaponNotFound(weapon))?;
        let mut ctx = FireContext {
            now: self.clock.now(),
            timers: &mut self.timers,
            events: &mut self.events,
            config: &self.config.weapons,
            rng: &mut self.weapon_rng,
        };
        instance.try_reload(&mut ctx)
    }

    pub fn cycle_fire_mode(&mut self, weapon: WeaponId) -> Result<FireMode> {
        let instance = self.weapons.get_mut(&weapon).ok_or(SimError::WeaponNotFound(weapon))?;
        let mode = instance.cycle_fire_mode()?;
        tracing::debug!("{:?} switched to {:?}", weapon, mode);
        Ok(mode)
    }

    /// Reload timer callback
    pub(crate) fn finish_reload(&mut self, weapon: WeaponId) {
        let Some(instance) = self.weapons.get_mut(&weapon) else {
            return;
        };
        let mut ctx = FireContext {
            now: self.clock.now(),
            timers: &mut self.timers,
            events: &mut self.events,
            config: &self.config.weapons,
            rng: &mut self.weapon_rng,
        };
        instance.finish_reload(&mut ctx);
    }

    /// Burst timer callback: next shot leaves from wherever the owner stands now
    pub(crate) fn continue_burst(&mut self, weapon: WeaponId) {
        let start = self.events.len();
        let Some(instance) = self.weapons.get(&weapon) else {
            return;
        };
        let Some(origin) = self
            .actors
            .get(instance.owner())
            .filter(|a| a.is_alive())
            .map(|a| a.position)
        else {
            return;
        };

        let projectile = instance.definition().gun().and_then(|g| g.projectile.clone());
        // Rounds in a burst are already committed; a failed load only loses the projectile
        let prefab = projectile.and_then(|p| self.load_prefab(&p.prefab).ok());

        let Some(instance) = self.weapons.get_mut(&weapon) else {
            return;
        };
        let mut ctx = FireContext {
            now: self.clock.now(),
            timers: &mut self.timers,
            events: &mut self.events,
            config: &self.config.weapons,
            rng: &mut self.weapon_rng,
        };
        if let Some(volley) = instance.continue_burst(&mut ctx, origin) {
            self.deliver(volley, prefab);
            self.react_from(start);
        }
    }

    pub(crate) fn advance_weapons(&mut self, dt: Seconds) {
        for instance in self.weapons.values_mut() {
            instance.advance(dt);
        }
    }

    fn load_prefab(&mut self, address: &str) -> Result<AssetHandle> {
        self.services.assets.load(address).map_err(|e| {
            tracing::warn!("Projectile aborted: {}", e);
            SimError::ResourceUnavailable(Shortage::Asset(address.to_string()))
        })
    }

    /// Turn a volley into hits or travelling projectiles
    fn deliver(&mut self, volley: Volley, prefab: Option<AssetHandle>) -> Vec<DamageReport> {
        let mut reports = Vec::new();
        match &volley.delivery {
            Delivery::Hitscan | Delivery::Melee => {
                let melee = volley.delivery == Delivery::Melee;
                for pellet in &volley.pellets {
                    let Some(hit) = self
                        .actors
                        .raycast(volley.origin, pellet.direction, volley.range, Some(volley.owner))
                    else {
                        continue;
                    };
                    // Obstacles soak the shot
                    let Some(target) = hit.entity else {
                        continue;
                    };
                    let location = if melee {
                        HitLocation::Body
                    } else {
                        self.hit_location(hit.offset_ratio)
                    };
                    let event = DamageEvent::new(target, pellet.damage, volley.kind)
                        .from_source(volley.owner)
                        .at(location);
                    reports.push(self.resolver.apply_damage(&mut self.actors, &event, &mut self.events));
                }
            }
            Delivery::Projectile(definition) => {
                let Some(prefab) = prefab else {
                    return reports;
                };
                for pellet in &volley.pellets {
                    let instance = self
                        .services
                        .pool
                        .acquire(prefab, volley.origin, pellet.direction.angle());
                    self.projectiles.push(Projectile {
                        source: volley.owner,
                        weapon: volley.weapon,
                        position: volley.origin,
                        direction: pellet.direction,
                        speed: definition.speed,
                        remaining_range: volley.range,
                        damage: pellet.damage,
                        kind: volley.kind,
                        instance,
                    });
                }
            }
        }
        reports
    }

    // === DAMAGE ===

    /// Resolve a hit against an actor. Unknown targets are an error; targets
    /// without health are a no-op with a rejected report.
    pub fn apply_damage(&mut self, hit: DamageEvent) -> Result<DamageReport> {
        if !self.actors.contains(hit.target) {
            return Err(SimError::EntityNotFound(hit.target));
        }
        let start = self.events.len();
        let report = self.resolver.apply_damage(&mut self.actors, &hit, &mut self.events);
        self.react_from(start);
        Ok(report)
    }

    /// Restore health; returns the amount actually healed
    pub fn heal(&mut self, target: EntityId, amount: f32) -> Result<f32> {
        let actor = self.actors.get_mut(target).ok_or(SimError::EntityNotFound(target))?;
        let health = actor
            .health
            .as_mut()
            .ok_or_else(|| SimError::InvalidInput(format!("{} cannot be healed", target)))?;
        match health.heal(amount) {
            Intake::Applied { delta, .. } => {
                self.events.push(SimulationEvent::Healed { target, amount: delta });
                Ok(delta)
            }
            Intake::Rejected(IntakeRejection::Dead) => Err(SimError::StateConflict(Conflict::Dead)),
            Intake::Rejected(_) => Ok(0.0),
        }
    }

    /// Route fresh notifications to the behavior layer: damage may pull a
    /// survivor into combat, deaths clean up tasks and schedule removal.
    fn react_from(&mut self, start: usize) {
        let mut i = start;
        while i < self.events.len() {
            match self.events[i].clone() {
                SimulationEvent::DamageApplied {
                    target,
                    source: Some(source),
                    ..
                } => behavior::on_damaged(self, target, source),
                SimulationEvent::EntityDied { entity, .. } => behavior::on_death(self, entity),
                _ => {}
            }
            i += 1;
        }
    }

    /// End of the death grace period
    pub(crate) fn remove_actor(&mut self, id: EntityId) {
        if self.actors.remove(id).is_none() {
            return;
        }
        if let Some(index) = self.survivor_index(id) {
            let mut record = self.survivors.remove(index);
            self.scheduler.unassign(&mut record, &mut self.tasks, &mut self.events);
        }
        let owned: Vec<WeaponId> = self
            .weapons
            .iter()
            .filter(|(_, w)| w.owner() == id)
            .map(|(wid, _)| *wid)
            .collect();
        for weapon in owned {
            if let Some(mut instance) = self.weapons.remove(&weapon) {
                instance.cancel_pending(&mut self.timers);
            }
        }
        tracing::debug!("Removed {} from the world", id);
        self.events.push(SimulationEvent::EntityRemoved { entity: id });
    }

    // === TASKS ===

    pub fn add_task(&mut self, kind: TaskKind, required_skill: Skill, duration: Seconds, target: TaskTarget) -> TaskId {
        self.tasks.add(kind, required_skill, duration, target)
    }

    /// Add a prepared task (e.g. one carrying a resource reward)
    pub fn add_task_with(&mut self, task: Task) -> TaskId {
        self.tasks.insert(task)
    }

    /// Remove a task, releasing its survivor first
    pub fn remove_task(&mut self, id: TaskId) -> Result<Task> {
        let assigned = self.tasks.get(id).ok_or(SimError::TaskNotFound(id))?.assigned;
        if let Some(index) = assigned.and_then(|s| self.survivor_index(s)) {
            self.scheduler
                .unassign(&mut self.survivors[index], &mut self.tasks, &mut self.events);
        }
        self.tasks.remove(id).ok_or(SimError::TaskNotFound(id))
    }

    pub fn assign_task(&mut self, survivor: EntityId, task: TaskId) -> Result<()> {
        let index = self.survivor_index(survivor).ok_or(SimError::EntityNotFound(survivor))?;
        self.scheduler
            .assign(&mut self.survivors[index], &mut self.tasks, task, &mut self.events)
    }

    pub fn unassign_task(&mut self, survivor: EntityId) -> Result<Option<TaskId>> {
        let index = self.survivor_index(survivor).ok_or(SimError::EntityNotFound(survivor))?;
        Ok(self
            .scheduler
            .unassign(&mut self.survivors[index], &mut self.tasks, &mut self.events))
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("now", &self.clock.now())
            .field("actors", &self.actors.len())
            .field("survivors", &self.survivors.len())
            .field("weapons", &self.weapons.len())
            .field("tasks", &self.tasks.len())
            .field("projectiles", &self.projectiles.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damage_kind::DamageKind;

    fn world() -> World {
        let mut config = SimulationConfig::default();
        config.damage.critical_chance = 0.0;
        World::new(config, Services::default()).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimulationConfig::default();
        config.damage.headshot_multiplier = 0.5;
        assert!(World::new(config, Services::default()).is_err());
    }

    #[test]
    fn test_equip_replaces_previous_weapon() {
        let mut world = world();
        let survivor = world.spawn_survivor("Ana", Skill::Combat, 50.0, Vec2::ZERO);

        let pistol = world.equip(survivor, "pistol").unwrap();
        let rifle = world.equip(survivor, "rifle").unwrap();

        assert!(world.weapon(pistol).is_none());
        assert_eq!(world.survivor(survivor).unwrap().weapon, Some(rifle));
        assert!(matches!(world.equip(survivor, "railgun"), Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_target_is_an_error() {
        let mut world = world();
        let ghost = EntityId::new();
        let result = world.apply_damage(DamageEvent::new(ghost, 10.0, DamageKind::Physical));
        assert!(matches!(result, Err(SimError::EntityNotFound(_))));
    }

    #[test]
    fn test_prop_without_health_rejects_damage() {
        let mut world = world();
        let crate_prop = world.spawn_actor("crate", Faction::Neutral, Vec2::ZERO, None);
        let report = world
            .apply_damage(DamageEvent::new(crate_prop, 10.0, DamageKind::Physical))
            .unwrap();
        assert_eq!(report.final_damage, 0.0);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_heal_emits_event() {
        let mut world = world();
        let survivor = world.spawn_survivor("Ben", Skill::Medical, 10.0, Vec2::ZERO);
        world
            .apply_damage(DamageEvent::new(survivor, 30.0, DamageKind::Physical))
            .unwrap();
        world.drain_events();

        assert_eq!(world.heal(survivor, 50.0).unwrap(), 30.0);
        assert_eq!(
            world.drain_events(),
            vec![SimulationEvent::Healed {
                target: survivor,
                amount: 30.0
            }]
        );
        assert_eq!(world.heal(survivor, 5.0).unwrap(), 0.0);
    }

    #[test]
    fn test_hitscan_hits_hostile_in_line() {
        let mut world = world();
        let shooter = world.spawn_survivor("Cy", Skill::Combat, 50.0, Vec2::ZERO);
        let hostile = world.spawn_hostile("walker", Vec2::new(10.0, 0.0), 100.0);
        let mut rifle = WeaponDefinition::rifle();
        if let crate::combat::weapons::WeaponKind::Gun(gun) = &mut rifle.kind {
            gun.spread_angle = 0.0;
            gun.fire_modes = vec![FireMode::Single];
        }
        let weapon = world.equip_definition(shooter, rifle).unwrap();

        let reports = world.fire_at(weapon, Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].applied);
        // Dead center lands on the body
        assert_eq!(reports[0].final_damage, 15.0);
        assert!(!reports[0].critical);
        assert_eq!(world.actor(hostile).unwrap().health.as_ref().unwrap().current(), 85.0);
        assert_eq!(world.weapon(weapon).unwrap().current_ammo(), 29);
    }

    #[test]
    fn test_off_center_band_is_a_headshot() {
        let mut world = world();
        let shooter = world.spawn_survivor("Cy", Skill::Combat, 50.0, Vec2::ZERO);
        // Ray passes 0.3 from the center of a 0.5 radius: offset ratio 0.6
        let hostile = world.spawn_hostile("walker", Vec2::new(10.0, 0.3), 100.0);
        let mut rifle = WeaponDefinition::rifle();
        if let crate::combat::weapons::WeaponKind::Gun(gun) = &mut rifle.kind {
            gun.spread_angle = 0.0;
            gun.fire_modes = vec![FireMode::Single];
        }
        let weapon = world.equip_definition(shooter, rifle).unwrap();

        let reports = world.fire_at(weapon, Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].critical);
        // 15 * 1.5 * 2
        assert!((reports[0].final_damage - 45.0).abs() < 1e-4);
        assert!((world.actor(hostile).unwrap().health.as_ref().unwrap().current() - 55.0).abs() < 1e-4);
    }

    #[test]
    fn test_remove_task_releases_survivor() {
        let mut world = world();
        let survivor = world.spawn_survivor("Dee", Skill::Building, 10.0, Vec2::ZERO);
        let task = world.add_task(TaskKind::Build, Skill::Building, 5.0, TaskTarget::Position(Vec2::ZERO));
        world.assign_task(survivor, task).unwrap();

        let removed = world.remove_task(task).unwrap();
        assert_eq!(removed.assigned, None);
        assert_eq!(world.survivor(survivor).unwrap().task, None);
        assert!(world.task(task).is_none());
    }
}
