//! Actor store - positions, factions and health of everything placed in the world
//!
//! Answers the spatial questions combat and behavior ask (ray and radius
//! queries) and hands out health for damage resolution.

use ahash::AHashMap;
use crate::combat::health::HealthState;
use crate::combat::resolver::DamageTargets;
use crate::core::types::{EntityId, Faction, Vec2};
use crate::spatial::query::{ray_circle, Classification, RayHit, SpatialQuery};
use crate::spatial::sparse_hash::SparseHashGrid;
use serde::Serialize;

/// Collision radius used when none is given
pub const DEFAULT_ACTOR_RADIUS: f32 = 0.5;

#[derive(Debug, Clone, Serialize)]
pub struct Actor {
    pub id: EntityId,
    pub name: String,
    pub faction: Faction,
    pub position: Vec2,
    pub radius: f32,
    /// `None` for props that block rays but cannot be hurt
    pub health: Option<HealthState>,
}

impl Actor {
    /// Actors without health never die
    pub fn is_alive(&self) -> bool {
        self.health.as_ref().map_or(true, HealthState::is_alive)
    }

    pub fn is_damageable(&self) -> bool {
        self.health.as_ref().is_some_and(HealthState::is_alive)
    }

    pub fn health_fraction(&self) -> f32 {
        self.health.as_ref().map_or(1.0, HealthState::fraction)
    }

    fn matches(&self, filter: Classification) -> bool {
        match filter {
            Classification::Any => true,
            Classification::Damageable => self.is_damageable(),
            Classification::HostileTo(faction) => self.is_alive() && self.faction.is_hostile_to(faction),
            Classification::Member(faction) => self.is_alive() && self.faction == faction,
        }
    }
}

/// Static circular blocker for rays and projectiles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Obstacle {
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone)]
pub struct ActorStore {
    actors: Vec<Actor>,
    registry: AHashMap<EntityId, usize>,
    obstacles: Vec<Obstacle>,
    grid: SparseHashGrid,
}

impl ActorStore {
    pub fn new(cell_size: f32) -> Self {
        Self {
            actors: Vec::new(),
            registry: AHashMap::new(),
            obstacles: Vec::new(),
            grid: SparseHashGrid::new(cell_size),
        }
    }

    pub fn insert(&mut self, actor: Actor) {
        self.grid.insert(actor.id, actor.position);
        self.registry.insert(actor.id, self.actors.len());
        self.actors.push(actor);
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Actor> {
        let index = self.registry.remove(&id)?;
        let actor = self.actors.remove(index);
        self.grid.remove(id, actor.position);
        for (i, a) in self.actors.iter().enumerate().skip(index) {
            self.registry.insert(a.id, i);
        }
        Some(actor)
    }

    pub fn get(&self, id: EntityId) -> Option<&Actor> {
        self.registry.get(&id).map(|&i| &self.actors[i])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.registry.get(&id).map(|&i| &mut self.actors[i])
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.registry.contains_key(&id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Actor::is_alive)
    }

    /// Move an actor, keeping its grid entry in step
    pub fn set_position(&mut self, id: EntityId, position: Vec2) {
        let Some(&index) = self.registry.get(&id) else {
            return;
        };
        let actor = &mut self.actors[index];
        let from = std::mem::replace(&mut actor.position, position);
        self.grid.relocate(id, from, position);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Grid candidates filtered by classification and sorted nearest first
    /// (ties in insertion order)
    fn nearby(&self, center: Vec2, radius: f32, filter: Classification) -> Vec<(EntityId, f32)> {
        let mut found: Vec<(usize, f32)> = self
            .grid
            .query_radius(center, radius)
            .into_iter()
            .filter_map(|(id, _)| self.registry.get(&id).copied())
            .map(|i| (i, self.actors[i].position.distance(&center)))
            .filter(|&(i, d)| d <= radius && self.actors[i].matches(filter))
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.dedup_by_key(|(i, _)| *i);
        found.into_iter().map(|(i, d)| (self.actors[i].id, d)).collect()
    }
}

impl SpatialQuery for ActorStore {
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<RayHit> {
        let direction = direction.normalize();
        let mut best: Option<RayHit> = None;

        let candidates = self
            .actors
            .iter()
            .filter(|a| Some(a.id) != ignore && a.is_alive())
            .map(|a| (Some(a.id), a.position, a.radius))
            .chain(self.obstacles.iter().map(|o| (None, o.center, o.radius)));

        for (entity, center, radius) in candidates {
            let Some((distance, offset_ratio)) = ray_circle(origin, direction, max_distance, center, radius)
            else {
                continue;
            };
            if best.as_ref().map_or(true, |b| distance < b.distance) {
                best = Some(RayHit {
                    entity,
                    point: origin + direction * distance,
                    distance,
                    offset_ratio,
                });
            }
        }
        best
    }

    fn query_radius(&self, center: Vec2, radius: f32, filter: Classification) -> Vec<(EntityId, f32)> {
        self.nearby(center, radius, filter)
    }
}

impl DamageTargets for ActorStore {
    fn health_mut(&mut self, id: EntityId) -> Option<&mut HealthState> {
        self.get_mut(id).and_then(|a| a.health.as_mut())
    }

    fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.get(id).map(|a| a.position)
    }

    fn damageable_within(&self, center: Vec2, radius: f32, exclude: EntityId) -> Vec<(EntityId, f32)> {
        let mut found = self.nearby(center, radius, Classification::Damageable);
        found.retain(|(id, _)| *id != exclude);
        found
    }
}
