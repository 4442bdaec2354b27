//! Travelling projectiles
//!
//! Spawned by fire control when a weapon carries a projectile definition.
//! Each fixed step sweeps the distance covered with a directional query,
//! so fast projectiles never tunnel through thin targets.

use crate::combat::damage_kind::DamageKind;
use crate::core::types::{EntityId, Vec2, WeaponId};
use crate::services::pool::PooledInstance;
use crate::spatial::query::{RayHit, SpatialQuery};

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub source: EntityId,
    pub weapon: WeaponId,
    pub position: Vec2,
    /// Unit direction of travel
    pub direction: Vec2,
    /// World units per second
    pub speed: f32,
    /// Distance left before the projectile expires
    pub remaining_range: f32,
    pub damage: f32,
    pub kind: DamageKind,
    pub instance: PooledInstance,
}

/// Outcome of advancing a projectile by one step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileStep {
    Flying,
    Hit(RayHit),
    /// Ran out of range without hitting anything
    Expired,
}

impl Projectile {
    /// Move along the direction of travel, stopping at the first thing hit
    pub fn advance<Q: SpatialQuery + ?Sized>(&mut self, dt: f32, query: &Q) -> ProjectileStep {
        if dt <= 0.0 {
            return ProjectileStep::Flying;
        }
        let step = (self.speed * dt).min(self.remaining_range);

        if let Some(hit) = query.raycast(self.position, self.direction, step, Some(self.source)) {
            self.position = hit.point;
            self.remaining_range = (self.remaining_range - hit.distance).max(0.0);
            return ProjectileStep::Hit(hit);
        }

        self.position = self.position + self.direction * step;
        self.remaining_range -= step;
        if self.remaining_range <= f32::EPSILON {
            ProjectileStep::Expired
        } else {
            ProjectileStep::Flying
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::assets::AssetHandle;
    use crate::spatial::query::{ray_circle, Classification};

    /// One circular target on the x axis
    struct Wall {
        id: EntityId,
        center: Vec2,
    }

    impl SpatialQuery for Wall {
        fn raycast(
            &self,
            origin: Vec2,
            direction: Vec2,
            max_distance: f32,
            ignore: Option<EntityId>,
        ) -> Option<RayHit> {
            if ignore == Some(self.id) {
                return None;
            }
            ray_circle(origin, direction, max_distance, self.center, 0.5).map(|(distance, ratio)| {
                RayHit {
                    entity: Some(self.id),
                    point: origin + direction * distance,
                    distance,
                    offset_ratio: ratio,
                }
            })
        }

        fn query_radius(&self, _: Vec2, _: f32, _: Classification) -> Vec<(EntityId, f32)> {
            Vec::new()
        }
    }

    fn rocket(range: f32) -> Projectile {
        Projectile {
            source: EntityId::new(),
            weapon: WeaponId(0),
            position: Vec2::ZERO,
            direction: Vec2::new(1.0, 0.0),
            speed: 10.0,
            remaining_range: range,
            damage: 60.0,
            kind: DamageKind::Explosive,
            instance: PooledInstance {
                id: 0,
                prefab: AssetHandle(0),
            },
        }
    }

    #[test]
    fn test_projectile_hits_target_within_step() {
        let wall = Wall {
            id: EntityId::new(),
            center: Vec2::new(15.0, 0.0),
        };
        let mut projectile = rocket(50.0);

        assert_eq!(projectile.advance(1.0, &wall), ProjectileStep::Flying);
        assert!((projectile.position.x - 10.0).abs() < 1e-4);

        match projectile.advance(1.0, &wall) {
            ProjectileStep::Hit(hit) => {
                assert_eq!(hit.entity, Some(wall.id));
                assert!((hit.point.x - 14.5).abs() < 1e-3);
            }
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[test]
    fn test_projectile_expires_at_range() {
        let wall = Wall {
            id: EntityId::new(),
            center: Vec2::new(100.0, 0.0),
        };
        let mut projectile = rocket(12.0);

        assert_eq!(projectile.advance(1.0, &wall), ProjectileStep::Flying);
        assert_eq!(projectile.advance(1.0, &wall), ProjectileStep::Expired);
        assert!((projectile.position.x - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_projectile_ignores_its_source() {
        let mut projectile = rocket(50.0);
        let wall = Wall {
            id: projectile.source,
            center: Vec2::new(5.0, 0.0),
        };
        assert_eq!(projectile.advance(1.0, &wall), ProjectileStep::Flying);
    }
}
