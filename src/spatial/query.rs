//! Spatial query service consumed by the combat and behavior code
//!
//! Two questions only: what does a ray hit first, and who is near a point.

use crate::core::types::{EntityId, Faction, Vec2};

/// Filter for radius queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Any,
    /// Living entities with health
    Damageable,
    /// Living entities hostile to the given faction
    HostileTo(Faction),
    /// Living entities of exactly this faction
    Member(Faction),
}

/// First thing a directional query ran into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// `None` when the ray hit a static obstacle
    pub entity: Option<EntityId>,
    pub point: Vec2,
    pub distance: f32,
    /// Perpendicular miss distance over the hit circle's radius, in [0, 1]
    pub offset_ratio: f32,
}

pub trait SpatialQuery {
    /// Nearest blocking entity or obstacle along the ray, ignoring `ignore`
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        ignore: Option<EntityId>,
    ) -> Option<RayHit>;

    /// Entities within `radius` of `center` matching `filter`, nearest first
    fn query_radius(&self, center: Vec2, radius: f32, filter: Classification) -> Vec<(EntityId, f32)>;
}

/// Ray / circle intersection. Returns the entry distance along the ray and
/// the offset ratio, or `None` on a miss or a hit beyond `max_distance`.
pub fn ray_circle(
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    center: Vec2,
    radius: f32,
) -> Option<(f32, f32)> {
    if radius <= 0.0 {
        return None;
    }
    let dir = direction.normalize();
    let to_center = center - origin;
    let along = to_center.dot(&dir);
    let perp_sq = (to_center.dot(&to_center) - along * along).max(0.0);
    let radius_sq = radius * radius;
    if perp_sq > radius_sq {
        return None;
    }

    let half_chord = (radius_sq - perp_sq).sqrt();
    let entry = along - half_chord;
    // Origin inside the circle counts as an immediate hit
    let distance = if entry < 0.0 {
        if along + half_chord < 0.0 {
            return None;
        }
        0.0
    } else {
        entry
    };
    if distance > max_distance {
        return None;
    }
    Some((distance, perp_sq.sqrt() / radius))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_circle_center_hit() {
        let (distance, ratio) =
            ray_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), 20.0, Vec2::new(10.0, 0.0), 1.0).unwrap();
        assert!((distance - 9.0).abs() < 1e-5);
        assert!(ratio.abs() < 1e-5);
    }

    #[test]
    fn test_ray_circle_grazing_hit_has_high_ratio() {
        let (_, ratio) =
            ray_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), 20.0, Vec2::new(10.0, 0.9), 1.0).unwrap();
        assert!((ratio - 0.9).abs() < 1e-4);
    }

    #[test]
    fn test_ray_circle_misses() {
        // Off to the side
        assert!(ray_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), 20.0, Vec2::new(10.0, 3.0), 1.0).is_none());
        // Behind the origin
        assert!(ray_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), 20.0, Vec2::new(-10.0, 0.0), 1.0).is_none());
        // Beyond range
        assert!(ray_circle(Vec2::ZERO, Vec2::new(1.0, 0.0), 5.0, Vec2::new(10.0, 0.0), 1.0).is_none());
    }

    #[test]
    fn test_origin_inside_circle() {
        let (distance, _) =
            ray_circle(Vec2::new(10.0, 0.0), Vec2::new(0.0, 1.0), 5.0, Vec2::new(10.0, 0.2), 1.0).unwrap();
        assert_eq!(distance, 0.0);
    }
}
