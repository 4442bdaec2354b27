//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for actors (survivors, hostiles, anything placed in the world)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Short form is enough to tell actors apart in logs
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Identifier of an equipped weapon instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeaponId(pub u32);

/// Identifier of a task on the task board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u32);

/// Simulation time in seconds
pub type Seconds = f64;

/// Which side an actor fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player's base and its survivors
    Colony,
    /// Anything survivors should attack on sight
    Hostile,
    /// Wildlife, props, destructibles
    Neutral,
}

impl Faction {
    pub fn is_hostile_to(&self, other: Faction) -> bool {
        matches!(
            (self, other),
            (Faction::Colony, Faction::Hostile) | (Faction::Hostile, Faction::Colony)
        )
    }
}

/// 2D position / direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` from the +x axis
    pub fn from_angle(radians: f32) -> Self {
        Self { x: radians.cos(), y: radians.sin() }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 0.0001 {
            Self { x: self.x / len, y: self.y / len }
        } else {
            Self::default()
        }
    }

    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Angle from the +x axis in radians
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotate counter-clockwise by `radians`
    pub fn rotated(&self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Step toward `target` by at most `max_step`, never overshooting
    pub fn move_towards(&self, target: Vec2, max_step: f32) -> Self {
        let delta = target - *self;
        let dist = delta.length();
        if dist <= max_step || dist <= f32::EPSILON {
            target
        } else {
            *self + delta * (max_step / dist)
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faction_hostility_is_symmetric() {
        assert!(Faction::Colony.is_hostile_to(Faction::Hostile));
        assert!(Faction::Hostile.is_hostile_to(Faction::Colony));
        assert!(!Faction::Colony.is_hostile_to(Faction::Colony));
        assert!(!Faction::Neutral.is_hostile_to(Faction::Hostile));
    }

    #[test]
    fn test_rotated_quarter_turn() {
        let v = Vec2::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert!(v.x.abs() < 1e-5);
        assert!((v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_move_towards_does_not_overshoot() {
        let start = Vec2::new(0.0, 0.0);
        let target = Vec2::new(3.0, 4.0);
        let step = start.move_towards(target, 2.5);
        assert!((step.distance(&start) - 2.5).abs() < 1e-5);

        let arrived = start.move_towards(target, 10.0);
        assert_eq!(arrived, target);
    }

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }
}
