//! Hit values handed from weapons to the damage resolver

use crate::combat::damage_kind::DamageKind;
use crate::core::types::EntityId;
use serde::{Deserialize, Serialize};

/// Where on the target a hit landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitLocation {
    Body,
    Head,
    Limb,
}

impl HitLocation {
    /// Map a directional hit's offset ratio (perpendicular miss distance over
    /// target radius) onto a location
    ///
    /// The centre band is the torso. A narrow band just outside it is the
    /// head, and anything wider clips a limb.
    pub fn from_offset_ratio(ratio: f32, body_ratio: f32, head_ratio: f32) -> Self {
        if ratio <= body_ratio {
            HitLocation::Body
        } else if ratio <= head_ratio {
            HitLocation::Head
        } else {
            HitLocation::Limb
        }
    }
}

/// A raw hit, produced by fire control or melee logic and consumed immediately
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target: EntityId,
    pub source: Option<EntityId>,
    pub amount: f32,
    pub kind: DamageKind,
    pub location: HitLocation,
}

impl DamageEvent {
    pub fn new(target: EntityId, amount: f32, kind: DamageKind) -> Self {
        Self {
            target,
            source: None,
            amount,
            kind,
            location: HitLocation::Body,
        }
    }

    pub fn from_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn at(mut self, location: HitLocation) -> Self {
        self.location = location;
        self
    }
}

/// Outcome of resolving one `DamageEvent`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageReport {
    /// Damage after location and critical multipliers; 0 when rejected
    pub final_damage: f32,
    pub critical: bool,
    /// Whether the primary target's health actually changed
    pub applied: bool,
    pub killed: bool,
    /// Secondary targets that took splash damage
    pub splash_hits: usize,
}

impl DamageReport {
    pub fn rejected() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_ratio_zones() {
        // Centred aim lands on the torso, not the head
        assert_eq!(HitLocation::from_offset_ratio(0.0, 0.5, 0.65), HitLocation::Body);
        assert_eq!(HitLocation::from_offset_ratio(0.5, 0.5, 0.65), HitLocation::Body);
        assert_eq!(HitLocation::from_offset_ratio(0.6, 0.5, 0.65), HitLocation::Head);
        assert_eq!(HitLocation::from_offset_ratio(0.65, 0.5, 0.65), HitLocation::Head);
        assert_eq!(HitLocation::from_offset_ratio(0.95, 0.5, 0.65), HitLocation::Limb);
    }
}
