//! Damage resolution
//!
//! Turns a raw hit into final damage: location multiplier, critical roll,
//! health intake on the target, then status effect and area splash.
//! The resolver owns no entity state; it reaches targets through the
//! `DamageTargets` capability.

use crate::combat::damage_kind::DamageKindTable;
use crate::combat::health::{HealthState, Intake};
use crate::combat::hit::{DamageEvent, DamageReport, HitLocation};
use crate::core::config::{AreaConfig, DamageConfig, SimulationConfig};
use crate::core::types::{EntityId, Vec2};
use crate::simulation::events::SimulationEvent;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// What the resolver needs from the world
pub trait DamageTargets {
    /// `None` when the entity is unknown or has no health
    fn health_mut(&mut self, id: EntityId) -> Option<&mut HealthState>;

    fn position_of(&self, id: EntityId) -> Option<Vec2>;

    /// Living damageable entities within `radius` of `center`, excluding
    /// `exclude`, paired with their distance
    fn damageable_within(&self, center: Vec2, radius: f32, exclude: EntityId) -> Vec<(EntityId, f32)>;
}

#[derive(Debug, Clone)]
pub struct DamageResolver {
    damage: DamageConfig,
    area: AreaConfig,
    kinds: DamageKindTable,
    rng: ChaCha8Rng,
}

impl DamageResolver {
    pub fn new(damage: DamageConfig, area: AreaConfig, kinds: DamageKindTable, seed: u64) -> Self {
        Self {
            damage,
            area,
            kinds,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &SimulationConfig, kinds: DamageKindTable) -> Self {
        Self::new(config.damage.clone(), config.area.clone(), kinds, config.seed)
    }

    pub fn kinds(&self) -> &DamageKindTable {
        &self.kinds
    }

    pub fn location_multiplier(&self, location: HitLocation) -> f32 {
        match location {
            HitLocation::Head => self.damage.headshot_multiplier,
            HitLocation::Limb => self.damage.limb_multiplier,
            HitLocation::Body => 1.0,
        }
    }

    /// Splash radius for a hit of `base` damage
    pub fn splash_radius(&self, base: f32) -> f32 {
        (base * self.area.radius_factor).clamp(self.area.min_radius, self.area.max_radius)
    }

    fn roll_critical(&mut self, location: HitLocation) -> bool {
        // Always draw so the RNG stream does not depend on hit location
        let rolled = self.rng.gen::<f32>() < self.damage.critical_chance;
        rolled || location == HitLocation::Head
    }

    pub fn apply_damage<T: DamageTargets + ?Sized>(
        &mut self,
        targets: &mut T,
        hit: &DamageEvent,
        events: &mut Vec<SimulationEvent>,
    ) -> DamageReport {
        if targets.health_mut(hit.target).is_none() {
            tracing::trace!("Damage to {} ignored: no health", hit.target);
            return DamageReport::rejected();
        }

        let mut final_damage = hit.amount * self.location_multiplier(hit.location);
        let critical = self.roll_critical(hit.location);
        if critical {
            final_damage *= self.damage.critical_multiplier;
        }

        let intake = match targets.health_mut(hit.target) {
            Some(health) => health.take_damage(final_damage),
            None => return DamageReport::rejected(),
        };
        let killed = match intake {
            Intake::Applied { killed, .. } => killed,
            Intake::Rejected(reason) => {
                tracing::trace!("Damage to {} rejected: {:?}", hit.target, reason);
                return DamageReport::rejected();
            }
        };
        if killed {
            events.push(SimulationEvent::EntityDied {
                entity: hit.target,
                killer: hit.source,
            });
        }

        let definition = self.kinds.get(hit.kind);
        if let Some(effect) = definition.status_effect {
            events.push(SimulationEvent::StatusEffectDispatched {
                target: hit.target,
                effect,
                amount: final_damage,
            });
        }

        let splash_hits = if definition.area_multiplier.is_some() {
            self.apply_splash(targets, hit, events)
        } else {
            0
        };

        events.push(SimulationEvent::DamageApplied {
            target: hit.target,
            source: hit.source,
            amount: final_damage,
            kind: hit.kind,
            critical,
            splash: false,
        });

        DamageReport {
            final_damage,
            critical,
            applied: true,
            killed,
            splash_hits,
        }
    }

    /// Falloff damage around the primary target. Secondary hits go straight
    /// to health intake, so they never splash or dispatch effects themselves.
    fn apply_splash<T: DamageTargets + ?Sized>(
        &mut self,
        targets: &mut T,
        hit: &DamageEvent,
        events: &mut Vec<SimulationEvent>,
    ) -> usize {
        let Some(center) = targets.position_of(hit.target) else {
            return 0;
        };
        let radius = self.splash_radius(hit.amount);
        let snapshot = targets.damageable_within(center, radius, hit.target);

        let mut hits = 0;
        for (id, distance) in snapshot {
            let falloff = 1.0 - (distance / radius).clamp(0.0, 1.0);
            let amount = hit.amount * falloff * self.area.damage_factor;

            // Entities killed earlier in this loop reject here
            let Some(health) = targets.health_mut(id) else {
                continue;
            };
            if let Intake::Applied { killed, .. } = health.take_damage(amount) {
                hits += 1;
                if killed {
                    events.push(SimulationEvent::EntityDied {
                        entity: id,
                        killer: hit.source,
                    });
                }
                events.push(SimulationEvent::DamageApplied {
                    target: id,
                    source: hit.source,
                    amount,
                    kind: hit.kind,
                    critical: false,
                    splash: true,
                });
            }
        }

        if hits > 0 {
            tracing::debug!("Splash from {} hit {} targets (radius {:.1})", hit.target, hits, radius);
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::damage_kind::{DamageKind, StatusEffect};
    use ahash::AHashMap;

    /// Minimal target store for resolver tests
    #[derive(Default)]
    struct Targets {
        entries: AHashMap<EntityId, (Vec2, Option<HealthState>)>,
    }

    impl Targets {
        fn add(&mut self, pos: Vec2, health: Option<HealthState>) -> EntityId {
            let id = EntityId::new();
            self.entries.insert(id, (pos, health));
            id
        }

        fn health(&self, id: EntityId) -> f32 {
            self.entries[&id].1.as_ref().map(|h| h.current()).unwrap_or(-1.0)
        }
    }

    impl DamageTargets for Targets {
        fn health_mut(&mut self, id: EntityId) -> Option<&mut HealthState> {
            self.entries.get_mut(&id).and_then(|(_, h)| h.as_mut())
        }

        fn position_of(&self, id: EntityId) -> Option<Vec2> {
            self.entries.get(&id).map(|(p, _)| *p)
        }

        fn damageable_within(&self, center: Vec2, radius: f32, exclude: EntityId) -> Vec<(EntityId, f32)> {
            self.entries
                .iter()
                .filter(|(id, (_, h))| **id != exclude && h.as_ref().is_some_and(|h| h.is_alive()))
                .map(|(id, (p, _))| (*id, p.distance(&center)))
                .filter(|(_, d)| *d <= radius)
                .collect()
        }
    }

    fn no_crit_resolver() -> DamageResolver {
        let damage = DamageConfig {
            critical_chance: 0.0,
            ..DamageConfig::default()
        };
        DamageResolver::new(damage, AreaConfig::default(), DamageKindTable::with_defaults(), 1)
    }

    #[test]
    fn test_body_hit_without_crit() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(100.0)));
        let mut events = Vec::new();

        let report = no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(target, 40.0, DamageKind::Physical),
            &mut events,
        );

        assert_eq!(report.final_damage, 40.0);
        assert!(!report.critical);
        assert_eq!(targets.health(target), 60.0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_head_hit_is_always_critical() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(500.0)));
        let mut events = Vec::new();

        let report = no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(target, 40.0, DamageKind::Physical).at(HitLocation::Head),
            &mut events,
        );

        assert!(report.critical);
        assert!((report.final_damage - 120.0).abs() < 1e-4);
    }

    #[test]
    fn test_limb_multiplier() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(100.0)));
        let report = no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(target, 50.0, DamageKind::Physical).at(HitLocation::Limb),
            &mut Vec::new(),
        );
        assert!((report.final_damage - 40.0).abs() < 1e-4);
    }

    #[test]
    fn test_target_without_health_is_rejected() {
        let mut targets = Targets::default();
        let prop = targets.add(Vec2::ZERO, None);
        let mut events = Vec::new();

        let report = no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(prop, 40.0, DamageKind::Fire),
            &mut events,
        );

        assert_eq!(report, DamageReport::rejected());
        assert!(events.is_empty());
    }

    #[test]
    fn test_fire_dispatches_status_effect() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(100.0)));
        let mut events = Vec::new();

        no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(target, 10.0, DamageKind::Fire),
            &mut events,
        );

        assert!(events.contains(&SimulationEvent::StatusEffectDispatched {
            target,
            effect: StatusEffect::Burning,
            amount: 10.0,
        }));
    }

    #[test]
    fn test_explosive_splash_falls_off_with_distance() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(1000.0)));
        // base 50 -> radius clamp(5, 2, 10) = 5
        let near = targets.add(Vec2::new(1.0, 0.0), Some(HealthState::new(100.0)));
        let far = targets.add(Vec2::new(4.0, 0.0), Some(HealthState::new(100.0)));
        let outside = targets.add(Vec2::new(6.0, 0.0), Some(HealthState::new(100.0)));
        let mut events = Vec::new();

        let report = no_crit_resolver().apply_damage(
            &mut targets,
            &DamageEvent::new(target, 50.0, DamageKind::Explosive),
            &mut events,
        );

        assert_eq!(report.splash_hits, 2);
        // near: 50 * (1 - 0.2) * 0.5 = 20
        assert!((targets.health(near) - 80.0).abs() < 1e-3);
        // far: 50 * (1 - 0.8) * 0.5 = 5
        assert!((targets.health(far) - 95.0).abs() < 1e-3);
        assert_eq!(targets.health(outside), 100.0);
    }

    #[test]
    fn test_splash_kill_reports_death_once() {
        let mut targets = Targets::default();
        let target = targets.add(Vec2::ZERO, Some(HealthState::new(1000.0)));
        let weak = targets.add(Vec2::new(0.5, 0.0), Some(HealthState::new(5.0)));
        let mut events = Vec::new();
        let mut resolver = no_crit_resolver();

        for _ in 0..3 {
            resolver.apply_damage(
                &mut targets,
                &DamageEvent::new(target, 40.0, DamageKind::Explosive),
                &mut events,
            );
        }

        let deaths = events
            .iter()
            .filter(|e| matches!(e, SimulationEvent::EntityDied { entity, .. } if *entity == weak))
            .count();
        assert_eq!(deaths, 1);
    }

    #[test]
    fn test_splash_radius_clamped() {
        let resolver = no_crit_resolver();
        assert_eq!(resolver.splash_radius(5.0), 2.0);
        assert_eq!(resolver.splash_radius(50.0), 5.0);
        assert_eq!(resolver.splash_radius(500.0), 10.0);
    }
}
