//! Simulation configuration with documented constants
//!
//! All tunable numbers are collected here with a note on what they drive.
//! Every section deserializes with defaults, so a TOML file only needs to
//! name the values it overrides.

use crate::core::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the whole simulation, passed into `World::new`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub damage: DamageConfig,
    pub weapons: WeaponConfig,
    pub area: AreaConfig,
    pub survivors: SurvivorConfig,
    pub tasks: TaskConfig,
    pub spatial: SpatialConfig,
    /// Seed for the simulation RNG (crit rolls, spread)
    pub seed: u64,
}

// === DAMAGE RESOLUTION ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageConfig {
    /// Location multiplier for hits on the head (must be > 1)
    pub headshot_multiplier: f32,

    /// Location multiplier for hits on a limb
    pub limb_multiplier: f32,

    /// Multiplier applied once when a hit is critical
    ///
    /// Head hits are always critical, so a headshot deals
    /// `base * headshot_multiplier * critical_multiplier`.
    pub critical_multiplier: f32,

    /// Chance in [0, 1] that any hit rolls critical regardless of location
    pub critical_chance: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            headshot_multiplier: 1.5,
            limb_multiplier: 0.8,
            critical_multiplier: 2.0,
            critical_chance: 0.05,
        }
    }
}

// === WEAPONS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Shots produced by one burst trigger pull
    pub burst_count: u32,

    /// Seconds between shots inside a burst
    ///
    /// Must stay below every burst weapon's fire interval, otherwise the
    /// burst would outlast the gate it is meant to sit inside.
    pub burst_interval: f64,

    /// Multi-pellet weapons spread each pellet over this many times the base spread
    pub pellet_spread_multiplier: f32,

    /// Offset ratio (perpendicular distance / target radius) at or below which
    /// a directional hit counts as a body hit
    pub body_zone_ratio: f32,

    /// Upper edge of the head band that starts at `body_zone_ratio`;
    /// anything wider is a limb
    pub head_zone_ratio: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            burst_count: 3,
            burst_interval: 0.1,
            pellet_spread_multiplier: 2.0,
            body_zone_ratio: 0.5,
            head_zone_ratio: 0.65,
        }
    }
}

// === AREA DAMAGE ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AreaConfig {
    /// Splash radius = base damage * this factor, before clamping
    pub radius_factor: f32,
    pub min_radius: f32,
    pub max_radius: f32,

    /// Splash damage = base damage * falloff * this factor
    pub damage_factor: f32,
}

impl Default for AreaConfig {
    fn default() -> Self {
        Self {
            radius_factor: 0.1,
            min_radius: 2.0,
            max_radius: 10.0,
            damage_factor: 0.5,
        }
    }
}

// === SURVIVORS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurvivorConfig {
    /// How far an idle or defending survivor scans for hostiles
    pub detection_range: f32,

    /// A combat target further than this is dropped
    pub leash_range: f32,

    /// Distance at which a survivor counts as arrived at a task location
    pub arrival_radius: f32,

    /// Distance kept behind a followed entity
    pub follow_distance: f32,

    /// Seconds a dead survivor stays in the active set before removal
    pub death_grace: f64,

    /// Movement speed in world units per second
    pub move_speed: f32,

    /// Unarmed attack profile
    pub melee_damage: f32,
    pub melee_range: f32,
    /// Unarmed attacks per second
    pub base_attack_rate: f32,
}

impl Default for SurvivorConfig {
    fn default() -> Self {
        Self {
            detection_range: 15.0,
            leash_range: 30.0,
            arrival_radius: 1.5,
            follow_distance: 2.5,
            death_grace: 3.0,
            move_speed: 4.0,
            melee_damage: 10.0,
            melee_range: 1.5,
            base_attack_rate: 1.0,
        }
    }
}

// === TASKS ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Experience granted on task completion
    pub experience_reward: f32,

    /// Experience needed for +1 skill level
    pub level_up_threshold: f32,

    /// Assign idle survivors to open tasks at the start of each tick
    pub auto_assign: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            experience_reward: 10.0,
            level_up_threshold: 100.0,
            auto_assign: true,
        }
    }
}

// === SPATIAL ===

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Roughly the splash radius range; radius queries walk
    /// `ceil(radius / cell)` rings of cells.
    pub grid_cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { grid_cell_size: 5.0 }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let d = &self.damage;
        if d.headshot_multiplier <= 1.0 {
            return Err(SimError::Config(format!(
                "headshot_multiplier ({}) must be > 1",
                d.headshot_multiplier
            )));
        }
        if !(0.0..=1.0).contains(&d.critical_chance) {
            return Err(SimError::Config(format!(
                "critical_chance ({}) must be within [0, 1]",
                d.critical_chance
            )));
        }
        if d.critical_multiplier < 1.0 || d.limb_multiplier < 0.0 {
            return Err(SimError::Config(
                "critical_multiplier must be >= 1 and limb_multiplier >= 0".into(),
            ));
        }

        let w = &self.weapons;
        if w.burst_count == 0 || w.burst_interval <= 0.0 {
            return Err(SimError::Config("burst needs at least one shot and a positive interval".into()));
        }
        if w.body_zone_ratio > w.head_zone_ratio {
            return Err(SimError::Config(format!(
                "body_zone_ratio ({}) should be <= head_zone_ratio ({})",
                w.body_zone_ratio, w.head_zone_ratio
            )));
        }

        let a = &self.area;
        if a.min_radius <= 0.0 || a.min_radius > a.max_radius {
            return Err(SimError::Config(format!(
                "splash radius bounds [{}, {}] are invalid",
                a.min_radius, a.max_radius
            )));
        }

        let s = &self.survivors;
        if s.leash_range < s.detection_range {
            return Err(SimError::Config(format!(
                "leash_range ({}) should be >= detection_range ({})",
                s.leash_range, s.detection_range
            )));
        }
        if s.base_attack_rate <= 0.0 || s.move_speed < 0.0 || s.death_grace < 0.0 {
            return Err(SimError::Config("survivor rates must be positive".into()));
        }

        if self.tasks.level_up_threshold <= 0.0 {
            return Err(SimError::Config("level_up_threshold must be positive".into()));
        }
        if self.spatial.grid_cell_size <= 0.0 {
            return Err(SimError::Config("grid_cell_size must be positive".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [damage]
            headshot_multiplier = 3.0
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.damage.headshot_multiplier, 3.0);
        assert_eq!(config.damage.critical_multiplier, 2.0);
        assert_eq!(config.weapons.burst_count, 3);
    }

    #[test]
    fn test_headshot_multiplier_must_exceed_one() {
        let result = SimulationConfig::from_toml_str("[damage]\nheadshot_multiplier = 1.0\n");
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        let result = SimulationConfig::from_toml_str("[damage\n");
        assert!(matches!(result, Err(SimError::Toml(_))));
    }
}
