//! Weapon definitions
//!
//! A definition is static data shared by every instance of a weapon.
//! Weapon kinds form a closed set: melee weapons gate on attack rate only,
//! guns add a magazine, fire modes, spread and optional projectiles.

use crate::combat::damage_kind::DamageKind;
use crate::core::error::{Result, SimError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How many shots one attack attempt produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireMode {
    Single,
    Burst,
    /// Caller re-invokes fire every tick while the trigger is held
    Auto,
}

/// Travelling projectile spawned instead of a hitscan query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileDefinition {
    /// Prefab address handed to the asset provider
    pub prefab: String,
    /// World units per second
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GunProfile {
    pub magazine_size: u32,
    pub max_ammo: u32,
    /// Reserve granted on equip, clamped to `max_ammo`
    pub starting_reserve: u32,
    /// Seconds
    pub reload_time: f64,
    /// Supported modes in cycling order; the first is selected on equip
    pub fire_modes: Vec<FireMode>,
    /// Half-angle of the aim cone in radians
    #[serde(default)]
    pub spread_angle: f32,
    #[serde(default = "one")]
    pub projectiles_per_shot: u32,
    #[serde(default)]
    pub projectile: Option<ProjectileDefinition>,
}

fn one() -> u32 {
    1
}

/// Closed set of weapon kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WeaponKind {
    Melee,
    Gun(GunProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDefinition {
    pub name: String,
    /// Nominal damage of one attack (all pellets together for multi-pellet guns)
    pub damage: f32,
    /// Attacks per second; the fire-rate gate is `1 / attack_rate`
    pub attack_rate: f32,
    pub range: f32,
    pub damage_kind: DamageKind,
    pub kind: WeaponKind,
    #[serde(default)]
    pub fire_sound: Option<String>,
    #[serde(default)]
    pub muzzle_effect: Option<String>,
}

impl WeaponDefinition {
    pub fn gun(&self) -> Option<&GunProfile> {
        match &self.kind {
            WeaponKind::Gun(profile) => Some(profile),
            WeaponKind::Melee => None,
        }
    }

    pub fn is_melee(&self) -> bool {
        matches!(self.kind, WeaponKind::Melee)
    }

    /// Seconds between accepted attack attempts
    pub fn fire_interval(&self) -> f64 {
        1.0 / f64::from(self.attack_rate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attack_rate <= 0.0 || self.damage < 0.0 || self.range <= 0.0 {
            return Err(SimError::Config(format!(
                "weapon '{}' needs positive attack_rate and range",
                self.name
            )));
        }
        if let WeaponKind::Gun(gun) = &self.kind {
            if gun.magazine_size == 0 || gun.fire_modes.is_empty() {
                return Err(SimError::Config(format!(
                    "gun '{}' needs a magazine and at least one fire mode",
                    self.name
                )));
            }
            if gun.projectiles_per_shot == 0 || gun.reload_time < 0.0 || gun.spread_angle < 0.0 {
                return Err(SimError::Config(format!(
                    "gun '{}' has invalid pellet count, reload time or spread",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Common weapon: semi-automatic pistol
    pub fn pistol() -> Self {
        Self {
            name: "pistol".into(),
            damage: 20.0,
            attack_rate: 4.0,
            range: 30.0,
            damage_kind: DamageKind::Physical,
            kind: WeaponKind::Gun(GunProfile {
                magazine_size: 12,
                max_ammo: 60,
                starting_reserve: 36,
                reload_time: 1.2,
                fire_modes: vec![FireMode::Single],
                spread_angle: 0.02,
                projectiles_per_shot: 1,
                projectile: None,
            }),
            fire_sound: Some("audio/pistol_shot".into()),
            muzzle_effect: Some("fx/muzzle_small".into()),
        }
    }

    /// Common weapon: rifle with auto, burst and single modes
    pub fn rifle() -> Self {
        Self {
            name: "rifle".into(),
            damage: 15.0,
            attack_rate: 2.5,
            range: 45.0,
            damage_kind: DamageKind::Physical,
            kind: WeaponKind::Gun(GunProfile {
                magazine_size: 30,
                max_ammo: 180,
                starting_reserve: 90,
                reload_time: 2.0,
                fire_modes: vec![FireMode::Auto, FireMode::Burst, FireMode::Single],
                spread_angle: 0.04,
                projectiles_per_shot: 1,
                projectile: None,
            }),
            fire_sound: Some("audio/rifle_shot".into()),
            muzzle_effect: Some("fx/muzzle_medium".into()),
        }
    }

    /// Common weapon: pump shotgun, eight pellets
    pub fn shotgun() -> Self {
        Self {
            name: "shotgun".into(),
            damage: 80.0,
            attack_rate: 1.0,
            range: 15.0,
            damage_kind: DamageKind::Physical,
            kind: WeaponKind::Gun(GunProfile {
                magazine_size: 6,
                max_ammo: 36,
                starting_reserve: 18,
                reload_time: 2.5,
                fire_modes: vec![FireMode::Single],
                spread_angle: 0.05,
                projectiles_per_shot: 8,
                projectile: None,
            }),
            fire_sound: Some("audio/shotgun_blast".into()),
            muzzle_effect: Some("fx/muzzle_large".into()),
        }
    }

    /// Common weapon: rocket launcher firing explosive projectiles
    pub fn rocket_launcher() -> Self {
        Self {
            name: "rocket_launcher".into(),
            damage: 60.0,
            attack_rate: 0.5,
            range: 60.0,
            damage_kind: DamageKind::Explosive,
            kind: WeaponKind::Gun(GunProfile {
                magazine_size: 1,
                max_ammo: 8,
                starting_reserve: 4,
                reload_time: 3.0,
                fire_modes: vec![FireMode::Single],
                spread_angle: 0.0,
                projectiles_per_shot: 1,
                projectile: Some(ProjectileDefinition {
                    prefab: "prefabs/rocket".into(),
                    speed: 25.0,
                }),
            }),
            fire_sound: Some("audio/rocket_launch".into()),
            muzzle_effect: None,
        }
    }

    /// Common weapon: machete
    pub fn machete() -> Self {
        Self {
            name: "machete".into(),
            damage: 25.0,
            attack_rate: 1.5,
            range: 2.0,
            damage_kind: DamageKind::Physical,
            kind: WeaponKind::Melee,
            fire_sound: Some("audio/blade_swing".into()),
            muzzle_effect: None,
        }
    }
}

/// All weapon definitions known to the simulation
#[derive(Debug, Clone, Default)]
pub struct WeaponCatalog {
    weapons: Vec<WeaponDefinition>,
}

impl WeaponCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        Self {
            weapons: vec![
                WeaponDefinition::pistol(),
                WeaponDefinition::rifle(),
                WeaponDefinition::shotgun(),
                WeaponDefinition::rocket_launcher(),
                WeaponDefinition::machete(),
            ],
        }
    }

    /// Add a definition, replacing any existing one with the same name
    pub fn add(&mut self, definition: WeaponDefinition) {
        self.weapons.retain(|w| w.name != definition.name);
        self.weapons.push(definition);
    }

    pub fn get(&self, name: &str) -> Option<&WeaponDefinition> {
        self.weapons.iter().find(|w| w.name == name)
    }

    pub fn all(&self) -> &[WeaponDefinition] {
        &self.weapons
    }

    pub fn load_from_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    pub fn parse_toml(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct TomlWeapons {
            weapons: Vec<WeaponDefinition>,
        }

        let parsed: TomlWeapons = toml::from_str(content)?;
        let mut catalog = Self::new();
        for definition in parsed.weapons {
            definition.validate()?;
            catalog.add(definition);
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = WeaponCatalog::with_defaults();
        assert_eq!(catalog.all().len(), 5);
        for weapon in catalog.all() {
            assert!(weapon.validate().is_ok(), "{} should validate", weapon.name);
        }
    }

    #[test]
    fn test_melee_has_no_gun_profile() {
        let machete = WeaponDefinition::machete();
        assert!(machete.is_melee());
        assert!(machete.gun().is_none());
        assert!(WeaponDefinition::pistol().gun().is_some());
    }

    #[test]
    fn test_fire_interval() {
        let pistol = WeaponDefinition::pistol();
        assert!((pistol.fire_interval() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_parse_toml_weapons() {
        let catalog = WeaponCatalog::parse_toml(
            r#"
            [[weapons]]
            name = "nailgun"
            damage = 8.0
            attack_rate = 6.0
            range = 20.0
            damage_kind = "Physical"

            [weapons.kind]
            type = "Gun"
            magazine_size = 40
            max_ammo = 200
            starting_reserve = 80
            reload_time = 1.5
            fire_modes = ["Auto", "Single"]

            [[weapons]]
            name = "crowbar"
            damage = 12.0
            attack_rate = 1.0
            range = 1.8
            damage_kind = "Physical"
            kind = { type = "Melee" }
            "#,
        )
        .unwrap();

        let nailgun = catalog.get("nailgun").unwrap();
        let gun = nailgun.gun().unwrap();
        assert_eq!(gun.magazine_size, 40);
        assert_eq!(gun.projectiles_per_shot, 1);
        assert_eq!(gun.fire_modes, vec![FireMode::Auto, FireMode::Single]);
        assert!(catalog.get("crowbar").unwrap().is_melee());
    }

    #[test]
    fn test_parse_toml_rejects_empty_magazine() {
        let result = WeaponCatalog::parse_toml(
            r#"
            [[weapons]]
            name = "broken"
            damage = 8.0
            attack_rate = 6.0
            range = 20.0
            damage_kind = "Physical"
            kind = { type = "Gun", magazine_size = 0, max_ammo = 10, starting_reserve = 0, reload_time = 1.0, fire_modes = ["Single"] }
            "#,
        );
        assert!(matches!(result, Err(SimError::Config(_))));
    }
}
