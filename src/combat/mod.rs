//! Weapons, fire control and damage resolution

pub mod damage_kind;
pub mod fire_control;
pub mod health;
pub mod hit;
pub mod projectile;
pub mod resolver;
pub mod weapons;

pub use damage_kind::{DamageKind, DamageKindDefinition, DamageKindTable, StatusEffect};
pub use fire_control::{Aim, Delivery, FireContext, FirePhase, Pellet, Volley, WeaponInstance};
pub use health::{HealthState, Intake, IntakeRejection};
pub use hit::{DamageEvent, DamageReport, HitLocation};
pub use projectile::{Projectile, ProjectileStep};
pub use resolver::{DamageResolver, DamageTargets};
pub use weapons::{FireMode, GunProfile, ProjectileDefinition, WeaponCatalog, WeaponDefinition, WeaponKind};
