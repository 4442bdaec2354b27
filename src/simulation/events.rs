//! Notifications emitted by the simulation
//!
//! Each event carries a snapshot of the values involved. Events are collected
//! during a tick and handed back to the driver, in the order they happened.

use crate::combat::damage_kind::{DamageKind, StatusEffect};
use crate::combat::weapons::FireMode;
use crate::core::types::{EntityId, Seconds, TaskId, WeaponId};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimulationEvent {
    AmmoChanged {
        weapon: WeaponId,
        owner: EntityId,
        current: u32,
        reserve: u32,
    },
    WeaponFired {
        weapon: WeaponId,
        owner: EntityId,
        mode: FireMode,
        /// Pellets (or projectiles) produced by this shot
        pellets: u32,
    },
    ReloadStarted {
        weapon: WeaponId,
        owner: EntityId,
        duration: Seconds,
    },
    WeaponReloaded {
        weapon: WeaponId,
        owner: EntityId,
        current: u32,
        reserve: u32,
    },
    DamageApplied {
        target: EntityId,
        source: Option<EntityId>,
        amount: f32,
        kind: DamageKind,
        critical: bool,
        /// Secondary hit from area damage
        splash: bool,
    },
    StatusEffectDispatched {
        target: EntityId,
        effect: StatusEffect,
        amount: f32,
    },
    Healed {
        target: EntityId,
        amount: f32,
    },
    EntityDied {
        entity: EntityId,
        killer: Option<EntityId>,
    },
    EntityRemoved {
        entity: EntityId,
    },
    TaskChanged {
        survivor: EntityId,
        previous: Option<TaskId>,
        current: Option<TaskId>,
    },
    TaskCompleted {
        task: TaskId,
        survivor: EntityId,
        experience: f32,
        /// Amount the economy actually accepted, if the task carried a reward
        resources_added: Option<u32>,
    },
}

impl SimulationEvent {
    /// Short tag for logs and summaries
    pub fn label(&self) -> &'static str {
        match self {
            SimulationEvent::AmmoChanged { .. } => "ammo-changed",
            SimulationEvent::WeaponFired { .. } => "weapon-fired",
            SimulationEvent::ReloadStarted { .. } => "reload-started",
            SimulationEvent::WeaponReloaded { .. } => "weapon-reloaded",
            SimulationEvent::DamageApplied { .. } => "damage-applied",
            SimulationEvent::StatusEffectDispatched { .. } => "status-effect",
            SimulationEvent::Healed { .. } => "healed",
            SimulationEvent::EntityDied { .. } => "entity-died",
            SimulationEvent::EntityRemoved { .. } => "entity-removed",
            SimulationEvent::TaskChanged { .. } => "task-changed",
            SimulationEvent::TaskCompleted { .. } => "task-completed",
        }
    }
}
