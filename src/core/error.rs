use crate::core::types::{EntityId, TaskId, WeaponId};
use thiserror::Error;

/// What ran out when an action could not proceed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Shortage {
    #[error("magazine empty")]
    MagazineEmpty,
    #[error("no reserve ammo")]
    ReserveEmpty,
    #[error("asset '{0}' failed to load")]
    Asset(String),
}

/// Why an operation collided with the current state
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conflict {
    #[error("weapon is reloading")]
    Reloading,
    #[error("burst still in progress")]
    BurstInProgress,
    #[error("fire rate gate has not elapsed")]
    CoolingDown,
    #[error("magazine already full")]
    MagazineFull,
    #[error("weapon declares a single fire mode")]
    SingleFireMode,
    #[error("melee weapons have no magazine")]
    NotAGun,
    #[error("survivor already has a task")]
    SurvivorBusy,
    #[error("task already assigned")]
    TaskTaken,
    #[error("task already completed")]
    TaskCompleted,
    #[error("entity is dead")]
    Dead,
}

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Weapon not found: {0:?}")]
    WeaponNotFound(WeaponId),

    #[error("Task not found: {0:?}")]
    TaskNotFound(TaskId),

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(Shortage),

    #[error("State conflict: {0}")]
    StateConflict(Conflict),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl SimError {
    /// True when the failure came from a state-machine gate rather than bad input
    pub fn is_conflict(&self) -> bool {
        matches!(self, SimError::StateConflict(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_cause() {
        let empty = SimError::ResourceUnavailable(Shortage::MagazineEmpty);
        assert_eq!(empty.to_string(), "Resource unavailable: magazine empty");

        let asset = SimError::ResourceUnavailable(Shortage::Asset("fx/rocket".into()));
        assert_eq!(asset.to_string(), "Resource unavailable: asset 'fx/rocket' failed to load");

        let busy = SimError::StateConflict(Conflict::SurvivorBusy);
        assert_eq!(busy.to_string(), "State conflict: survivor already has a task");
        assert!(busy.is_conflict());
        assert!(!empty.is_conflict());
    }
}
