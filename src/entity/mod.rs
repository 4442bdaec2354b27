pub mod survivor;
pub mod tasks;

pub use survivor::{BehaviorState, CombatProfile, Skill, SurvivorRecord};
pub use tasks::{ResourceReward, Task, TaskBoard, TaskKind, TaskTarget};
