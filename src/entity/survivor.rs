//! Survivor records: skills, behavior state and combat loadout

use crate::core::config::SurvivorConfig;
use crate::core::types::{EntityId, Seconds, TaskId, Vec2, WeaponId};
use serde::{Deserialize, Serialize};

/// Highest skill level a survivor can reach
pub const MAX_SKILL_LEVEL: f32 = 100.0;

/// What a survivor is best at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Combat,
    Medical,
    Gathering,
    Building,
    Scouting,
}

impl Skill {
    pub fn all() -> [Skill; 5] {
        [
            Skill::Combat,
            Skill::Medical,
            Skill::Gathering,
            Skill::Building,
            Skill::Scouting,
        ]
    }
}

/// Behavior state machine states
///
/// `Dead` is terminal and only entered through a death notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorState {
    Idle,
    Defending,
    Gathering,
    Following,
    Building,
    Dead,
}

/// Unarmed attack profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatProfile {
    pub melee_damage: f32,
    pub melee_range: f32,
    /// Attacks per second
    pub attack_rate: f32,
    pub move_speed: f32,
}

impl CombatProfile {
    pub fn from_config(config: &SurvivorConfig) -> Self {
        Self {
            melee_damage: config.melee_damage,
            melee_range: config.melee_range,
            attack_rate: config.base_attack_rate,
            move_speed: config.move_speed,
        }
    }
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self::from_config(&SurvivorConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurvivorRecord {
    pub id: EntityId,
    pub name: String,
    pub primary_skill: Skill,
    skill_level: f32,
    /// Experience banked toward the next level
    pub experience: f32,
    /// Assigned task; the task holds the matching back-reference
    pub task: Option<TaskId>,
    pub state: BehaviorState,
    pub weapon: Option<WeaponId>,
    pub combat_target: Option<EntityId>,
    /// Timestamp of the last unarmed attack
    pub last_attack: Option<Seconds>,
    /// Where the survivor is currently walking; `None` holds position
    pub move_target: Option<Vec2>,
    pub combat: CombatProfile,
}

impl SurvivorRecord {
    pub fn new(id: EntityId, name: impl Into<String>, primary_skill: Skill, skill_level: f32) -> Self {
        Self {
            id,
            name: name.into(),
            primary_skill,
            skill_level: skill_level.clamp(0.0, MAX_SKILL_LEVEL),
            experience: 0.0,
            task: None,
            state: BehaviorState::Idle,
            weapon: None,
            combat_target: None,
            last_attack: None,
            move_target: None,
            combat: CombatProfile::default(),
        }
    }

    pub fn with_combat(mut self, combat: CombatProfile) -> Self {
        self.combat = combat;
        self
    }

    pub fn skill_level(&self) -> f32 {
        self.skill_level
    }

    pub fn set_skill_level(&mut self, level: f32) {
        self.skill_level = level.clamp(0.0, MAX_SKILL_LEVEL);
    }

    pub fn is_dead(&self) -> bool {
        self.state == BehaviorState::Dead
    }

    /// Free to take a task
    pub fn is_available(&self) -> bool {
        self.task.is_none() && !self.is_dead()
    }

    /// Bank experience; every `threshold` points buys one skill level.
    /// Returns the number of levels gained.
    pub fn grant_experience(&mut self, amount: f32, threshold: f32) -> u32 {
        if amount <= 0.0 || threshold <= 0.0 {
            return 0;
        }
        self.experience += amount;
        let mut gained = 0;
        while self.experience >= threshold {
            self.experience -= threshold;
            if self.skill_level < MAX_SKILL_LEVEL {
                self.skill_level = (self.skill_level + 1.0).min(MAX_SKILL_LEVEL);
                gained += 1;
            }
        }
        gained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_level_is_clamped() {
        let mut survivor = SurvivorRecord::new(EntityId::new(), "Ana", Skill::Combat, 140.0);
        assert_eq!(survivor.skill_level(), 100.0);
        survivor.set_skill_level(-5.0);
        assert_eq!(survivor.skill_level(), 0.0);
    }

    #[test]
    fn test_experience_levels_up_at_threshold() {
        let mut survivor = SurvivorRecord::new(EntityId::new(), "Ben", Skill::Building, 10.0);

        assert_eq!(survivor.grant_experience(60.0, 100.0), 0);
        assert_eq!(survivor.grant_experience(60.0, 100.0), 1);
        assert_eq!(survivor.skill_level(), 11.0);
        assert!((survivor.experience - 20.0).abs() < 1e-4);

        assert_eq!(survivor.grant_experience(250.0, 100.0), 2);
        assert_eq!(survivor.skill_level(), 13.0);
    }

    #[test]
    fn test_level_capped_at_max() {
        let mut survivor = SurvivorRecord::new(EntityId::new(), "Cy", Skill::Medical, 99.5);
        assert_eq!(survivor.grant_experience(300.0, 100.0), 1);
        assert_eq!(survivor.skill_level(), MAX_SKILL_LEVEL);
    }

    #[test]
    fn test_dead_survivor_is_not_available() {
        let mut survivor = SurvivorRecord::new(EntityId::new(), "Dee", Skill::Scouting, 0.0);
        assert!(survivor.is_available());
        survivor.state = BehaviorState::Dead;
        assert!(!survivor.is_available());
    }
}
