//! Task scheduling: matching idle survivors to open tasks and advancing
//! assigned work.
//!
//! Assignment is symmetric: the survivor points at its task and the task
//! points back. Assigning resets progress to 0; unassigning keeps it.

use crate::core::config::TaskConfig;
use crate::core::error::{Conflict, Result, SimError};
use crate::core::types::{Seconds, TaskId};
use crate::entity::survivor::{BehaviorState, SurvivorRecord};
use crate::entity::tasks::{Task, TaskBoard};
use crate::services::economy::ResourceEconomy;
use crate::simulation::events::SimulationEvent;

/// Below this health fraction a survivor works slower
const WOUNDED_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Default)]
pub struct TaskScheduler {
    config: TaskConfig,
}

impl TaskScheduler {
    pub fn new(config: TaskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Match quality of a survivor for a task
    ///
    /// `1 + (skill match ? 2 : 0) + level / 50`
    pub fn score(survivor: &SurvivorRecord, task: &Task) -> f32 {
        let skill_bonus = if survivor.primary_skill == task.required_skill {
            2.0
        } else {
            0.0
        };
        1.0 + skill_bonus + survivor.skill_level() / 50.0
    }

    /// Open task with the strictly highest score; ties keep the earliest task
    pub fn best_task(&self, survivor: &SurvivorRecord, board: &TaskBoard) -> Option<TaskId> {
        let mut best: Option<(TaskId, f32)> = None;
        for task in board.open() {
            let score = Self::score(survivor, task);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((task.id, score)),
            }
        }
        best.map(|(id, _)| id)
    }

    pub fn assign(
        &self,
        survivor: &mut SurvivorRecord,
        board: &mut TaskBoard,
        task_id: TaskId,
        events: &mut Vec<SimulationEvent>,
    ) -> Result<()> {
        if survivor.is_dead() {
            return Err(SimError::StateConflict(Conflict::Dead));
        }
        if survivor.task.is_some() {
            return Err(SimError::StateConflict(Conflict::SurvivorBusy));
        }
        let task = board.get_mut(task_id).ok_or(SimError::TaskNotFound(task_id))?;
        if task.is_completed() {
            return Err(SimError::StateConflict(Conflict::TaskCompleted));
        }
        if task.assigned.is_some() {
            return Err(SimError::StateConflict(Conflict::TaskTaken));
        }

        task.assigned = Some(survivor.id);
        task.reset_progress();
        survivor.task = Some(task_id);
        survivor.state = task.kind.behavior();

        tracing::debug!("{} assigned to task {:?} ({:?})", survivor.name, task_id, task.kind);
        events.push(SimulationEvent::TaskChanged {
            survivor: survivor.id,
            previous: None,
            current: Some(task_id),
        });
        Ok(())
    }

    /// Clear both sides of the assignment; progress is left as it was
    pub fn unassign(
        &self,
        survivor: &mut SurvivorRecord,
        board: &mut TaskBoard,
        events: &mut Vec<SimulationEvent>,
    ) -> Option<TaskId> {
        let task_id = survivor.task.take()?;
        if let Some(task) = board.get_mut(task_id) {
            if task.assigned == Some(survivor.id) {
                task.assigned = None;
            }
        }
        if !survivor.is_dead() {
            survivor.state = BehaviorState::Idle;
        }

        tracing::debug!("{} released task {:?}", survivor.name, task_id);
        events.push(SimulationEvent::TaskChanged {
            survivor: survivor.id,
            previous: Some(task_id),
            current: None,
        });
        Some(task_id)
    }

    /// Give every available survivor its best open task, in roster order.
    /// Returns how many assignments were made.
    pub fn assign_idle(
        &self,
        survivors: &mut [SurvivorRecord],
        board: &mut TaskBoard,
        events: &mut Vec<SimulationEvent>,
    ) -> usize {
        let mut assigned = 0;
        for survivor in survivors.iter_mut().filter(|s| s.is_available()) {
            let Some(task_id) = self.best_task(survivor, board) else {
                continue;
            };
            if self.assign(survivor, board, task_id, events).is_ok() {
                assigned += 1;
            }
        }
        assigned
    }

    /// Work rate multiplier
    ///
    /// `(match ? 1.5 : 1.0) * (0.5 + level / 100)`, further scaled by
    /// `health + 0.5` when health is below half.
    pub fn efficiency(survivor: &SurvivorRecord, task: &Task, health_fraction: f32) -> f32 {
        let skill_factor = if survivor.primary_skill == task.required_skill {
            1.5
        } else {
            1.0
        };
        let mut efficiency = skill_factor * (0.5 + survivor.skill_level() / 100.0);
        if health_fraction < WOUNDED_THRESHOLD {
            efficiency *= health_fraction.max(0.0) + 0.5;
        }
        efficiency
    }

    /// Advance the survivor's assigned task by `dt` seconds of work.
    ///
    /// Completion happens once: experience is granted, the resource reward
    /// (if any) is paid into the economy, `TaskCompleted` is emitted and
    /// the survivor is released. The task then leaves the board, or is
    /// reopened with zero progress when it repeats. Returns the completed
    /// task id.
    pub fn advance(
        &self,
        survivor: &mut SurvivorRecord,
        board: &mut TaskBoard,
        health_fraction: f32,
        dt: Seconds,
        economy: &mut dyn ResourceEconomy,
        events: &mut Vec<SimulationEvent>,
    ) -> Option<TaskId> {
        if survivor.is_dead() || dt <= 0.0 {
            return None;
        }
        let task_id = survivor.task?;
        let task = board.get_mut(task_id)?;
        if task.assigned != Some(survivor.id) {
            return None;
        }

        let efficiency = Self::efficiency(survivor, task, health_fraction);
        let amount = (dt / task.duration) as f32 * efficiency;
        if !task.add_progress(amount) {
            return None;
        }
        let reward = task.reward.clone();

        let experience = self.config.experience_reward;
        let levels = survivor.grant_experience(experience, self.config.level_up_threshold);
        if levels > 0 {
            tracing::info!(
                "{} reached skill level {:.0}",
                survivor.name,
                survivor.skill_level()
            );
        }
        let resources_added = reward.map(|r| economy.add_resource(&r.resource, r.amount));

        tracing::info!("{} completed task {:?}", survivor.name, task_id);
        events.push(SimulationEvent::TaskCompleted {
            task: task_id,
            survivor: survivor.id,
            experience,
            resources_added,
        });
        self.unassign(survivor, board, events);
        retire(board, task_id);
        Some(task_id)
    }
}

/// Take a finished task off the board, or reopen it if it repeats
fn retire(board: &mut TaskBoard, task_id: TaskId) {
    let repeats = board.get(task_id).is_some_and(|t| t.repeat);
    if repeats {
        if let Some(task) = board.get_mut(task_id) {
            task.reset();
        }
    } else {
        board.remove(task_id);
    }
}
