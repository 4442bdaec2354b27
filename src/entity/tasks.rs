//! Tasks survivors can be assigned to

use crate::core::types::{EntityId, Seconds, TaskId, Vec2};
use crate::entity::survivor::{BehaviorState, Skill};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Defend,
    Resource,
    Follow,
    Build,
}

impl TaskKind {
    /// Behavior state a survivor shows while working this kind of task
    pub fn behavior(&self) -> BehaviorState {
        match self {
            TaskKind::Defend => BehaviorState::Defending,
            TaskKind::Resource => BehaviorState::Gathering,
            TaskKind::Follow => BehaviorState::Following,
            TaskKind::Build => BehaviorState::Building,
        }
    }

    /// Whether hostiles in detection range interrupt work on this task
    pub fn scans_for_enemies(&self) -> bool {
        matches!(self, TaskKind::Defend | TaskKind::Follow)
    }
}

/// Where a task is performed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TaskTarget {
    Position(Vec2),
    /// Tracks an actor; Follow and Defend tasks end when it dies
    Entity(EntityId),
}

/// Resources paid into the economy on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceReward {
    pub resource: String,
    pub amount: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub kind: TaskKind,
    pub required_skill: Skill,
    /// Seconds of work at efficiency 1.0
    pub duration: Seconds,
    progress: f32,
    completed: bool,
    /// Back-reference to the assigned survivor; the survivor does not belong to the task
    pub assigned: Option<EntityId>,
    pub target: TaskTarget,
    pub reward: Option<ResourceReward>,
    /// Reopened on completion instead of leaving the board
    pub repeat: bool,
}

impl Task {
    pub fn new(id: TaskId, kind: TaskKind, required_skill: Skill, duration: Seconds, target: TaskTarget) -> Self {
        Self {
            id,
            kind,
            required_skill,
            duration: duration.max(f64::EPSILON),
            progress: 0.0,
            completed: false,
            assigned: None,
            target,
            reward: None,
            repeat: false,
        }
    }

    pub fn with_reward(mut self, resource: impl Into<String>, amount: u32) -> Self {
        self.reward = Some(ResourceReward {
            resource: resource.into(),
            amount,
        });
        self
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_open(&self) -> bool {
        self.assigned.is_none() && !self.completed
    }

    pub(crate) fn reset_progress(&mut self) {
        self.progress = 0.0;
    }

    /// Add progress, clamped to [0, 1]. Returns true on the call that
    /// completes the task; later calls do nothing.
    pub(crate) fn add_progress(&mut self, amount: f32) -> bool {
        if self.completed || amount <= 0.0 || amount.is_nan() {
            return false;
        }
        self.progress = (self.progress + amount).clamp(0.0, 1.0);
        if self.progress >= 1.0 {
            self.completed = true;
            return true;
        }
        false
    }

    /// Reopen a completed task for another round of work
    pub(crate) fn reset(&mut self) {
        self.progress = 0.0;
        self.completed = false;
    }
}

/// All tasks in creation order
///
/// Iteration order is part of the contract: scheduling ties go to the
/// task added first.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    tasks: Vec<Task>,
    next_id: u32,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task and return its id
    pub fn add(&mut self, kind: TaskKind, required_skill: Skill, duration: Seconds, target: TaskTarget) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task::new(id, kind, required_skill, duration, target));
        id
    }

    /// Insert a prepared task; its id is replaced with a fresh one
    pub fn insert(&mut self, mut task: Task) -> TaskId {
        task.id = TaskId(self.next_id);
        self.next_id += 1;
        let id = task.id;
        self.tasks.push(task);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Remove a task; the caller is responsible for clearing the survivor side
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn open(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.is_open())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_clamps_and_completes_once() {
        let mut task = Task::new(TaskId(0), TaskKind::Build, Skill::Building, 10.0, TaskTarget::Position(Vec2::ZERO));

        assert!(!task.add_progress(0.6));
        assert!(task.add_progress(0.6));
        assert_eq!(task.progress(), 1.0);
        assert!(task.is_completed());
        assert!(!task.add_progress(0.5));
    }

    #[test]
    fn test_reset_reopens_completed_task() {
        let mut task = Task::new(TaskId(0), TaskKind::Resource, Skill::Gathering, 5.0, TaskTarget::Position(Vec2::ZERO))
            .repeating();
        assert!(task.add_progress(1.0));

        task.reset();
        assert!(task.is_open());
        assert_eq!(task.progress(), 0.0);
        assert!(!task.add_progress(0.5));
    }

    #[test]
    fn test_board_preserves_insertion_order() {
        let mut board = TaskBoard::new();
        let a = board.add(TaskKind::Resource, Skill::Gathering, 5.0, TaskTarget::Position(Vec2::ZERO));
        let b = board.add(TaskKind::Defend, Skill::Combat, 5.0, TaskTarget::Position(Vec2::ZERO));
        let c = board.add(TaskKind::Build, Skill::Building, 5.0, TaskTarget::Position(Vec2::ZERO));

        board.remove(b);
        let order: Vec<_> = board.iter().map(|t| t.id).collect();
        assert_eq!(order, vec![a, c]);
    }

    #[test]
    fn test_open_excludes_assigned_and_completed() {
        let mut board = TaskBoard::new();
        let a = board.add(TaskKind::Resource, Skill::Gathering, 5.0, TaskTarget::Position(Vec2::ZERO));
        let b = board.add(TaskKind::Build, Skill::Building, 5.0, TaskTarget::Position(Vec2::ZERO));
        let c = board.add(TaskKind::Defend, Skill::Combat, 5.0, TaskTarget::Position(Vec2::ZERO));

        board.get_mut(a).unwrap().assigned = Some(EntityId::new());
        board.get_mut(b).unwrap().add_progress(2.0);

        let open: Vec<_> = board.open().map(|t| t.id).collect();
        assert_eq!(open, vec![c]);
    }

    #[test]
    fn test_task_kind_maps_to_behavior() {
        assert_eq!(TaskKind::Resource.behavior(), BehaviorState::Gathering);
        assert!(TaskKind::Follow.scans_for_enemies());
        assert!(!TaskKind::Build.scans_for_enemies());
    }
}
