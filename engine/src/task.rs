//! Suspendable units of entity behavior.

use derive_more::{Display, Error};

use crate::prelude::*;

/// Handle to a task submitted to the scheduler.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display)]
#[display("task{_0}")]
pub struct TaskId(pub(crate) u64);

/// Ways a task can fail.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
pub enum TaskError {
    /// No walkable route existed when the path was planned.
    #[display("no path from {from} to {to}")]
    Unreachable { from: IVec2, to: IVec2 },

    /// Cancelled by an interrupt or by a preempting task.
    #[display("interrupted")]
    Interrupted,

    /// A step found its target cell blocked when it was about to move.
    #[display("blocked at {at}")]
    Obstructed { at: IVec2 },

    /// Entity is off the grid or lacks a positive movement speed.
    #[display("entity can't move")]
    Immobile,
}

/// Final result of a task.
pub type Outcome = Result<(), TaskError>;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum TaskStatus {
    /// Waiting for the entity's actor resource, or for its first wakeup.
    Queued,
    Running,
    Completed,
    Interrupted,
    Failed(TaskError),
}

impl TaskStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskStatus::Queued | TaskStatus::Running)
    }
}

impl From<Outcome> for TaskStatus {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Ok(()) => TaskStatus::Completed,
            Err(TaskError::Interrupted) => TaskStatus::Interrupted,
            Err(e) => TaskStatus::Failed(e),
        }
    }
}

/// Why a suspended task is being resumed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Wake {
    /// First run after being granted the actor resource.
    Start,
    /// The time asked for with `Wait::Until` has come.
    Timer,
    /// The child the task was waiting on finished.
    Child(Outcome),
    /// The task has been asked to stop.
    Interrupted,
}

/// What a task does after running up to a suspension point.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Wait {
    Until(Instant),
    /// Wait for a task started with `Runtime::spawn_child`.
    Child(TaskId),
    Done(Outcome),
}

/// Fixed facts about a running task.
#[derive(Copy, Clone, Debug)]
pub struct TaskCx {
    pub id: TaskId,
    pub entity: Entity,
    /// Lower values are more urgent.
    pub priority: i32,
    pub preempt: bool,
}

/// Behavior that runs cooperatively on the virtual clock.
///
/// The scheduler calls `resume` whenever the task's wait condition is met.
/// The task runs until its next suspension point and says what it waits for
/// next. An interrupt shows up as `Wake::Interrupted` on the next resume,
/// never in the middle of one.
pub trait Task {
    fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait;

    /// Short name for log messages.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or_default()
    }
}
