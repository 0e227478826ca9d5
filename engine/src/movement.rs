//! Moving entities around the grid.

use crate::{ecs::*, prelude::*};

/// Move one cell in a direction after the entity's step time has passed.
///
/// Runs as a child of a longer behavior and holds no actor resource of its
/// own. The move is committed only if the target cell is still passable
/// when the wait ends.
#[derive(Copy, Clone, Debug)]
pub struct Step {
    dir: IVec2,
}

impl Step {
    pub fn new(dir: impl Into<IVec2>) -> Self {
        Step { dir: dir.into() }
    }

    fn commit(&self, r: &mut Runtime, e: Entity) -> Outcome {
        let Some(pos) = e.pos(r) else {
            return Err(TaskError::Immobile);
        };
        let at = pos + self.dir;
        if r.blocks_pass(at) || !e.move_to(r, at) {
            return Err(TaskError::Obstructed { at });
        }
        Ok(())
    }
}

impl Task for Step {
    fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait {
        match wake {
            Wake::Start => match cx.entity.speed(r) {
                Some(speed) if speed > 0.0 => Wait::Until(r.now() + 1.0 / speed),
                _ => Wait::Done(Err(TaskError::Immobile)),
            },
            Wake::Timer => Wait::Done(self.commit(r, cx.entity)),
            Wake::Interrupted => Wait::Done(Err(TaskError::Interrupted)),
            Wake::Child(outcome) => Wait::Done(outcome),
        }
    }
}

/// Walk to a goal cell.
///
/// The path is planned when first needed and kept until a cell on it gets
/// blocked or a step fails, then it's replanned from wherever the entity
/// is. A goal that can't be reached ends the task with `Unreachable` right
/// away.
#[derive(Clone, Debug)]
pub struct GoTo {
    goal: IVec2,
    /// Remaining cells, next one last.
    path: Vec<IVec2>,
}

impl GoTo {
    pub fn new(goal: impl Into<IVec2>) -> Self {
        GoTo {
            goal: goal.into(),
            path: Vec::new(),
        }
    }

    pub fn goal(&self) -> IVec2 {
        self.goal
    }

    fn next_step(&mut self, r: &mut Runtime, cx: &TaskCx) -> Wait {
        let e = cx.entity;
        let Some(pos) = e.pos(r) else {
            return Wait::Done(Err(TaskError::Immobile));
        };
        if !e.speed(r).map_or(false, |s| s > 0.0) {
            return Wait::Done(Err(TaskError::Immobile));
        }

        if pos == self.goal {
            log::info!("{e}: arrived at {}", self.goal);
            return Wait::Done(Ok(()));
        }

        if self.path.iter().any(|&p| r.blocks_pass(p))
            || self.path.last().map_or(false, |&p| !(p - pos).is_step())
        {
            log::debug!("{e}: path to {} went stale", self.goal);
            self.path.clear();
        }

        if self.path.is_empty() {
            let mut path = r.find_path(pos, self.goal);
            if path.is_empty() {
                log::info!("{e}: no path from {pos} to {}", self.goal);
                return Wait::Done(Err(TaskError::Unreachable {
                    from: pos,
                    to: self.goal,
                }));
            }
            log::debug!("{e}: planned {} steps to {}", path.len() - 1, self.goal);
            path.reverse();
            // Drop the current cell.
            path.pop();
            self.path = path;
        }

        let Some(next) = self.path.pop() else {
            return Wait::Done(Ok(()));
        };
        Wait::Child(r.spawn_child(cx, Step::new(next - pos)))
    }
}

impl Task for GoTo {
    fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait {
        match wake {
            Wake::Interrupted => return Wait::Done(Err(TaskError::Interrupted)),
            Wake::Child(Err(TaskError::Obstructed { at })) => {
                log::debug!("{}: step to {at} blocked, replanning", cx.entity);
                self.path.clear();
            }
            Wake::Child(Err(e)) => return Wait::Done(Err(e)),
            Wake::Start | Wake::Timer | Wake::Child(Ok(())) => {}
        }
        self.next_step(r, cx)
    }
}

impl Runtime {
    /// Send an entity walking to `goal`.
    ///
    /// Cancels the entity's previous navigation command if it's still
    /// pending and preempts background behavior.
    pub fn navigate(
        &mut self,
        e: Entity,
        goal: impl Into<IVec2>,
    ) -> Option<TaskId> {
        let goal = goal.into();
        let Some(nav) = e.get::<Navigate>(self) else {
            log::warn!("Runtime::navigate: {e} can't navigate");
            return None;
        };
        if let Some(prev) = nav.task {
            self.interrupt(prev);
        }

        let priority = self.settings.navigate_priority;
        let id = self.submit_task(e, GoTo::new(goal), priority, true)?;
        e.with_mut(self, |n: &mut Navigate| n.task = Some(id));
        Some(id)
    }
}
