//! Background behaviors entities fall back to on their own.
use rand::Rng;
use util::RngExt;

use crate::{ecs::*, prelude::*, Step};

/// Queue a fresh copy of an interrupted baseline behavior so the entity
/// returns to it once whatever interrupted it is done.
fn resubmit(r: &mut Runtime, cx: &TaskCx, task: impl Task + 'static) {
    if cx.entity.is_alive(r) {
        r.submit_task(cx.entity, task, cx.priority, cx.preempt);
    }
}

/// Stand around, waking up now and then.
#[derive(Copy, Clone, Debug)]
pub struct Idle {
    timeout: f64,
}

impl Idle {
    pub fn new(timeout: f64) -> Self {
        let timeout = if timeout > 0.0 { timeout } else { 1.0 };
        Idle { timeout }
    }
}

impl Task for Idle {
    fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait {
        if wake == Wake::Interrupted {
            resubmit(r, cx, *self);
            return Wait::Done(Err(TaskError::Interrupted));
        }
        Wait::Until(r.now() + self.timeout)
    }
}

/// Wander around one step at a time, turning now and then and whenever
/// the way ahead is blocked.
#[derive(Copy, Clone, Default, Debug)]
pub struct Roam;

impl Roam {
    fn heading(r: &mut Runtime, e: Entity, pos: IVec2) -> Option<IVec2> {
        let mut facing = e
            .facing(r)
            .filter(|f| f.is_step())
            .unwrap_or(DIR_8[0]);

        let chance = r.settings.roam_turn_chance;
        let cw: bool = r.rng().gen();
        let turn = |f: IVec2| if cw { f.turned_cw() } else { f.turned_ccw() };

        if r.rng().chance(chance) {
            facing = turn(facing);
        }
        for _ in 0..DIR_8.len() {
            if !r.blocks_pass(pos + facing) {
                break;
            }
            facing = turn(facing);
        }

        if e.has::<Direction>(r) {
            e.set(r, Direction(facing));
        }
        (!r.blocks_pass(pos + facing)).then_some(facing)
    }
}

impl Task for Roam {
    fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait {
        match wake {
            Wake::Interrupted => {
                resubmit(r, cx, Roam);
                return Wait::Done(Err(TaskError::Interrupted));
            }
            // Something got in the way, pick a new heading.
            Wake::Child(Err(TaskError::Obstructed { .. })) => {}
            Wake::Child(Err(e)) => return Wait::Done(Err(e)),
            Wake::Start | Wake::Timer | Wake::Child(Ok(())) => {}
        }

        let e = cx.entity;
        let (Some(pos), Some(speed)) = (e.pos(r), e.speed(r)) else {
            return Wait::Done(Err(TaskError::Immobile));
        };
        if speed <= 0.0 {
            return Wait::Done(Err(TaskError::Immobile));
        }

        match Roam::heading(r, e, pos) {
            Some(dir) => Wait::Child(r.spawn_child(cx, Step::new(dir))),
            // Boxed in, try again later.
            None => Wait::Until(r.now() + 1.0 / speed),
        }
    }
}
