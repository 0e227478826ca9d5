//! Virtual time cooperative scheduler.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use util::{HashMap, IndexMap};

use crate::{ecs::Actor, prelude::*};

/// Per-entity single slot lock on "what the entity is doing now".
///
/// Waiting claims are granted in priority order, oldest first among equal
/// priorities.
#[derive(Clone, Default, Debug)]
pub struct ActorResource {
    holder: Option<Claim>,
    queue: Vec<Claim>,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
struct Claim {
    task: TaskId,
    priority: i32,
    preempt: bool,
    seq: u64,
}

impl Claim {
    fn key(&self) -> (i32, u64) {
        (self.priority, self.seq)
    }
}

/// Result of asking for an actor resource.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Grant {
    Now,
    /// Claim went to the queue, and may have preempted the current holder.
    Queued { preempted: Option<TaskId> },
}

impl ActorResource {
    pub fn holder(&self) -> Option<TaskId> {
        self.holder.map(|c| c.task)
    }

    /// Waiting tasks in the order they will get the resource.
    pub fn queue(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.queue.iter().map(|c| c.task)
    }

    fn request(&mut self, claim: Claim) -> Grant {
        let Some(holder) = self.holder else {
            self.holder = Some(claim);
            return Grant::Now;
        };

        let at = self.queue.partition_point(|c| c.key() <= claim.key());
        self.queue.insert(at, claim);

        let preempted = (claim.preempt && claim.priority < holder.priority)
            .then_some(holder.task);
        Grant::Queued { preempted }
    }

    /// Drop a task's claim. If the task was the holder, return the next
    /// waiting task, which now holds the resource.
    fn release(&mut self, task: TaskId) -> Option<TaskId> {
        if self.holder() == Some(task) {
            self.holder = if self.queue.is_empty() {
                None
            } else {
                Some(self.queue.remove(0))
            };
            self.holder()
        } else {
            self.queue.retain(|c| c.task != task);
            None
        }
    }

    /// Leave the queue without touching a held resource.
    fn withdraw(&mut self, task: TaskId) {
        self.queue.retain(|c| c.task != task);
    }
}

/// Bookkeeping for one task.
struct Slot {
    cx: TaskCx,
    /// Taken out while the task is being resumed.
    body: Option<Box<dyn Task>>,
    status: TaskStatus,
    /// Bumped whenever the task's pending wakeups become obsolete.
    epoch: u64,
    parent: Option<TaskId>,
    child: Option<TaskId>,
    interrupted: bool,
}

struct Event {
    at: Instant,
    seq: u64,
    task: TaskId,
    epoch: u64,
    wake: Wake,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.at, self.seq).cmp(&(other.at, other.seq))
    }
}

/// How many finished top-level tasks still report their status.
const FINISHED_HISTORY: usize = 256;

#[derive(Default)]
pub(crate) struct Scheduler {
    now: Instant,
    seq: u64,
    next_id: u64,
    tasks: HashMap<TaskId, Slot>,
    /// Final status of recently finished top-level tasks, oldest first.
    finished: IndexMap<TaskId, TaskStatus>,
    events: BinaryHeap<Reverse<Event>>,
    resources: HashMap<Entity, ActorResource>,
}

impl Scheduler {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn add(
        &mut self,
        entity: Entity,
        body: Box<dyn Task>,
        priority: i32,
        preempt: bool,
        parent: Option<TaskId>,
    ) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.tasks.insert(
            id,
            Slot {
                cx: TaskCx {
                    id,
                    entity,
                    priority,
                    preempt,
                },
                body: Some(body),
                status: TaskStatus::Queued,
                epoch: 0,
                parent,
                child: None,
                interrupted: false,
            },
        );
        id
    }

    /// Schedule a wakeup valid for the task's current epoch.
    fn push(&mut self, at: Instant, task: TaskId, wake: Wake) {
        let Some(slot) = self.tasks.get(&task) else {
            return;
        };
        let epoch = slot.epoch;
        let seq = self.next_seq();
        self.events.push(Reverse(Event {
            at: at.max(self.now),
            seq,
            task,
            epoch,
            wake,
        }));
    }

    /// Drop a finished top-level task, remembering only its status.
    fn retire(&mut self, task: TaskId) {
        let Some(slot) = self.tasks.remove(&task) else {
            return;
        };
        self.finished.insert(task, slot.status);
        while self.finished.len() > FINISHED_HISTORY {
            self.finished.shift_remove_index(0);
        }
    }

    /// Whether an event would still wake up its task.
    fn is_live(&self, event: &Event) -> bool {
        self.tasks.get(&event.task).map_or(false, |s| {
            s.epoch == event.epoch && !s.status.is_finished()
        })
    }

    /// Drop stale events from the front of the queue.
    fn prune(&mut self) {
        while let Some(Reverse(event)) = self.events.peek() {
            if self.is_live(event) {
                break;
            }
            self.events.pop();
        }
    }

    fn next_due(&mut self) -> Option<Instant> {
        self.prune();
        self.events.peek().map(|Reverse(e)| e.at)
    }
}

impl Runtime {
    pub fn now(&self) -> Instant {
        self.sched.now
    }

    /// Queue a task for an entity's actor resource.
    ///
    /// The task starts once it holds the resource. When `preempt` is set
    /// and `priority` is strictly more urgent than the current holder's,
    /// the holder gets interrupted and the resource passes on when it
    /// finishes.
    ///
    /// Returns `None` if the entity doesn't have the actor capability.
    pub fn submit_task(
        &mut self,
        e: Entity,
        task: impl Task + 'static,
        priority: i32,
        preempt: bool,
    ) -> Option<TaskId> {
        if !e.has::<Actor>(self) {
            log::warn!(
                "Runtime::submit_task: {e} can't run {}, not an actor",
                task.name()
            );
            return None;
        }

        let name = task.name();
        let id = self.sched.add(e, Box::new(task), priority, preempt, None);
        let claim = Claim {
            task: id,
            priority,
            preempt,
            seq: self.sched.next_seq(),
        };
        let grant = self.sched.resources.entry(e).or_default().request(claim);
        log::debug!("{e}: submit {name} {id} at priority {priority}");

        match grant {
            Grant::Now => {
                self.sched.push(self.now(), id, Wake::Start);
            }
            Grant::Queued {
                preempted: Some(holder),
            } => {
                log::debug!("{e}: {id} preempts {holder}");
                self.interrupt(holder);
            }
            Grant::Queued { preempted: None } => {}
        }

        Some(id)
    }

    /// Start a subtask for a running task.
    ///
    /// The child runs under its parent's actor resource, the parent gets
    /// its outcome by returning `Wait::Child` with the returned handle.
    pub fn spawn_child(
        &mut self,
        cx: &TaskCx,
        task: impl Task + 'static,
    ) -> TaskId {
        let id = self.sched.add(
            cx.entity,
            Box::new(task),
            cx.priority,
            false,
            Some(cx.id),
        );
        if let Some(parent) = self.sched.tasks.get_mut(&cx.id) {
            parent.child = Some(id);
        }
        self.sched.push(self.now(), id, Wake::Start);
        id
    }

    /// Ask a task to stop.
    ///
    /// The task sees the request at its next suspension point. A task that
    /// is waiting for its resource leaves the queue, a task waiting on a
    /// child has the child interrupted too. Returns false if the task is
    /// unknown, finished or already interrupted.
    pub fn interrupt(&mut self, id: TaskId) -> bool {
        let Some(slot) = self.sched.tasks.get_mut(&id) else {
            return false;
        };
        if slot.status.is_finished() || slot.interrupted {
            return false;
        }
        slot.interrupted = true;
        // Pending timers and wakeups are void now.
        slot.epoch += 1;
        let (entity, parent, child) = (slot.cx.entity, slot.parent, slot.child);
        log::debug!("{entity}: interrupt {id}");

        if parent.is_none() {
            if let Some(res) = self.sched.resources.get_mut(&entity) {
                res.withdraw(id);
            }
        }
        self.sched.push(self.now(), id, Wake::Interrupted);

        if let Some(child) = child {
            self.interrupt(child);
        }
        true
    }

    /// Interrupt every task bound to an entity and drop its resource.
    pub(crate) fn interrupt_entity(&mut self, e: Entity) {
        let mut ids: Vec<TaskId> = self
            .sched
            .tasks
            .iter()
            .filter(|(_, s)| s.cx.entity == e && s.parent.is_none())
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        for id in ids {
            self.interrupt(id);
        }
        self.sched.resources.remove(&e);
    }

    /// Status of a task.
    ///
    /// `None` for unknown tasks, for child tasks that have already handed
    /// their outcome to the parent, and for top-level tasks that finished
    /// long enough ago to drop out of the finished task history.
    pub fn task_status(&self, id: TaskId) -> Option<TaskStatus> {
        match self.sched.tasks.get(&id) {
            Some(slot) => Some(slot.status),
            None => self.sched.finished.get(&id).copied(),
        }
    }

    pub fn is_task_alive(&self, id: TaskId) -> bool {
        self.task_status(id).map_or(false, |s| !s.is_finished())
    }

    pub fn actor_resource(&self, e: Entity) -> Option<&ActorResource> {
        self.sched.resources.get(&e)
    }

    pub fn resource_holder(&self, e: Entity) -> Option<TaskId> {
        self.sched.resources.get(&e).and_then(|r| r.holder())
    }

    pub fn resource_queue(&self, e: Entity) -> Vec<TaskId> {
        self.sched
            .resources
            .get(&e)
            .map(|r| r.queue().collect())
            .unwrap_or_default()
    }

    /// Time of the next scheduled wakeup.
    pub fn next_wakeup(&self) -> Option<Instant> {
        self.sched
            .events
            .iter()
            .filter(|Reverse(e)| self.sched.is_live(e))
            .map(|Reverse(e)| e.at)
            .min()
    }

    /// Advance the clock by `dt` and run everything that comes due.
    pub fn step(&mut self, dt: f64) {
        let t = self.now() + dt.max(0.0);
        self.run_until(t);
    }

    /// Run everything due up to and including `t`, then set the clock to `t`.
    pub fn run_until(&mut self, t: Instant) {
        while self.sched.next_due().map_or(false, |at| at <= t) {
            self.advance();
        }
        if t > self.sched.now {
            self.sched.now = t;
        }
    }

    /// Jump to the next scheduled instant and run everything due then,
    /// including wakeups scheduled for that same instant while running.
    ///
    /// Returns false if nothing was scheduled.
    pub fn advance(&mut self) -> bool {
        let Some(t) = self.sched.next_due() else {
            return false;
        };
        if t > self.sched.now {
            self.sched.now = t;
        }

        let now = self.sched.now;
        while self.sched.next_due().map_or(false, |at| at <= now) {
            let Some(Reverse(event)) = self.sched.events.pop() else {
                break;
            };
            self.dispatch(event);
        }
        true
    }

    fn dispatch(&mut self, event: Event) {
        let Some(slot) = self.sched.tasks.get_mut(&event.task) else {
            return;
        };
        if slot.epoch != event.epoch || slot.status.is_finished() {
            return;
        }
        let Some(mut body) = slot.body.take() else {
            return;
        };
        slot.epoch += 1;
        slot.status = TaskStatus::Running;
        let cx = slot.cx;

        let wait = body.resume(self, &cx, event.wake);

        if let Some(slot) = self.sched.tasks.get_mut(&cx.id) {
            slot.body = Some(body);
        }
        self.settle(&cx, wait);
    }

    fn settle(&mut self, cx: &TaskCx, wait: Wait) {
        match wait {
            Wait::Until(t) => self.sched.push(t, cx.id, Wake::Timer),
            Wait::Child(child) => {
                let is_child = self
                    .sched
                    .tasks
                    .get(&child)
                    .map_or(false, |s| s.parent == Some(cx.id));
                if !is_child {
                    log::warn!(
                        "Runtime::settle: {} waits on {child}, which isn't its child",
                        cx.id
                    );
                    let now = self.now();
                    self.sched.push(
                        now,
                        cx.id,
                        Wake::Child(Err(TaskError::Interrupted)),
                    );
                }
            }
            Wait::Done(outcome) => self.finish(cx, outcome),
        }
    }

    fn finish(&mut self, cx: &TaskCx, outcome: Outcome) {
        let Some(slot) = self.sched.tasks.get_mut(&cx.id) else {
            return;
        };
        slot.status = outcome.into();
        slot.body = None;
        let (parent, child) = (slot.parent, slot.child.take());
        log::debug!("{}: {} finished with {:?}", cx.entity, cx.id, outcome);

        if let Some(child) = child {
            self.interrupt(child);
        }

        if let Some(parent) = parent {
            // Children are forgotten once their outcome is handed over.
            self.sched.tasks.remove(&cx.id);
            let waiting = self
                .sched
                .tasks
                .get_mut(&parent)
                .filter(|p| p.child == Some(cx.id) && !p.status.is_finished());
            if let Some(p) = waiting {
                p.child = None;
                let now = self.now();
                self.sched.push(now, parent, Wake::Child(outcome));
            }
        } else {
            let next = self
                .sched
                .resources
                .get_mut(&cx.entity)
                .and_then(|res| res.release(cx.id));
            if let Some(next) = next {
                log::debug!("{}: resource goes to {next}", cx.entity);
                let now = self.now();
                self.sched.push(now, next, Wake::Start);
            }
            self.sched.retire(cx.id);
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ecs::Actor;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Logs its wakeups and sleeps a fixed time between them until it has
    /// been woken up `rounds` times.
    struct Sleeper {
        name: &'static str,
        nap: f64,
        rounds: usize,
        log: Log,
    }

    impl Sleeper {
        fn new(name: &'static str, nap: f64, rounds: usize, log: &Log) -> Self {
            Sleeper {
                name,
                nap,
                rounds,
                log: log.clone(),
            }
        }
    }

    impl Task for Sleeper {
        fn resume(&mut self, r: &mut Runtime, _: &TaskCx, wake: Wake) -> Wait {
            self.log.borrow_mut().push(format!(
                "{} {:?} @{}",
                self.name,
                wake,
                r.now().value()
            ));
            if wake == Wake::Interrupted {
                return Wait::Done(Err(TaskError::Interrupted));
            }
            if self.rounds == 0 {
                return Wait::Done(Ok(()));
            }
            self.rounds -= 1;
            Wait::Until(r.now() + self.nap)
        }
    }

    /// Runs a sleeper as a child and reports its outcome.
    struct Parent {
        log: Log,
    }

    impl Task for Parent {
        fn resume(&mut self, r: &mut Runtime, cx: &TaskCx, wake: Wake) -> Wait {
            self.log.borrow_mut().push(format!("parent {:?}", wake));
            match wake {
                Wake::Start => {
                    let child = r
                        .spawn_child(cx, Sleeper::new("child", 1.0, 2, &self.log));
                    Wait::Child(child)
                }
                Wake::Child(outcome) => Wait::Done(outcome),
                Wake::Interrupted => Wait::Done(Err(TaskError::Interrupted)),
                Wake::Timer => Wait::Done(Ok(())),
            }
        }
    }

    fn setup() -> (Runtime, Entity, Log) {
        let mut r = Runtime::with_size(4, 4);
        let e = r.spawn((Actor,));
        (r, e, Default::default())
    }

    #[test]
    fn needs_actor() {
        let mut r = Runtime::with_size(4, 4);
        let log = Log::default();
        let e = r.spawn(());
        assert_eq!(r.submit_task(e, Sleeper::new("a", 1.0, 1, &log), 0, false), None);
    }

    #[test]
    fn timers_and_completion() {
        let (mut r, e, log) = setup();
        let id = r.submit_task(e, Sleeper::new("a", 1.5, 2, &log), 10, false).unwrap();
        assert_eq!(r.task_status(id), Some(TaskStatus::Queued));
        assert_eq!(r.resource_holder(e), Some(id));

        r.step(0.0);
        assert_eq!(r.task_status(id), Some(TaskStatus::Running));
        r.step(10.0);
        assert_eq!(r.task_status(id), Some(TaskStatus::Completed));
        assert_eq!(r.resource_holder(e), None);
        assert_eq!(r.now(), Instant::new(10.0));
        assert_eq!(
            *log.borrow(),
            vec!["a Start @0", "a Timer @1.5", "a Timer @3"]
        );
    }

    #[test]
    fn equal_priority_waits_its_turn() {
        let (mut r, e, log) = setup();
        let a = r.submit_task(e, Sleeper::new("a", 1.0, 1, &log), 10, true).unwrap();
        let b = r.submit_task(e, Sleeper::new("b", 1.0, 1, &log), 10, true).unwrap();
        assert_eq!(r.resource_queue(e), vec![b]);

        r.step(5.0);
        assert_eq!(r.task_status(a), Some(TaskStatus::Completed));
        assert_eq!(r.task_status(b), Some(TaskStatus::Completed));
        assert_eq!(
            *log.borrow(),
            vec!["a Start @0", "a Timer @1", "b Start @1", "b Timer @2"]
        );
    }

    #[test]
    fn queue_orders_by_priority_then_age() {
        let (mut r, e, log) = setup();
        let a = r.submit_task(e, Sleeper::new("a", 1.0, 1, &log), 5, false).unwrap();
        let b = r.submit_task(e, Sleeper::new("b", 1.0, 1, &log), 10, false).unwrap();
        let c = r.submit_task(e, Sleeper::new("c", 1.0, 1, &log), 3, false).unwrap();
        let d = r.submit_task(e, Sleeper::new("d", 1.0, 1, &log), 3, false).unwrap();

        assert_eq!(r.resource_holder(e), Some(a));
        assert_eq!(r.resource_queue(e), vec![c, d, b]);
        r.run_until(Instant::new(10.0));
        assert_eq!(
            *log.borrow(),
            vec![
                "a Start @0",
                "a Timer @1",
                "c Start @1",
                "c Timer @2",
                "d Start @2",
                "d Timer @3",
                "b Start @3",
                "b Timer @4",
            ]
        );
    }

    #[test]
    fn non_preempting_request_waits() {
        let (mut r, e, log) = setup();
        let a = r.submit_task(e, Sleeper::new("a", 4.0, 1, &log), 10, false).unwrap();
        r.step(1.0);
        let b = r.submit_task(e, Sleeper::new("b", 1.0, 0, &log), 0, false).unwrap();
        r.step(0.0);
        assert_eq!(r.resource_holder(e), Some(a));
        assert_eq!(r.task_status(b), Some(TaskStatus::Queued));
        r.step(10.0);
        assert_eq!(r.task_status(a), Some(TaskStatus::Completed));
        assert_eq!(r.task_status(b), Some(TaskStatus::Completed));
    }

    #[test]
    fn preemption() {
        let (mut r, e, log) = setup();
        let low = r.submit_task(e, Sleeper::new("low", 5.0, 3, &log), 10, false).unwrap();
        r.step(1.0);

        let high = r.submit_task(e, Sleeper::new("high", 1.0, 1, &log), 0, true).unwrap();
        // Holder keeps the resource until it has seen the interrupt.
        assert_eq!(r.resource_holder(e), Some(low));
        r.step(0.0);
        assert_eq!(r.resource_holder(e), Some(high));
        assert_eq!(r.task_status(low), Some(TaskStatus::Interrupted));

        r.step(10.0);
        assert_eq!(r.task_status(high), Some(TaskStatus::Completed));
        assert_eq!(
            *log.borrow(),
            vec![
                "low Start @0",
                "low Interrupted @1",
                "high Start @1",
                "high Timer @2",
            ]
        );
    }

    #[test]
    fn interrupting_queued_task() {
        let (mut r, e, log) = setup();
        let _a = r.submit_task(e, Sleeper::new("a", 1.0, 1, &log), 10, false).unwrap();
        let b = r.submit_task(e, Sleeper::new("b", 1.0, 1, &log), 10, false).unwrap();
        assert!(r.interrupt(b));
        assert!(!r.interrupt(b));
        assert!(r.resource_queue(e).is_empty());

        r.step(5.0);
        assert_eq!(r.task_status(b), Some(TaskStatus::Interrupted));
        assert_eq!(
            *log.borrow(),
            vec!["a Start @0", "b Interrupted @0", "a Timer @1"]
        );
    }

    #[test]
    fn child_outcome_reaches_parent() {
        let (mut r, e, log) = setup();
        let p = r.submit_task(e, Parent { log: log.clone() }, 10, false).unwrap();
        r.step(5.0);
        assert_eq!(r.task_status(p), Some(TaskStatus::Completed));
        assert_eq!(
            *log.borrow(),
            vec![
                "parent Start",
                "child Start @0",
                "child Timer @1",
                "child Timer @2",
                "parent Child(Ok(()))",
            ]
        );
        // Both are out of the books, the parent's status is remembered.
        assert!(r.sched.tasks.is_empty());
        assert_eq!(r.sched.finished.len(), 1);
    }

    #[test]
    fn interrupt_cascades_to_child() {
        let (mut r, e, log) = setup();
        let p = r.submit_task(e, Parent { log: log.clone() }, 10, false).unwrap();
        r.step(1.5);
        assert!(r.interrupt(p));
        r.step(5.0);

        assert_eq!(r.task_status(p), Some(TaskStatus::Interrupted));
        assert_eq!(
            *log.borrow(),
            vec![
                "parent Start",
                "child Start @0",
                "child Timer @1",
                "parent Interrupted",
                "child Interrupted @1.5",
            ]
        );
        assert!(r.sched.tasks.is_empty());
        assert_eq!(r.resource_holder(e), None);
    }

    #[test]
    fn advance_runs_one_instant() {
        let (mut r, e, log) = setup();
        r.submit_task(e, Sleeper::new("a", 2.0, 2, &log), 10, false);
        assert!(r.advance());
        assert_eq!(r.now(), Instant::ZERO);
        assert!(r.advance());
        assert_eq!(r.now(), Instant::new(2.0));
        assert!(r.advance());
        assert!(!r.advance());
        assert_eq!(r.now(), Instant::new(4.0));
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn finished_tasks_leave_the_table() {
        let mut r = Runtime::with_size(10, 1);
        let e = r.spawn((Actor, crate::ecs::Navigate::new(10.0)));
        e.place(&mut r, [0, 0]);
        let idle = r.submit_task(e, crate::Idle::new(100.0), 10, false);

        let mut last = None;
        for i in 0..500 {
            last = r.navigate(e, [i % 2 * 9, 0]);
            r.step(1.0);
        }

        // Only the current idler is still in the books.
        assert_eq!(r.sched.tasks.len(), 1);
        assert!(r.sched.tasks.values().all(|s| !s.status.is_finished()));
        assert_eq!(r.sched.finished.len(), FINISHED_HISTORY);

        assert_eq!(r.task_status(last.unwrap()), Some(TaskStatus::Completed));
        assert_eq!(e.pos(&r), Some(ivec2(9, 0)));
        // Too old to remember.
        assert_eq!(r.task_status(idle.unwrap()), None);
    }
}
