//! End-to-end behavior of the simulation core through its public API.

use std::{cell::RefCell, rc::Rc};

use engine::{ecs::*, prelude::*, GoTo, Idle, Pacer};
use pretty_assertions::assert_eq;

type Journal = Rc<RefCell<Vec<(&'static str, Wake)>>>;

/// Records every wakeup, sleeps in fixed naps and gives up when
/// interrupted.
struct Recorder {
    name: &'static str,
    nap: f64,
    journal: Journal,
}

impl Task for Recorder {
    fn resume(&mut self, r: &mut Runtime, _: &TaskCx, wake: Wake) -> Wait {
        self.journal.borrow_mut().push((self.name, wake));
        match wake {
            Wake::Interrupted => Wait::Done(Err(TaskError::Interrupted)),
            Wake::Start => Wait::Until(r.now() + self.nap),
            _ => Wait::Done(Ok(())),
        }
    }
}

fn actor(r: &mut Runtime, p: impl Into<IVec2>) -> Entity {
    let e = r.spawn((
        Actor,
        Navigate::new(1.0),
        Direction(ivec2(0, -1)),
        Physical {
            block_pass: true,
            block_sight: false,
        },
    ));
    e.place(r, p);
    e
}

fn wall(r: &mut Runtime, p: impl Into<IVec2>) {
    let e = r.spawn((Physical {
        block_pass: true,
        block_sight: true,
    },));
    e.place(r, p);
}

#[test]
fn urgent_request_preempts_background_task() {
    let mut r = Runtime::with_size(4, 4);
    let e = actor(&mut r, [0, 0]);
    let journal = Journal::default();

    let background = r
        .submit_task(
            e,
            Recorder {
                name: "background",
                nap: 50.0,
                journal: journal.clone(),
            },
            10,
            false,
        )
        .unwrap();
    r.step(1.0);
    assert_eq!(r.task_status(background), Some(TaskStatus::Running));

    let urgent = r
        .submit_task(
            e,
            Recorder {
                name: "urgent",
                nap: 1.0,
                journal: journal.clone(),
            },
            0,
            true,
        )
        .unwrap();
    r.step(0.0);

    assert_eq!(r.resource_holder(e), Some(urgent));
    assert_eq!(
        *journal.borrow(),
        vec![
            ("background", Wake::Start),
            ("background", Wake::Interrupted),
            ("urgent", Wake::Start),
        ]
    );

    r.step(100.0);
    assert_eq!(r.task_status(urgent), Some(TaskStatus::Completed));
    assert_eq!(r.task_status(background), Some(TaskStatus::Interrupted));
    // The background task never made any further progress.
    assert_eq!(journal.borrow().len(), 4);
}

#[test]
fn equal_priority_does_not_preempt() {
    let mut r = Runtime::with_size(4, 4);
    let e = actor(&mut r, [0, 0]);
    let journal = Journal::default();

    for (name, nap) in [("first", 2.0), ("second", 1.0)] {
        r.submit_task(
            e,
            Recorder {
                name,
                nap,
                journal: journal.clone(),
            },
            5,
            true,
        );
    }
    r.step(10.0);
    assert_eq!(
        *journal.borrow(),
        vec![
            ("first", Wake::Start),
            ("first", Wake::Timer),
            ("second", Wake::Start),
            ("second", Wake::Timer),
        ]
    );
}

#[test]
fn idle_resubmits_once_per_interruption() {
    let mut r = Runtime::with_size(10, 10);
    let e = actor(&mut r, [0, 0]);
    r.submit_task(e, Idle::new(100.0), 10, false);
    r.step(1.0);

    for goal in [[3, 0], [3, 3], [0, 3]] {
        let go = r.navigate(e, goal).unwrap();
        r.step(0.0);
        assert_eq!(r.resource_holder(e), Some(go));
        // Exactly one idle waits for its turn.
        assert_eq!(r.resource_queue(e).len(), 1);

        r.step(10.0);
        assert_eq!(r.task_status(go), Some(TaskStatus::Completed));
        assert_eq!(e.pos(&r), Some(IVec2::from(goal)));

        let idle = r.resource_holder(e).unwrap();
        assert_eq!(r.task_status(idle), Some(TaskStatus::Running));
        assert!(r.resource_queue(e).is_empty());
    }
}

#[test]
fn diagonal_walk_across_open_grid() {
    let mut r = Runtime::with_size(10, 10);
    let e = actor(&mut r, [0, 0]);

    let path = r.find_path([0, 0], [9, 9]);
    assert_eq!(path.len(), 10);
    let cost = engine::path_cost(&path);
    assert!((cost - 9.0 * std::f64::consts::SQRT_2).abs() < 1e-9);

    let go = r.navigate(e, [9, 9]).unwrap();
    let mut trail = vec![e.pos(&r).unwrap()];
    for _ in 0..9 {
        r.step(1.0);
        trail.push(e.pos(&r).unwrap());
    }
    r.step(0.0);

    assert_eq!(r.task_status(go), Some(TaskStatus::Completed));
    assert_eq!(trail, (0..10).map(|i| ivec2(i, i)).collect::<Vec<_>>());
    assert_eq!(e.facing(&r), Some(ivec2(1, 1)));
}

#[test]
fn blocked_route_is_replanned() {
    let mut r = Runtime::with_size(9, 5);
    let e = actor(&mut r, [0, 2]);
    let go = r.navigate(e, [8, 2]).unwrap();
    r.step(2.0);
    assert_eq!(e.pos(&r), Some(ivec2(2, 2)));

    // Wall across the middle with a gap at the top.
    for y in 1..5 {
        wall(&mut r, [4, y]);
    }
    r.step(30.0);

    assert_eq!(r.task_status(go), Some(TaskStatus::Completed));
    assert_eq!(e.pos(&r), Some(ivec2(8, 2)));
}

#[test]
fn unreachable_goal_leaves_entity_idle() {
    let mut r = Runtime::with_size(8, 8);
    let e = actor(&mut r, [1, 1]);
    r.submit_task(e, Idle::new(100.0), 10, false);
    for p in [[5, 5], [5, 6], [5, 7], [6, 5], [7, 5]] {
        wall(&mut r, p);
    }
    r.step(1.0);

    let go = r.navigate(e, [7, 7]).unwrap();
    r.step(1.0);

    assert_eq!(
        r.task_status(go),
        Some(TaskStatus::Failed(TaskError::Unreachable {
            from: ivec2(1, 1),
            to: ivec2(7, 7),
        }))
    );
    assert_eq!(e.pos(&r), Some(ivec2(1, 1)));

    // Back to idling, no lock is left hanging.
    let idle = r.resource_holder(e).unwrap();
    assert_ne!(idle, go);
    assert!(r.resource_queue(e).is_empty());

    // And the entity still takes new orders.
    let go = r.navigate(e, [3, 1]).unwrap();
    r.step(5.0);
    assert_eq!(r.task_status(go), Some(TaskStatus::Completed));
}

#[test]
fn sight_is_blocked_by_walls() {
    let mut r = Runtime::with_size(15, 15);
    let viewer = r.spawn((FieldOfView { radius: 6 }, Sensor { radius: 6 }));
    viewer.place(&mut r, [7, 7]);
    wall(&mut r, [7, 5]);

    let seen = viewer.visible_mask(&r).unwrap();
    assert!(seen.get([7, 6]));
    assert!(!seen.get([7, 4]));
    assert!(!seen.get([7, 2]));
    assert!(seen.get([10, 7]));

    let alien = r.spawn((Alien,));
    alien.place(&mut r, [7, 3]);
    assert!(viewer.sense(&r, Capability::Alien).is_empty());
    alien.place(&mut r, [9, 9]);
    assert_eq!(viewer.sense(&r, Capability::Alien), vec![alien]);

    // Facing north hides what's behind.
    viewer.set(&mut r, Direction(ivec2(0, -1)));
    assert!(viewer.sense(&r, Capability::Alien).is_empty());
}

#[test]
fn opening_scenario_runs() {
    let settings = Settings {
        world_width: 60,
        world_height: 40,
        seed: 7,
        ..Default::default()
    };
    let mut r = Runtime::new_game(settings);
    let squad = r.entities_with(Capability::Squad).next().unwrap();
    let camera = r.entities_with(Capability::Camera).next().unwrap();
    let marine = r.current_marine(squad).unwrap();

    let mut pacer = Pacer::new();
    pacer.start();
    r.navigate(marine, [5, 5]);
    for _ in 0..30 {
        pacer.advance(&mut r, 1.0 / 30.0);
    }
    assert_eq!(marine.pos(&r), Some(ivec2(5, 5)));
    assert_eq!(camera.pos(&r), Some(ivec2(5, 5)));

    // Aliens stay on the grid and never share cells.
    let aliens: Vec<Entity> = r.entities_with(Capability::Alien).collect();
    let mut cells: Vec<IVec2> =
        aliens.iter().map(|a| a.pos(&r).unwrap()).collect();
    cells.sort_by_key(|p| (p.x, p.y));
    cells.dedup();
    assert_eq!(cells.len(), aliens.len());

    let frame = camera.camera_frame(&r).unwrap();
    let (_, view) = r.camera_view(camera).unwrap();
    assert_eq!(view.frame(), frame);
    assert!(view.get([5, 5]));

    let next = r.select_next(squad).unwrap();
    assert_ne!(next, marine);
    assert_eq!(camera.pos(&r), next.pos(&r));
}

#[test]
fn world_size_comes_from_settings() {
    let s = Settings {
        world_width: 40,
        world_height: 30,
        ..Default::default()
    };
    let r = Runtime::new(s);
    assert_eq!(r.space().width(), 40);
    assert_eq!(r.space().height(), 30);
    assert!(r.is_cell([39, 29]));
    assert!(!r.is_cell([40, 0]));
}

#[test]
fn go_to_is_an_ordinary_task() {
    let mut r = Runtime::with_size(6, 6);
    let e = actor(&mut r, [0, 0]);
    let go = r.submit_task(e, GoTo::new([0, 4]), 3, false).unwrap();
    r.step(10.0);
    assert_eq!(r.task_status(go), Some(TaskStatus::Completed));
    assert_eq!(e.pos(&r), Some(ivec2(0, 4)));
}
