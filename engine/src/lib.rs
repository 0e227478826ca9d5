//! Simulation core for a tile-based tactical game.
//!
//! Entities live on a fixed grid, see through shadowcast view cones and
//! act through preemptible tasks running on a virtual clock.

mod ai;
pub use ai::{Idle, Roam};

mod camera;

pub mod ecs;
pub use ecs::Capability;

mod entity;
pub use entity::Entity;

mod movement;
pub use movement::{GoTo, Step};

mod pacing;
pub use pacing::Pacer;

mod pathing;
pub use pathing::{find_path, path_cost};

pub mod prelude;

mod runtime;
pub use runtime::Runtime;

mod sched;
pub use sched::ActorResource;

mod settings;
pub use settings::Settings;

mod space;
pub use space::{Cell, Space};

mod squad;

mod task;
pub use task::{
    Outcome, Task, TaskCx, TaskError, TaskId, TaskStatus, Wait, Wake,
};

mod time;
pub use time::Instant;

mod visibility;
pub use visibility::{compute_fov, cone_mask};
