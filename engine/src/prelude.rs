pub use crate::{
    Capability, Entity, Instant, Outcome, Runtime, Settings, Task, TaskCx,
    TaskError, TaskId, TaskStatus, Wait, Wake,
};
pub use glam::{ivec2, IVec2};
pub use util::{HashMap, HashSet, IndexMap, IndexSet, VecExt, DIR_8};
