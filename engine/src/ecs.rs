//! Entity capabilities and the component store.

use derive_more::{Deref, DerefMut};
use strum::{Display, EnumIter, EnumString};

use crate::{prelude::*, TaskId};

macro_rules! capabilities {
    {
        $($name:ident,)+
    } => {
        /// Names of the capabilities an entity can carry.
        ///
        /// String forms are the lowercased component type names.
        #[derive(
            Copy,
            Clone,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
            Debug,
            Display,
            EnumIter,
            EnumString,
        )]
        #[strum(serialize_all = "lowercase")]
        pub enum Capability {
            $($name,)+
        }

        impl Capability {
            pub(crate) fn is_on(self, ecs: &hecs::World, e: hecs::Entity) -> bool {
                match self {
                    $(Capability::$name => ecs.get::<&$name>(e).is_ok(),)+
                }
            }
        }
    }
}

capabilities! {
    Position,
    Physical,
    Actor,
    Navigate,
    Direction,
    FieldOfView,
    Sensor,
    Camera,
    Render,
    Marine,
    Alien,
    Hive,
    Squad,
}

/// Grid cell the entity occupies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Position(pub IVec2);

/// How the entity affects the cell it occupies.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Physical {
    pub block_pass: bool,
    pub block_sight: bool,
}

/// Entity can run tasks, owns an actor resource in the scheduler.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Actor;

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Navigate {
    /// Cells per unit of virtual time.
    pub speed: f64,
    /// Latest navigation command, interrupted when a new one comes in.
    pub task: Option<TaskId>,
}

impl Navigate {
    pub fn new(speed: f64) -> Self {
        Navigate { speed, task: None }
    }
}

/// Compass facing, one of `DIR_8`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Direction(pub IVec2);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct FieldOfView {
    pub radius: i32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Sensor {
    pub radius: i32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Camera {
    pub width: i32,
    pub height: i32,
}

/// Data for the presentation layer, higher layers draw on top.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Render {
    pub layer: i32,
    pub icon: char,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Marine;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Alien;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Hive;

/// Marine roster and selection.
#[derive(Clone, Debug, Default)]
pub struct Squad {
    /// Roster in the order the marines joined.
    pub marines: IndexSet<Entity>,
    pub current: usize,
    /// Camera that follows the selected marine.
    pub camera: Option<Entity>,
}

////////////////////////////////
// Containment bookkeeping, not exposed as capabilities.

#[derive(Clone, Debug, Eq, PartialEq, Default, Deref, DerefMut)]
pub(crate) struct Children(pub Vec<Entity>);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Parent(pub Entity);

////////////////////////////////

/// Entity component system. Stores all the data of game entities.
#[derive(Default, Deref, DerefMut)]
pub(crate) struct Ecs(pub(crate) hecs::World);

impl Ecs {
    pub(crate) fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.0.iter().map(|e| Entity(e.entity()))
    }
}
