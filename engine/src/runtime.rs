use rand::SeedableRng;
use util::GameRng;

use crate::{ecs::*, prelude::*, sched::Scheduler, Space};

/// Main data container for the simulation.
pub struct Runtime {
    pub(crate) ecs: Ecs,
    pub(crate) space: Space,
    pub(crate) sched: Scheduler,
    pub(crate) settings: Settings,
    pub(crate) rng: GameRng,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new(Settings::default())
    }
}

impl Runtime {
    /// Empty world sized by the settings.
    pub fn new(settings: Settings) -> Self {
        Runtime {
            ecs: Default::default(),
            space: Space::new(settings.world_width, settings.world_height),
            sched: Default::default(),
            rng: GameRng::seed_from_u64(settings.seed),
            settings,
        }
    }

    /// Empty world of the given size with default settings otherwise.
    pub fn with_size(width: i32, height: i32) -> Self {
        Runtime::new(Settings {
            world_width: width,
            world_height: height,
            ..Default::default()
        })
    }

    /// Standard opening scenario.
    ///
    /// A two marine squad with a camera following the first marine, and a
    /// hive with a handful of aliens roaming around it.
    pub fn new_game(settings: Settings) -> Self {
        let mut r = Runtime::new(settings);
        let (w, h) = (r.space.width(), r.space.height());

        let camera = r.spawn_camera();
        let squad = r.spawn_squad(camera);
        r.spawn_marine(squad, [0, 0]);
        r.spawn_marine(squad, [w / 2 + 3, h / 2]);
        r.select_marine(squad, 0);

        if let Some(hive) = r.spawn_hive([w * 2 / 5, h * 11 / 20]) {
            r.populate_hive(hive, 4);
        }
        log::info!("Runtime::new_game: {w}x{h} world ready");
        r
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn spawn(&mut self, loadout: impl hecs::DynamicBundle) -> Entity {
        Entity(self.ecs.spawn(loadout))
    }

    /// All live entities.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.ecs.iter()
    }

    /// Entities that carry a capability.
    pub fn entities_with(
        &self,
        cap: Capability,
    ) -> impl Iterator<Item = Entity> + '_ {
        self.entities().filter(move |e| e.has_capability(self, cap))
    }

    /// Access the persistent simulation random number generator.
    pub fn rng(&mut self) -> &mut GameRng {
        &mut self.rng
    }
}

impl AsRef<Runtime> for Runtime {
    fn as_ref(&self) -> &Runtime {
        self
    }
}

impl AsMut<Runtime> for Runtime {
    fn as_mut(&mut self) -> &mut Runtime {
        self
    }
}
