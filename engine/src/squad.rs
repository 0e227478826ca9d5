//! Marine squad, aliens and their hive.

use rand::seq::SliceRandom;
use util::Rect;

use crate::{ecs::*, prelude::*, Idle, Roam};

impl Runtime {
    /// Empty squad whose selected marine carries `camera` around.
    pub fn spawn_squad(&mut self, camera: Entity) -> Entity {
        self.spawn((Squad {
            camera: Some(camera),
            ..Default::default()
        },))
    }

    /// Put a new marine on the grid and add it to the squad's roster.
    ///
    /// Returns `None` if `p` is not a cell.
    pub fn spawn_marine(
        &mut self,
        squad: Entity,
        p: impl Into<IVec2>,
    ) -> Option<Entity> {
        let s = &self.settings;
        let loadout = (
            Render {
                layer: 1,
                icon: '@',
            },
            Actor,
            Navigate::new(s.marine_speed),
            Physical {
                block_pass: true,
                block_sight: true,
            },
            Direction(DIR_8[0]),
            FieldOfView {
                radius: s.fov_radius,
            },
            Sensor {
                radius: s.sensor_radius,
            },
            Marine,
        );
        let e = self.spawn_placed(loadout, p)?;

        if squad
            .with_mut(self, |s: &mut Squad| s.marines.insert(e))
            .is_none()
        {
            log::warn!("Runtime::spawn_marine: {squad} is not a squad");
        }
        self.start_baseline(e, Idle::new(self.settings.idle_timeout));
        Some(e)
    }

    pub fn spawn_alien(&mut self, p: impl Into<IVec2>) -> Option<Entity> {
        let s = &self.settings;
        let loadout = (
            Render {
                layer: 1,
                icon: 'a',
            },
            Actor,
            Navigate::new(s.alien_speed),
            Physical {
                block_pass: true,
                block_sight: false,
            },
            Direction(DIR_8[0]),
            Sensor {
                radius: s.sensor_radius,
            },
            Alien,
        );
        let e = self.spawn_placed(loadout, p)?;
        self.start_baseline(e, Roam);
        Some(e)
    }

    pub fn spawn_hive(&mut self, p: impl Into<IVec2>) -> Option<Entity> {
        let loadout = (
            Render {
                layer: 0,
                icon: 'H',
            },
            Actor,
            Physical {
                block_pass: true,
                block_sight: true,
            },
            Hive,
        );
        self.spawn_placed(loadout, p)
    }

    /// Spawn up to `n` aliens on free cells around a hive, nearest rings
    /// first.
    pub fn populate_hive(&mut self, hive: Entity, n: usize) -> Vec<Entity> {
        let mut ret = Vec::new();
        let Some(center) = hive.pos(self) else {
            log::warn!("Runtime::populate_hive: {hive} is not placed");
            return ret;
        };

        let max_radius = self.space.width().max(self.space.height());
        for radius in 1..=max_radius {
            let mut ring: Vec<IVec2> = Rect::around(center, radius)
                .iter()
                .filter(|&p| (p - center).chebyshev_len() == radius)
                .filter(|&p| self.is_cell(p) && !self.blocks_pass(p))
                .collect();
            ring.shuffle(&mut self.rng);

            for p in ring {
                if ret.len() >= n {
                    return ret;
                }
                if let Some(e) = self.spawn_alien(p) {
                    ret.push(e);
                }
            }
        }
        ret
    }

    pub fn squad_roster(&self, squad: Entity) -> Vec<Entity> {
        squad
            .get::<Squad>(self)
            .map(|s| s.marines.into_iter().collect())
            .unwrap_or_default()
    }

    /// The selected marine.
    pub fn current_marine(&self, squad: Entity) -> Option<Entity> {
        let s = squad.get::<Squad>(self)?;
        s.marines.get_index(s.current).copied()
    }

    /// Select a marine by roster index, clamped to the roster, and move the
    /// squad camera onto it.
    pub fn select_marine(
        &mut self,
        squad: Entity,
        idx: usize,
    ) -> Option<Entity> {
        let s = squad.get::<Squad>(self)?;
        let current = idx.min(s.marines.len().checked_sub(1)?);
        let marine = *s.marines.get_index(current)?;
        squad.with_mut(self, |q: &mut Squad| q.current = current);

        if let Some(camera) = s.camera {
            marine.add_child(self, camera);
        }
        Some(marine)
    }

    pub fn select_next(&mut self, squad: Entity) -> Option<Entity> {
        let current = squad.get::<Squad>(self)?.current;
        self.select_marine(squad, current + 1)
    }

    pub fn select_prev(&mut self, squad: Entity) -> Option<Entity> {
        let current = squad.get::<Squad>(self)?.current;
        self.select_marine(squad, current.saturating_sub(1))
    }

    /// Spawn an entity and place it, undo the spawn if the place fails.
    fn spawn_placed(
        &mut self,
        loadout: impl hecs::DynamicBundle,
        p: impl Into<IVec2>,
    ) -> Option<Entity> {
        let e = self.spawn(loadout);
        if e.place(self, p) {
            Some(e)
        } else {
            e.destroy(self);
            None
        }
    }

    fn start_baseline(&mut self, e: Entity, task: impl Task + 'static) {
        let priority = self.settings.idle_priority;
        self.submit_task(e, task, priority, false);
    }
}
