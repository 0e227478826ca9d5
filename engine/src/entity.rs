//! Generic entity logic.
use std::fmt;

use derive_more::Deref;
use hecs::Component;

use crate::{ecs::*, prelude::*};

// Dummy wrapper so we can write impls for it directly instead of deriving a
// trait for hecs::Entity and writing every fn signature twice.
/// Game entity identifier datatype. All the actual contents live in the ECS.
#[derive(Copy, Clone, Hash, Eq, Ord, PartialEq, PartialOrd, Debug, Deref)]
pub struct Entity(pub(crate) hecs::Entity);

impl Entity {
    /// Copy of a component, `None` when the entity doesn't have it.
    pub fn get<T>(&self, r: &impl AsRef<Runtime>) -> Option<T>
    where
        T: Component + Clone,
    {
        let r = r.as_ref();
        r.ecs.get::<&T>(**self).ok().map(|c| (*c).clone())
    }

    pub fn has<T: Component>(&self, r: &impl AsRef<Runtime>) -> bool {
        r.as_ref().ecs.get::<&T>(**self).is_ok()
    }

    /// Attach a component or replace an existing one.
    pub fn set<T: Component>(&self, r: &mut impl AsMut<Runtime>, val: T) {
        let r = r.as_mut();
        if r.ecs.insert_one(**self, val).is_err() {
            log::warn!("Entity::set: {self} is not alive");
        }
    }

    pub fn remove<T: Component>(
        &self,
        r: &mut impl AsMut<Runtime>,
    ) -> Option<T> {
        r.as_mut().ecs.remove_one::<T>(**self).ok()
    }

    /// Access and mutate a component using a closure.
    ///
    /// Returns `None` without calling the closure if the component is
    /// missing.
    pub fn with_mut<T: Component, U>(
        &self,
        r: &mut impl AsMut<Runtime>,
        f: impl FnOnce(&mut T) -> U,
    ) -> Option<U> {
        let r = r.as_mut();
        r.ecs.query_one_mut::<&mut T>(**self).ok().map(f)
    }

    pub fn has_capability(
        &self,
        r: &impl AsRef<Runtime>,
        cap: Capability,
    ) -> bool {
        cap.is_on(&r.as_ref().ecs, **self)
    }

    pub fn is_alive(&self, r: &impl AsRef<Runtime>) -> bool {
        r.as_ref().ecs.contains(**self)
    }

    pub fn pos(&self, r: &impl AsRef<Runtime>) -> Option<IVec2> {
        self.get::<Position>(r).map(|p| p.0)
    }

    pub fn facing(&self, r: &impl AsRef<Runtime>) -> Option<IVec2> {
        self.get::<Direction>(r).map(|d| d.0)
    }

    /// Movement speed, `None` for entities that can't navigate.
    pub fn speed(&self, r: &impl AsRef<Runtime>) -> Option<f64> {
        self.get::<Navigate>(r).map(|n| n.speed)
    }

    pub fn blocks_pass(&self, r: &impl AsRef<Runtime>) -> bool {
        self.get::<Physical>(r).map_or(false, |p| p.block_pass)
    }

    pub fn blocks_sight(&self, r: &impl AsRef<Runtime>) -> bool {
        self.get::<Physical>(r).map_or(false, |p| p.block_sight)
    }

    /// Put the entity on the grid, or move it if it's already placed.
    ///
    /// Returns false if `p` is not a cell.
    pub fn place(
        &self,
        r: &mut impl AsMut<Runtime>,
        p: impl Into<IVec2>,
    ) -> bool {
        let r = r.as_mut();
        let p = p.into();

        if self.pos(r).is_some() {
            return self.move_to(r, p);
        }
        if !self.is_alive(r) {
            log::warn!("Entity::place: {self} is not alive");
            return false;
        }
        if !r.space.add_item(p, *self) {
            log::warn!("Entity::place: {p} is not a cell");
            return false;
        }
        self.set(r, Position(p));

        for c in self.children(r) {
            c.place(r, p);
        }
        true
    }

    /// Move a placed entity and everything it contains to `p`.
    ///
    /// An entity with a direction turns to face along the move.
    pub fn move_to(
        &self,
        r: &mut impl AsMut<Runtime>,
        p: impl Into<IVec2>,
    ) -> bool {
        let r = r.as_mut();
        let p = p.into();

        let Some(old) = self.pos(r) else {
            log::warn!("Entity::move_to: {self} is not placed");
            return false;
        };

        if old != p {
            if !r.space.move_item(old, p, *self) {
                return false;
            }
            self.set(r, Position(p));
            if self.has::<Direction>(r) {
                self.set(r, Direction((p - old).to_facing()));
            }
        }

        for c in self.children(r) {
            c.place(r, p);
        }
        true
    }

    /// Take the entity and its children off the grid.
    pub fn unplace(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        if let Some(p) = self.pos(r) {
            r.space.remove_item(p, *self);
            self.remove::<Position>(r);
        }
        for c in self.children(r) {
            c.unplace(r);
        }
    }

    pub fn turn_cw(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        if let Some(f) = self.facing(r) {
            self.set(r, Direction(f.turned_cw()));
        }
    }

    pub fn turn_ccw(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();
        if let Some(f) = self.facing(r) {
            self.set(r, Direction(f.turned_ccw()));
        }
    }

    pub fn parent(&self, r: &impl AsRef<Runtime>) -> Option<Entity> {
        self.get::<Parent>(r).map(|p| p.0)
    }

    pub fn children(&self, r: &impl AsRef<Runtime>) -> Vec<Entity> {
        self.get::<Children>(r).map(|c| c.0).unwrap_or_default()
    }

    /// Return whether `other` is somewhere inside this entity.
    pub fn contains(&self, r: &impl AsRef<Runtime>, other: &Entity) -> bool {
        for c in self.children(r) {
            if c == *other || c.contains(r, other) {
                return true;
            }
        }
        false
    }

    /// Make `child` follow this entity around.
    ///
    /// The child is taken from its previous parent and moved onto this
    /// entity's cell. Containment loops are refused.
    pub fn add_child(
        &self,
        r: &mut impl AsMut<Runtime>,
        child: Entity,
    ) -> bool {
        let r = r.as_mut();

        if child == *self || child.contains(r, self) {
            log::warn!("Entity::add_child: Containment loop");
            return false;
        }
        if !self.is_alive(r) || !child.is_alive(r) {
            return false;
        }

        if let Some(old) = child.parent(r) {
            old.remove_child(r, child);
        }
        if self
            .with_mut(r, |cs: &mut Children| cs.push(child))
            .is_none()
        {
            self.set(r, Children(vec![child]));
        }
        child.set(r, Parent(*self));

        if let Some(p) = self.pos(r) {
            child.place(r, p);
        }
        true
    }

    /// Detach a child, it stays where it is.
    pub fn remove_child(
        &self,
        r: &mut impl AsMut<Runtime>,
        child: Entity,
    ) -> bool {
        let r = r.as_mut();
        let found = self
            .with_mut(r, |cs: &mut Children| {
                let n = cs.len();
                cs.retain(|&c| c != child);
                cs.len() != n
            })
            .unwrap_or(false);
        if found {
            child.remove::<Parent>(r);
        }
        found
    }

    /// Remove the entity from the simulation.
    ///
    /// Its tasks get interrupted, children are detached and left in place.
    pub fn destroy(&self, r: &mut impl AsMut<Runtime>) {
        let r = r.as_mut();

        r.interrupt_entity(*self);
        if let Some(p) = self.parent(r) {
            p.remove_child(r, *self);
        }
        for c in self.children(r) {
            self.remove_child(r, c);
        }
        if let Some(p) = self.pos(r) {
            r.space.remove_item(p, *self);
        }
        let _ = r.ecs.despawn(**self);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0.id())
    }
}
