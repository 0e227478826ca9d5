//! Spatial grid of cells and the occupancy queries built on it.

use std::str::FromStr;

use util::{Mask, Rect, Side};

use crate::{ecs::*, prelude::*};

/// One grid cell and the entities occupying it.
#[derive(Clone, Debug)]
pub struct Cell {
    pos: IVec2,
    /// Indices of adjacent cells in `Side` order.
    neighbors: [Option<usize>; 8],
    /// Occupants in entity order, so the list only depends on which
    /// entities are in the cell and not on how they got there.
    items: Vec<Entity>,
}

impl Cell {
    pub fn pos(&self) -> IVec2 {
        self.pos
    }

    /// Index of the adjacent cell on the given side.
    pub fn neighbor(&self, side: Side) -> Option<usize> {
        self.neighbors[side.index()]
    }

    pub fn neighbors(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().filter_map(|&n| n)
    }

    /// Occupants in the order they arrived.
    pub fn items(&self) -> &[Entity] {
        &self.items
    }
}

/// Fixed size grid of cells.
///
/// Only tracks occupancy, the entities' own records of where they are live
/// in the ECS and are kept in sync by `Entity::place` and `Entity::move_to`.
#[derive(Clone, Default, Debug)]
pub struct Space {
    frame: Rect,
    cells: Vec<Cell>,
}

impl Space {
    pub fn new(width: i32, height: i32) -> Self {
        let frame = Rect::sized([0, 0], [width.max(0), height.max(0)]);
        let cells = frame
            .iter()
            .map(|pos| {
                let mut neighbors = [None; 8];
                for side in Side::ALL {
                    neighbors[side.index()] = frame.index_of(pos + side.vec());
                }
                Cell {
                    pos,
                    neighbors,
                    items: Vec::new(),
                }
            })
            .collect();

        Space { frame, cells }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn width(&self) -> i32 {
        self.frame.width()
    }

    pub fn height(&self) -> i32 {
        self.frame.height()
    }

    pub fn is_cell(&self, p: impl Into<IVec2>) -> bool {
        self.frame.contains(p)
    }

    pub fn cell(&self, p: impl Into<IVec2>) -> Option<&Cell> {
        self.frame.index_of(p).map(|i| &self.cells[i])
    }

    pub fn cell_at(&self, idx: usize) -> Option<&Cell> {
        self.cells.get(idx)
    }

    /// Position of the adjacent cell on the given side.
    pub fn neighbor(&self, p: impl Into<IVec2>, side: Side) -> Option<IVec2> {
        let n = self.cell(p)?.neighbor(side)?;
        Some(self.cells[n].pos)
    }

    /// Occupants of a cell, empty for positions outside the grid.
    pub fn items(&self, p: impl Into<IVec2>) -> &[Entity] {
        self.cell(p).map(|c| c.items.as_slice()).unwrap_or(&[])
    }

    pub fn add_item(&mut self, p: impl Into<IVec2>, e: Entity) -> bool {
        let Some(i) = self.frame.index_of(p) else {
            return false;
        };
        let items = &mut self.cells[i].items;
        match items.binary_search(&e) {
            Ok(_) => false,
            Err(idx) => {
                items.insert(idx, e);
                true
            }
        }
    }

    pub fn remove_item(&mut self, p: impl Into<IVec2>, e: Entity) -> bool {
        let Some(i) = self.frame.index_of(p) else {
            return false;
        };
        let items = &mut self.cells[i].items;
        let Ok(idx) = items.binary_search(&e) else {
            return false;
        };
        items.remove(idx);
        true
    }

    /// Move an entity between cells.
    ///
    /// Both ends are checked before anything changes, so a failed move
    /// leaves occupancy untouched. Moving back restores both cells exactly.
    pub fn move_item(
        &mut self,
        from: impl Into<IVec2>,
        to: impl Into<IVec2>,
        e: Entity,
    ) -> bool {
        let (Some(a), Some(b)) =
            (self.frame.index_of(from), self.frame.index_of(to))
        else {
            return false;
        };
        let Ok(src) = self.cells[a].items.binary_search(&e) else {
            return false;
        };
        if a == b {
            return true;
        }
        let Err(dst) = self.cells[b].items.binary_search(&e) else {
            return false;
        };

        self.cells[a].items.remove(src);
        self.cells[b].items.insert(dst, e);
        true
    }
}

impl Runtime {
    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn is_cell(&self, p: impl Into<IVec2>) -> bool {
        self.space.is_cell(p)
    }

    /// Whether something in the cell stops movement. Positions outside the
    /// grid always block.
    pub fn blocks_pass(&self, p: impl Into<IVec2>) -> bool {
        match self.space.cell(p) {
            Some(c) => c.items.iter().any(|e| e.blocks_pass(self)),
            None => true,
        }
    }

    /// Whether something in the cell stops sight. Positions outside the grid
    /// always block.
    pub fn blocks_sight(&self, p: impl Into<IVec2>) -> bool {
        match self.space.cell(p) {
            Some(c) => c.items.iter().any(|e| e.blocks_sight(self)),
            None => true,
        }
    }

    /// Mask over the whole grid that is set on passable cells.
    ///
    /// Computed from scratch on every call.
    pub fn walk_mask(&self) -> Mask {
        Mask::from_fn(self.space.frame(), |p| !self.blocks_pass(p))
    }

    /// Mask over the part of `frame` inside the grid that is set on cells
    /// sight can pass through.
    pub fn sight_mask(&self, frame: Rect) -> Mask {
        let frame = frame.intersection(&self.space.frame());
        Mask::from_fn(frame, |p| !self.blocks_sight(p))
    }

    /// Occupants of a cell that carry the named capability.
    ///
    /// Unknown capability names match nothing.
    pub fn get_items_with_component(
        &self,
        p: impl Into<IVec2>,
        name: &str,
    ) -> Vec<Entity> {
        let Ok(cap) = Capability::from_str(name) else {
            return Vec::new();
        };
        self.items_with(p, cap)
    }

    pub fn items_with(
        &self,
        p: impl Into<IVec2>,
        cap: Capability,
    ) -> Vec<Entity> {
        self.space
            .items(p)
            .iter()
            .copied()
            .filter(|e| e.has_capability(self, cap))
            .collect()
    }

    /// Return entities at cell sorted to draw order.
    pub fn drawable_entities_at(&self, p: impl Into<IVec2>) -> Vec<Entity> {
        let mut ret: Vec<(i32, Entity)> = self
            .space
            .items(p)
            .iter()
            .filter_map(|&e| e.get::<Render>(self).map(|r| (r.layer, e)))
            .collect();
        ret.sort_by_key(|(layer, _)| *layer);
        ret.into_iter().map(|(_, e)| e).collect()
    }
}
