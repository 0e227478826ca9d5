//! What entities can see.

use util::{Mask, Rect, VecExt};

use crate::{ecs::*, prelude::*};

/// Cells of `frame` inside the view cone of a viewer at `anchor`.
///
/// Orthogonal facings see a 90° wedge between the two frame diagonals that
/// cross at the anchor, diagonal facings see the quadrant they point into.
/// A missing or zero facing sees the whole frame.
pub fn cone_mask(frame: Rect, anchor: IVec2, facing: Option<IVec2>) -> Mask {
    let f = facing.map(|f| f.to_facing()).unwrap_or(IVec2::ZERO);
    if f == IVec2::ZERO {
        return Mask::new(frame, true);
    }

    let a = anchor - frame.min();
    // Midline offset, (w - h) / 2 when the viewer is centered in the frame.
    let k = a.x - a.y;

    Mask::from_fn(frame, |p| {
        let l = p - frame.min();
        let d1 = (l.x - l.y) - k;
        let d2 = (l.x + l.y) - (a.x + a.y);
        match (f.x, f.y) {
            (0, -1) => d1 >= 0 && d2 <= 0,
            (0, 1) => d1 <= 0 && d2 >= 0,
            (1, 0) => d1 >= 0 && d2 >= 0,
            (-1, 0) => d1 <= 0 && d2 <= 0,
            (fx, fy) => (l.x - a.x) * fx >= 0 && (l.y - a.y) * fy >= 0,
        }
    })
}

/// Visible cells around `origin`.
///
/// `sight` is set where sight passes through a cell. Cells outside its frame
/// don't exist and are never visible. The result is the shadowcast field of
/// view within `radius` clipped to the view cone of `facing`.
pub fn compute_fov(
    origin: impl Into<IVec2>,
    radius: i32,
    sight: &Mask,
    facing: Option<IVec2>,
) -> Mask {
    struct View<'a> {
        origin: IVec2,
        sight: &'a Mask,
    }

    impl ::fov::Terrain for View<'_> {
        fn contains(&self, offset: [i32; 2]) -> bool {
            self.sight
                .frame()
                .contains(self.origin + IVec2::from(offset))
        }

        fn is_opaque(&self, offset: [i32; 2]) -> bool {
            !self.sight.get(self.origin + IVec2::from(offset))
        }
    }

    let origin = origin.into();
    let frame = Rect::around(origin, radius);

    let mut ret = Mask::new(frame, false);
    for offset in ::fov::Fov::new(View { origin, sight }, radius) {
        ret.set(origin + IVec2::from(offset), true);
    }
    ret.intersect_with(&cone_mask(frame, origin, facing));
    ret
}

impl Entity {
    /// How far the entity sees, from its field of view or failing that from
    /// its sensor.
    pub fn sight_radius(&self, r: &impl AsRef<Runtime>) -> i32 {
        if let Some(fov) = self.get::<FieldOfView>(r) {
            fov.radius
        } else if let Some(sensor) = self.get::<Sensor>(r) {
            sensor.radius
        } else {
            0
        }
    }

    /// Cells the entity currently sees, `None` if it's not on the grid.
    pub fn visible_mask(&self, r: &impl AsRef<Runtime>) -> Option<Mask> {
        let r = r.as_ref();
        let pos = self.pos(r)?;
        let radius = self.sight_radius(r);
        let sight = r.sight_mask(Rect::around(pos, radius));
        Some(compute_fov(pos, radius, &sight, self.facing(r)))
    }

    /// Other entities with the given capability that the entity can both
    /// sense and see.
    pub fn sense(
        &self,
        r: &impl AsRef<Runtime>,
        cap: Capability,
    ) -> Vec<Entity> {
        let r = r.as_ref();
        let (Some(pos), Some(Sensor { radius })) =
            (self.pos(r), self.get::<Sensor>(r))
        else {
            return Vec::new();
        };
        let Some(visible) = self.visible_mask(r) else {
            return Vec::new();
        };

        let mut ret = Vec::new();
        for p in Rect::around(pos, radius).iter() {
            if (p - pos).length_squared() > radius * radius || !visible.get(p)
            {
                continue;
            }
            for e in r.items_with(p, cap) {
                if e != *self && !ret.contains(&e) {
                    ret.push(e);
                }
            }
        }
        ret
    }
}

impl Runtime {
    /// What all observers see together, limited to `frame`.
    ///
    /// Observers are placed entities with a field of view.
    pub fn render_visibility(&self, frame: Rect) -> Mask {
        let observers: Vec<Entity> = self
            .ecs
            .query::<(&Position, &FieldOfView)>()
            .iter()
            .map(|(e, _)| Entity(e))
            .collect();

        let mut ret = Mask::new(frame, false);
        for e in observers {
            if let Some(seen) = e.visible_mask(self) {
                ret.union_with(&seen);
            }
        }
        ret
    }
}
