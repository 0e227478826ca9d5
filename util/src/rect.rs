use std::fmt;

use glam::{ivec2, IVec2};

/// Integer axis-aligned rectangle, `min` inclusive and `max` exclusive.
///
/// A rectangle whose `max` is not above `min` on both axes is empty.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash, Debug)]
pub struct Rect {
    min: IVec2,
    max: IVec2,
}

impl Rect {
    pub fn new(min: impl Into<IVec2>, max: impl Into<IVec2>) -> Self {
        let (min, max) = (min.into(), max.into());
        Rect {
            min,
            max: max.max(min),
        }
    }

    /// Rectangle at `min` with the given width and height.
    pub fn sized(min: impl Into<IVec2>, dim: impl Into<IVec2>) -> Self {
        let min = min.into();
        Rect::new(min, min + dim.into().max(IVec2::ZERO))
    }

    /// Square covering every cell within chessboard distance `radius` of
    /// `center`.
    pub fn around(center: impl Into<IVec2>, radius: i32) -> Self {
        let (c, r) = (center.into(), radius.max(0));
        Rect::new(c - ivec2(r, r), c + ivec2(r + 1, r + 1))
    }

    pub fn min(&self) -> IVec2 {
        self.min
    }

    pub fn max(&self) -> IVec2 {
        self.max
    }

    pub fn dim(&self) -> IVec2 {
        self.max - self.min
    }

    pub fn width(&self) -> i32 {
        self.dim().x
    }

    pub fn height(&self) -> i32 {
        self.dim().y
    }

    pub fn area(&self) -> usize {
        let d = self.dim();
        (d.x * d.y) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.area() == 0
    }

    pub fn contains(&self, p: impl Into<IVec2>) -> bool {
        let p = p.into();
        p.cmpge(self.min).all() && p.cmplt(self.max).all()
    }

    /// Overlap of two rectangles, empty if they do not meet.
    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect::new(self.min.max(other.min), self.max.min(other.max))
    }

    /// Row-major index of a point inside the rectangle.
    pub fn index_of(&self, p: impl Into<IVec2>) -> Option<usize> {
        let p = p.into();
        if !self.contains(p) {
            return None;
        }
        let d = p - self.min;
        Some((d.y * self.width() + d.x) as usize)
    }

    /// Inverse of `index_of`.
    pub fn point_at(&self, idx: usize) -> Option<IVec2> {
        if idx >= self.area() {
            return None;
        }
        let w = self.width() as usize;
        Some(self.min + ivec2((idx % w) as i32, (idx / w) as i32))
    }

    /// Iterate points in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = IVec2> {
        let r = *self;
        (r.min.y..r.max.y)
            .flat_map(move |y| (r.min.x..r.max.x).map(move |x| ivec2(x, y)))
    }
}

impl std::ops::Add<IVec2> for Rect {
    type Output = Rect;

    fn add(self, rhs: IVec2) -> Self::Output {
        Rect {
            min: self.min + rhs,
            max: self.max + rhs,
        }
    }
}

impl std::ops::Sub<IVec2> for Rect {
    type Output = Rect;

    fn sub(self, rhs: IVec2) -> Self::Output {
        self + (-rhs)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {}]..[{}, {}]",
            self.min.x, self.min.y, self.max.x, self.max.y
        )
    }
}
