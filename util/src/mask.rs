use std::fmt;

use glam::IVec2;

use crate::Rect;

/// Boolean grid aligned to a frame rectangle.
///
/// Points are given in the same coordinates as the frame, points outside
/// the frame read as false and ignore writes.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Mask {
    frame: Rect,
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(frame: Rect, value: bool) -> Self {
        Mask {
            frame,
            bits: vec![value; frame.area()],
        }
    }

    pub fn from_fn(frame: Rect, mut f: impl FnMut(IVec2) -> bool) -> Self {
        Mask {
            frame,
            bits: frame.iter().map(&mut f).collect(),
        }
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn get(&self, p: impl Into<IVec2>) -> bool {
        self.frame
            .index_of(p)
            .map_or(false, |i| self.bits[i])
    }

    /// Write a value, return whether the point was inside the frame.
    pub fn set(&mut self, p: impl Into<IVec2>, value: bool) -> bool {
        if let Some(i) = self.frame.index_of(p) {
            self.bits[i] = value;
            true
        } else {
            false
        }
    }

    /// Clear every cell that isn't set in `other`.
    pub fn intersect_with(&mut self, other: &Mask) {
        for (i, p) in self.frame.iter().enumerate() {
            if self.bits[i] && !other.get(p) {
                self.bits[i] = false;
            }
        }
    }

    /// Set every cell of this frame that is set in `other`.
    pub fn union_with(&mut self, other: &Mask) {
        let overlap = self.frame.intersection(&other.frame);
        for p in overlap.iter() {
            if other.get(p) {
                self.set(p, true);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec2, bool)> + '_ {
        self.frame.iter().zip(self.bits.iter().copied())
    }

    /// Iterate the points that are set.
    pub fn points(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.iter().filter_map(|(p, b)| b.then_some(p))
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.frame.width().max(1) as usize;
        for row in self.bits.chunks(w) {
            for &b in row {
                write!(f, "{}", if b { '*' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use glam::ivec2;

    use super::*;

    #[test]
    fn out_of_frame_is_false() {
        let mut m = Mask::new(Rect::sized([10, 10], [3, 2]), true);
        assert!(m.get([10, 10]));
        assert!(m.get([12, 11]));
        assert!(!m.get([13, 11]));
        assert!(!m.get([0, 0]));
        assert!(!m.set([0, 0], true));
        assert_eq!(m.count(), 6);
    }

    #[test]
    fn set_operations() {
        let mut a = Mask::from_fn(Rect::sized([0, 0], [4, 1]), |p| p.x < 3);
        let b = Mask::from_fn(Rect::sized([1, 0], [4, 1]), |p| p.x != 2);
        a.intersect_with(&b);
        assert_eq!(a.points().collect::<Vec<_>>(), vec![ivec2(1, 0)]);

        let mut c = Mask::new(Rect::sized([0, 0], [4, 1]), false);
        c.union_with(&b);
        assert_eq!(
            c.points().collect::<Vec<_>>(),
            vec![ivec2(1, 0), ivec2(3, 0)]
        );
    }

    #[test]
    fn display() {
        let m = Mask::from_fn(Rect::sized([0, 0], [3, 2]), |p| p.x == p.y);
        assert_eq!(m.to_string(), "*..\n.*.\n");
    }
}
