use std::collections::VecDeque;

use crate::Terrain;

/// Octant transforms `[xx, xy, yx, yy]`, mapping scan coordinates `(dx, dy)`
/// with `dy = -row` and `-row <= dx <= 0` into the eight octants around the
/// origin.
const OCTANTS: [[i32; 4]; 8] = [
    [1, 0, 0, 1],
    [0, 1, 1, 0],
    [0, -1, 1, 0],
    [-1, 0, 0, 1],
    [-1, 0, 0, -1],
    [0, -1, -1, 0],
    [0, 1, -1, 0],
    [1, 0, 0, -1],
];

/// A pending sector scan, continues an octant from `row` outwards between
/// two slopes.
#[derive(Copy, Clone, Debug)]
struct Scan {
    octant: usize,
    row: i32,
    start: f32,
    end: f32,
}

/// Radius-limited recursive shadowcasting field of view.
///
/// Iterates the offsets of visible cells, starting with the origin. Cells on
/// octant boundaries can be reported more than once.
pub struct Fov<T> {
    terrain: T,
    radius: i32,
    stack: Vec<Scan>,
    pending: VecDeque<[i32; 2]>,
}

impl<T: Terrain> Fov<T> {
    pub fn new(terrain: T, radius: i32) -> Self {
        let radius = radius.max(0);
        let mut pending = VecDeque::new();
        let mut stack = Vec::new();

        if terrain.contains([0, 0]) {
            pending.push_back([0, 0]);
            if radius > 0 {
                // Reversed so that octant 0 gets scanned first.
                for octant in (0..8).rev() {
                    stack.push(Scan {
                        octant,
                        row: 1,
                        start: 1.0,
                        end: 0.0,
                    });
                }
            }
        }

        Fov {
            terrain,
            radius,
            stack,
            pending,
        }
    }

    fn scan(&mut self, scan: Scan) {
        let Scan {
            octant,
            row,
            mut start,
            end,
        } = scan;
        if start < end {
            return;
        }

        let [xx, xy, yx, yy] = OCTANTS[octant];
        let r2 = self.radius * self.radius;
        let mut new_start = start;

        for j in row..=self.radius {
            let dy = -j;
            let mut blocked = false;

            for dx in -j..=0 {
                // Slopes of the cell's near-left and far-right corners.
                let l_slope = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let r_slope = (dx as f32 + 0.5) / (dy as f32 - 0.5);

                if start < r_slope {
                    continue;
                } else if end > l_slope {
                    break;
                }

                let offset = [dx * xx + dy * xy, dx * yx + dy * yy];
                let exists = self.terrain.contains(offset);
                let opaque = !exists || self.terrain.is_opaque(offset);

                if exists && dx * dx + dy * dy <= r2 {
                    self.pending.push_back(offset);
                }

                if blocked {
                    if opaque {
                        new_start = r_slope;
                        continue;
                    } else {
                        blocked = false;
                        start = new_start;
                    }
                } else if opaque && j < self.radius {
                    blocked = true;
                    self.stack.push(Scan {
                        octant,
                        row: j + 1,
                        start,
                        end: l_slope,
                    });
                    new_start = r_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

impl<T: Terrain> Iterator for Fov<T> {
    type Item = [i32; 2];

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(offset) = self.pending.pop_front() {
                return Some(offset);
            }
            let scan = self.stack.pop()?;
            self.scan(scan);
        }
    }
}
