use std::{cmp::Ordering, collections::BinaryHeap, f64::consts::SQRT_2};

use util::{Mask, DIR_8};

use crate::prelude::*;

/// Open set node, ordered so that `BinaryHeap` pops the lowest estimated
/// total cost first and the earliest inserted node among equals.
#[derive(Copy, Clone, Debug)]
struct Open {
    f: f64,
    seq: usize,
    idx: usize,
}

impl PartialEq for Open {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Open {}

impl PartialOrd for Open {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Open {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A* search over the set cells of a walkability mask.
///
/// Moves go to all 8 neighbors, orthogonal steps cost 1 and diagonal steps
/// cost √2, corners may be cut. The start cell does not need to be
/// walkable.
///
/// Returns the cells from `start` to `goal` inclusive, or an empty vector
/// when the goal can't be reached.
pub fn find_path(
    walk: &Mask,
    start: impl Into<IVec2>,
    goal: impl Into<IVec2>,
) -> Vec<IVec2> {
    let (start, goal) = (start.into(), goal.into());
    let frame = walk.frame();

    let (Some(start_idx), Some(goal_idx)) =
        (frame.index_of(start), frame.index_of(goal))
    else {
        return Vec::new();
    };
    if start == goal {
        return vec![start];
    }
    if !walk.get(goal) {
        return Vec::new();
    }

    let h = |p: IVec2| (goal - p).euclidean_len();

    let n = frame.area();
    let mut g = vec![f64::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();
    let mut seq = 0;

    g[start_idx] = 0.0;
    open.push(Open {
        f: h(start),
        seq,
        idx: start_idx,
    });

    while let Some(Open { idx, .. }) = open.pop() {
        if closed[idx] {
            continue;
        }
        closed[idx] = true;

        if idx == goal_idx {
            let mut path = vec![goal];
            let mut i = idx;
            while i != start_idx {
                i = came_from[i];
                let Some(p) = frame.point_at(i) else {
                    break;
                };
                path.push(p);
            }
            path.reverse();
            return path;
        }

        let Some(p) = frame.point_at(idx) else {
            continue;
        };
        for (i, d) in DIR_8.iter().enumerate() {
            let q = p + *d;
            let Some(j) = frame.index_of(q) else {
                continue;
            };
            if closed[j] || !walk.get(q) {
                continue;
            }

            let cost = if i % 2 == 1 { SQRT_2 } else { 1.0 };
            let g2 = g[idx] + cost;
            if g2 < g[j] {
                g[j] = g2;
                came_from[j] = idx;
                seq += 1;
                open.push(Open {
                    f: g2 + h(q),
                    seq,
                    idx: j,
                });
            }
        }
    }

    Vec::new()
}

/// Movement cost of a path under the same model `find_path` uses.
pub fn path_cost(path: &[IVec2]) -> f64 {
    path.windows(2).map(|w| (w[1] - w[0]).octile_len()).sum()
}

impl Runtime {
    /// Find a path over the current grid.
    ///
    /// The start cell counts as walkable so that an entity standing there
    /// doesn't block its own route.
    pub fn find_path(
        &self,
        start: impl Into<IVec2>,
        goal: impl Into<IVec2>,
    ) -> Vec<IVec2> {
        let start = start.into();
        let mut walk = self.walk_mask();
        walk.set(start, true);
        find_path(&walk, start, goal)
    }
}
