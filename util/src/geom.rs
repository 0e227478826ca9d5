use std::f64::consts::SQRT_2;

use glam::{ivec2, IVec2};

/// 8 directions, clock face order.
///
/// Screen coordinates, y grows downwards so north is `(0, -1)`.
pub const DIR_8: [IVec2; 8] = [
    IVec2::from_array([0, -1]),
    IVec2::from_array([1, -1]),
    IVec2::from_array([1, 0]),
    IVec2::from_array([1, 1]),
    IVec2::from_array([0, 1]),
    IVec2::from_array([-1, 1]),
    IVec2::from_array([-1, 0]),
    IVec2::from_array([-1, -1]),
];

/// Named neighbor relations of a grid cell, in `DIR_8` order.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum Side {
    Up,
    UpRight,
    Right,
    DownRight,
    Down,
    DownLeft,
    Left,
    UpLeft,
}

impl Side {
    pub const ALL: [Side; 8] = [
        Side::Up,
        Side::UpRight,
        Side::Right,
        Side::DownRight,
        Side::Down,
        Side::DownLeft,
        Side::Left,
        Side::UpLeft,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn vec(self) -> IVec2 {
        DIR_8[self.index()]
    }

    /// Side whose offset vector is `v`, if `v` is a unit step.
    pub fn from_vec(v: IVec2) -> Option<Side> {
        DIR_8.iter().position(|&d| d == v).map(|i| Side::ALL[i])
    }

    pub fn is_diagonal(self) -> bool {
        self.index() % 2 == 1
    }
}

pub trait VecExt: Sized + Default {
    /// Absolute size of vector in taxicab metric.
    fn taxi_len(&self) -> i32;

    /// Absolute size of vector in chessboard metric.
    fn chebyshev_len(&self) -> i32;

    /// Cost of the cheapest 8-way walk along the vector when orthogonal
    /// steps cost 1 and diagonal steps cost √2.
    fn octile_len(&self) -> f64;

    /// Straight-line length.
    fn euclidean_len(&self) -> f64;

    /// Vec points to one of the 8 cells surrounding origin.
    fn is_step(&self) -> bool {
        self.chebyshev_len() == 1
    }

    /// Clamp every component to `-1..=1`, giving one of the 8 compass
    /// directions or the zero vector.
    fn to_facing(&self) -> Self;

    /// Rotate a compass direction one octant clockwise.
    ///
    /// Non-step vectors are clamped to a facing first, zero stays zero.
    fn turned_cw(&self) -> Self;

    /// Rotate a compass direction one octant counterclockwise.
    fn turned_ccw(&self) -> Self;
}

impl VecExt for IVec2 {
    fn taxi_len(&self) -> i32 {
        self[0].abs() + self[1].abs()
    }

    fn chebyshev_len(&self) -> i32 {
        self[0].abs().max(self[1].abs())
    }

    fn octile_len(&self) -> f64 {
        let (a, b) = (self[0].abs(), self[1].abs());
        let (long, short) = (a.max(b) as f64, a.min(b) as f64);
        (long - short) + short * SQRT_2
    }

    fn euclidean_len(&self) -> f64 {
        let (x, y) = (self[0] as f64, self[1] as f64);
        (x * x + y * y).sqrt()
    }

    fn to_facing(&self) -> Self {
        ivec2(self[0].signum(), self[1].signum())
    }

    fn turned_cw(&self) -> Self {
        let f = self.to_facing();
        match Side::from_vec(f) {
            Some(s) => DIR_8[(s.index() + 1) % 8],
            None => f,
        }
    }

    fn turned_ccw(&self) -> Self {
        let f = self.to_facing();
        match Side::from_vec(f) {
            Some(s) => DIR_8[(s.index() + 7) % 8],
            None => f,
        }
    }
}
