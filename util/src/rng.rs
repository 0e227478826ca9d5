use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand_xorshift::XorShiftRng;

/// Construct a throwaway random number generator seeded by a noise value.
///
/// Good for short-term use in immutable contexts given a varying source of
/// noise like map position coordinates.
pub fn srng(seed: &(impl Hash + ?Sized)) -> XorShiftRng {
    let mut h = crate::FastHasher::default();
    seed.hash(&mut h);
    XorShiftRng::seed_from_u64(h.finish())
}

pub trait RngExt {
    fn one_chance_in(&mut self, n: usize) -> bool;

    /// Return true with probability `p`, clamped to `0.0..=1.0`.
    fn chance(&mut self, p: f64) -> bool;
}

impl<T: Rng + ?Sized> RngExt for T {
    fn one_chance_in(&mut self, n: usize) -> bool {
        if n == 0 {
            return false;
        }
        self.gen_range(0..n) == 0
    }

    fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.gen_range(0.0..1.0) < p
        }
    }
}
