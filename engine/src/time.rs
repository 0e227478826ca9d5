use std::{cmp::Ordering, fmt};

/// A point on the virtual simulation clock.
///
/// The clock is continuous, one unit is the time a speed 1 mover takes to
/// cross one cell.
#[derive(Copy, Clone, Default, Debug)]
pub struct Instant(pub(crate) f64);

impl Instant {
    pub const ZERO: Instant = Instant(0.0);

    pub fn new(t: f64) -> Self {
        Instant(t)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Instant {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Instant {}

impl PartialOrd for Instant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Instant {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}", self.0)
    }
}

impl std::ops::Add<f64> for Instant {
    type Output = Self;

    fn add(self, rhs: f64) -> Self::Output {
        Instant(self.0 + rhs)
    }
}

impl std::ops::AddAssign<f64> for Instant {
    fn add_assign(&mut self, rhs: f64) {
        self.0 += rhs;
    }
}

impl std::ops::Sub<Instant> for Instant {
    type Output = f64;

    fn sub(self, rhs: Instant) -> Self::Output {
        self.0 - rhs.0
    }
}

impl std::ops::Sub<f64> for Instant {
    type Output = Self;

    fn sub(self, rhs: f64) -> Self::Output {
        Instant(self.0 - rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ordering() {
        let a = Instant::new(1.5);
        let b = a + 0.25;
        assert!(a < b);
        assert_eq!(b - a, 0.25);
        assert_eq!(b - 0.25, a);
        assert_eq!(Instant::ZERO.max(a), a);
    }
}
