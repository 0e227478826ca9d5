//! Generic field-of-view computation.
//!
//! ```
//! struct Open;
//!
//! impl fov::Terrain for Open {
//!     fn contains(&self, _offset: [i32; 2]) -> bool {
//!         true
//!     }
//!
//!     fn is_opaque(&self, _offset: [i32; 2]) -> bool {
//!         false
//!     }
//! }
//!
//! let seen: std::collections::HashSet<[i32; 2]> =
//!     fov::Fov::new(Open, 2).collect();
//! assert!(seen.contains(&[0, 0]));
//! assert!(seen.contains(&[2, 0]));
//! assert!(!seen.contains(&[2, 2]));
//! ```

mod shadowcast;
pub use shadowcast::Fov;

/// View of the terrain the field of view is being computed over.
///
/// Offsets are relative to the viewpoint, in screen coordinates where y
/// grows downwards.
pub trait Terrain {
    /// Whether the cell at offset exists. Cells that don't exist are never
    /// reported as visible and block sight like walls.
    fn contains(&self, offset: [i32; 2]) -> bool;

    /// Whether the cell at offset stops sight from passing through it. An
    /// opaque cell is itself visible.
    fn is_opaque(&self, offset: [i32; 2]) -> bool;
}

impl<T: Terrain + ?Sized> Terrain for &T {
    fn contains(&self, offset: [i32; 2]) -> bool {
        (**self).contains(offset)
    }

    fn is_opaque(&self, offset: [i32; 2]) -> bool {
        (**self).is_opaque(offset)
    }
}
