//! Unopinionated standalone utilities.

mod geom;
pub use geom::{Side, VecExt, DIR_8};

mod mask;
pub use mask::Mask;

mod rect;
pub use rect::Rect;

mod rng;
pub use rng::{srng, RngExt};

pub type FastHasher = rustc_hash::FxHasher;

/// Map with an efficient hash function.
pub use rustc_hash::FxHashMap as HashMap;

/// Set with an efficient hash function.
pub use rustc_hash::FxHashSet as HashSet;

type DefaultHashBuilder = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion order preserving map with an efficient hash function.
pub type IndexMap<K, V> = indexmap::IndexMap<K, V, DefaultHashBuilder>;

/// Insertion order preserving set with an efficient hash function.
pub type IndexSet<V> = indexmap::IndexSet<V, DefaultHashBuilder>;

/// Good default concrete rng.
pub type GameRng = rand_xorshift::XorShiftRng;
