use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};

pub type FastHashMap<K, V> = FxHashMap<K, V>;
pub type FastHashSet<V> = FxHashSet<V>;
/// A hash map with deterministic (insertion-order) iteration, used where
/// iteration order feeds derived row numbering.
pub type FastIndexMap<K, V> = IndexMap<K, V, rustc_hash::FxBuildHasher>;
