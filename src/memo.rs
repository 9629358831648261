//! One-slot memoization for derived structures.
//!
//! Derived state (call trees, line timings) is recomputed wholesale when
//! any input changes; a single cached slot keyed on the full input tuple is
//! enough because consumers query one view at a time.

/// Caches the last computed value together with the key it was computed
/// from.
#[derive(Debug, Default)]
pub struct Memoized<K, V> {
    slot: Option<(K, V)>,
}

impl<K: PartialEq, V> Memoized<K, V> {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// Return the cached value if `key` matches the stored key, otherwise
    /// compute, store and return a fresh one.
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce(&K) -> V) -> &V {
        let stale = match &self.slot {
            Some((cached_key, _)) => *cached_key != key,
            None => true,
        };
        if stale {
            let value = compute(&key);
            self.slot = Some((key, value));
        }
        &self.slot.as_ref().unwrap().1
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
