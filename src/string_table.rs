use std::ops::Deref;

use serde::ser::{Serialize, Serializer};

use crate::fast_hash_map::FastHashMap;

/// An index into a thread's [`StringTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct StringIndex(pub(crate) u32);

impl StringIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// A deduplicating table of strings.
///
/// Indexes are dense and handed out in first-seen order; the table never
/// shrinks, so an index stays valid for the lifetime of the profile.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    strings: Vec<String>,
    index: FastHashMap<String, StringIndex>,
}

impl StringTable {
    pub fn new() -> Self {
        Default::default()
    }

    /// Build a table from the `stringArray` of a processed profile.
    ///
    /// Duplicate entries keep their row (indexes from the profile JSON must
    /// stay valid) but only the first occurrence is found by
    /// [`StringTable::index_for_string`].
    pub fn from_strings(strings: Vec<String>) -> Self {
        let mut index = FastHashMap::default();
        for (i, s) in strings.iter().enumerate() {
            index
                .entry(s.clone())
                .or_insert(StringIndex(i as u32));
        }
        Self { strings, index }
    }

    pub fn index_for_string(&mut self, s: &str) -> StringIndex {
        match self.index.get(s) {
            Some(string_index) => *string_index,
            None => {
                let string_index = StringIndex(self.strings.len() as u32);
                self.strings.push(s.to_string());
                self.index.insert(s.to_string(), string_index);
                string_index
            }
        }
    }

    /// The index of an already-interned string.
    pub fn lookup(&self, s: &str) -> Option<StringIndex> {
        self.index.get(s).copied()
    }

    pub fn get(&self, index: StringIndex) -> Option<&str> {
        self.strings.get(index.usize()).map(Deref::deref)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Serialize for StringIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for StringTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.strings.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_first_seen_order() {
        let mut table = StringTable::new();
        let a = table.index_for_string("a");
        let b = table.index_for_string("b");
        let a2 = table.index_for_string("a");
        let c = table.index_for_string("c");
        assert_eq!(a, a2);
        assert_eq!((a.0, b.0, c.0), (0, 1, 2));
        assert_eq!(table.get(b), Some("b"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn from_strings_preserves_rows() {
        let mut table =
            StringTable::from_strings(vec!["x".into(), "y".into(), "x".into()]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(StringIndex(2)), Some("x"));
        // Interning finds the first occurrence.
        assert_eq!(table.index_for_string("x"), StringIndex(0));
    }
}
