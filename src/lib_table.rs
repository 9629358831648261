use debugid::DebugId;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::fast_hash_map::FastHashMap;

/// An index into a thread's [`LibTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct LibIndex(pub(crate) u32);

impl LibIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// One shared library (or executable) referenced by a thread's resources
/// and native symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lib {
    pub name: String,
    pub debug_name: String,
    pub path: String,
    pub debug_path: String,
    pub debug_id: Option<DebugId>,
    pub code_id: Option<String>,
    pub arch: Option<String>,
}

/// The libs of one thread.
///
/// When profiles are merged, libs are identified by (name, debug name).
#[derive(Debug, Clone, Default)]
pub struct LibTable {
    libs: Vec<Lib>,
    index: FastHashMap<(String, String), LibIndex>,
}

impl LibTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn get(&self, index: LibIndex) -> Option<&Lib> {
        self.libs.get(index.usize())
    }

    pub fn len(&self) -> usize {
        self.libs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Lib> {
        self.libs.iter()
    }

    pub fn push(&mut self, lib: Lib) -> LibIndex {
        let index = LibIndex(self.libs.len() as u32);
        self.index
            .entry((lib.name.clone(), lib.debug_name.clone()))
            .or_insert(index);
        self.libs.push(lib);
        index
    }

    pub fn index_for_lib(&mut self, lib: &Lib) -> LibIndex {
        match self
            .index
            .get(&(lib.name.clone(), lib.debug_name.clone()))
        {
            Some(index) => *index,
            None => self.push(lib.clone()),
        }
    }
}

impl Serialize for LibIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for Lib {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("debugName", &self.debug_name)?;
        map.serialize_entry("path", &self.path)?;
        map.serialize_entry("debugPath", &self.debug_path)?;
        let breakpad_id = self.debug_id.map(|id| id.breakpad().to_string());
        map.serialize_entry("breakpadId", &breakpad_id)?;
        map.serialize_entry("codeId", &self.code_id)?;
        map.serialize_entry("arch", &self.arch)?;
        map.end()
    }
}
