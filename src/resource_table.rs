use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::fast_hash_map::FastHashMap;
use crate::lib_table::LibIndex;
use crate::string_table::StringIndex;

/// An index into a thread's [`ResourceTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct ResourceIndex(pub(crate) u32);

impl ResourceIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// The kind of a resource row, matching the `resourceTypes` constants of the
/// processed profile format.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Unknown,
    Library,
    Addon,
    Webhost,
    Otherhost,
    Url,
}

impl ResourceKind {
    pub fn from_u32(v: u32) -> Self {
        match v {
            1 => ResourceKind::Library,
            2 => ResourceKind::Addon,
            3 => ResourceKind::Webhost,
            4 => ResourceKind::Otherhost,
            5 => ResourceKind::Url,
            _ => ResourceKind::Unknown,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            ResourceKind::Unknown => 0,
            ResourceKind::Library => 1,
            ResourceKind::Addon => 2,
            ResourceKind::Webhost => 3,
            ResourceKind::Otherhost => 4,
            ResourceKind::Url => 5,
        }
    }
}

/// The resources of one thread: one row per library, addon or host that
/// functions belong to.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    libs: Vec<Option<LibIndex>>,
    names: Vec<StringIndex>,
    hosts: Vec<Option<StringIndex>>,
    kinds: Vec<ResourceKind>,
    index: FastHashMap<(Option<LibIndex>, StringIndex, Option<StringIndex>, ResourceKind), ResourceIndex>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn push(
        &mut self,
        lib: Option<LibIndex>,
        name: StringIndex,
        host: Option<StringIndex>,
        kind: ResourceKind,
    ) -> ResourceIndex {
        let index = ResourceIndex(self.names.len() as u32);
        self.libs.push(lib);
        self.names.push(name);
        self.hosts.push(host);
        self.kinds.push(kind);
        self.index.entry((lib, name, host, kind)).or_insert(index);
        index
    }

    /// Find or append a row. Resources are identified by
    /// (lib, name, host, kind) when profiles are merged.
    pub fn index_for_resource(
        &mut self,
        lib: Option<LibIndex>,
        name: StringIndex,
        host: Option<StringIndex>,
        kind: ResourceKind,
    ) -> ResourceIndex {
        match self.index.get(&(lib, name, host, kind)) {
            Some(index) => *index,
            None => self.push(lib, name, host, kind),
        }
    }

    pub fn lib(&self, index: ResourceIndex) -> Option<LibIndex> {
        self.libs[index.usize()]
    }

    pub fn name(&self, index: ResourceIndex) -> StringIndex {
        self.names[index.usize()]
    }

    pub fn host(&self, index: ResourceIndex) -> Option<StringIndex> {
        self.hosts[index.usize()]
    }

    pub fn kind(&self, index: ResourceIndex) -> ResourceKind {
        self.kinds[index.usize()]
    }
}

impl Serialize for ResourceIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for ResourceTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.names.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("lib", &SerializableOptionalIndexColumn(&self.libs))?;
        map.serialize_entry("name", &self.names)?;
        map.serialize_entry("host", &self.hosts)?;
        map.serialize_entry(
            "type",
            &serde_json::Value::from(
                self.kinds.iter().map(|k| k.as_u32()).collect::<Vec<u32>>(),
            ),
        )?;
        map.end()
    }
}

struct SerializableOptionalIndexColumn<'a>(&'a [Option<LibIndex>]);

impl Serialize for SerializableOptionalIndexColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for lib in self.0 {
            match lib {
                Some(lib) => seq.serialize_element(lib)?,
                None => seq.serialize_element(&-1)?,
            }
        }
        seq.end()
    }
}
