use bitflags::bitflags;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::fast_hash_map::FastHashMap;
use crate::resource_table::ResourceIndex;
use crate::string_table::StringIndex;

/// An index into a thread's [`FuncTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct FuncIndex(pub(crate) u32);

impl FuncIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Boolean properties of a function, packed into one column.
    #[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Default)]
    pub struct FuncFlags: u8 {
        /// This is a JS function.
        const IS_JS = 1 << 0;
        /// Not a JS function itself, but a frame the JS view wants to show,
        /// for example DOM API entry points.
        const IS_RELEVANT_FOR_JS = 1 << 1;
    }
}

/// The functions of one thread: one row per distinct function.
///
/// Rows are immutable once the profile is loaded; the interning index is only
/// consulted when threads are merged.
#[derive(Debug, Clone, Default)]
pub struct FuncTable {
    names: Vec<StringIndex>,
    flags: Vec<FuncFlags>,
    resources: Vec<Option<ResourceIndex>>,
    file_names: Vec<Option<StringIndex>>,
    line_numbers: Vec<Option<u32>>,
    column_numbers: Vec<Option<u32>>,
    index: FastHashMap<(StringIndex, Option<ResourceIndex>, Option<StringIndex>), FuncIndex>,
}

impl FuncTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        name: StringIndex,
        flags: FuncFlags,
        resource: Option<ResourceIndex>,
        file_name: Option<StringIndex>,
        line_number: Option<u32>,
        column_number: Option<u32>,
    ) -> FuncIndex {
        let index = FuncIndex(self.names.len() as u32);
        self.names.push(name);
        self.flags.push(flags);
        self.resources.push(resource);
        self.file_names.push(file_name);
        self.line_numbers.push(line_number);
        self.column_numbers.push(column_number);
        self.index
            .entry((name, resource, file_name))
            .or_insert(index);
        index
    }

    /// Find or append a row. Functions are identified by
    /// (name, resource, file name) when profiles are merged.
    pub fn index_for_func(
        &mut self,
        name: StringIndex,
        flags: FuncFlags,
        resource: Option<ResourceIndex>,
        file_name: Option<StringIndex>,
        line_number: Option<u32>,
        column_number: Option<u32>,
    ) -> FuncIndex {
        match self.index.get(&(name, resource, file_name)) {
            Some(index) => *index,
            None => self.push(name, flags, resource, file_name, line_number, column_number),
        }
    }

    pub fn name(&self, index: FuncIndex) -> StringIndex {
        self.names[index.usize()]
    }

    pub fn flags(&self, index: FuncIndex) -> FuncFlags {
        self.flags[index.usize()]
    }

    pub fn is_js(&self, index: FuncIndex) -> bool {
        self.flags[index.usize()].contains(FuncFlags::IS_JS)
    }

    pub fn resource(&self, index: FuncIndex) -> Option<ResourceIndex> {
        self.resources[index.usize()]
    }

    pub fn file_name(&self, index: FuncIndex) -> Option<StringIndex> {
        self.file_names[index.usize()]
    }

    pub fn line_number(&self, index: FuncIndex) -> Option<u32> {
        self.line_numbers[index.usize()]
    }

    pub fn column_number(&self, index: FuncIndex) -> Option<u32> {
        self.column_numbers[index.usize()]
    }
}

impl Serialize for FuncIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for FuncTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.names.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("name", &self.names)?;
        map.serialize_entry(
            "isJS",
            &SerializableFlagColumn(&self.flags, FuncFlags::IS_JS),
        )?;
        map.serialize_entry(
            "relevantForJS",
            &SerializableFlagColumn(&self.flags, FuncFlags::IS_RELEVANT_FOR_JS),
        )?;
        map.serialize_entry("resource", &SerializableResourceColumn(&self.resources))?;
        map.serialize_entry("fileName", &self.file_names)?;
        map.serialize_entry("lineNumber", &self.line_numbers)?;
        map.serialize_entry("columnNumber", &self.column_numbers)?;
        map.end()
    }
}

struct SerializableResourceColumn<'a>(&'a [Option<ResourceIndex>]);

impl Serialize for SerializableResourceColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for resource in self.0 {
            match resource {
                Some(resource) => seq.serialize_element(resource)?,
                None => seq.serialize_element(&-1)?,
            }
        }
        seq.end()
    }
}

struct SerializableFlagColumn<'a>(&'a [FuncFlags], FuncFlags);

impl Serialize for SerializableFlagColumn<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for item_flags in self.0 {
            seq.serialize_element(&item_flags.contains(self.1))?;
        }
        seq.end()
    }
}
