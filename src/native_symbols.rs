use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::lib_table::LibIndex;
use crate::string_table::StringIndex;

/// An index into a thread's [`NativeSymbolTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct NativeSymbolIndex(pub(crate) u32);

impl NativeSymbolIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// The native symbols of one thread: one row per machine-code symbol that
/// frames were resolved to.
///
/// A source-level function which was inlined into two different outer
/// functions shows up under two different native symbol rows; the address
/// timing engine attributes hits per symbol, not per function.
#[derive(Debug, Clone, Default)]
pub struct NativeSymbolTable {
    lib_indexes: Vec<LibIndex>,
    addresses: Vec<u64>,
    function_sizes: Vec<Option<u32>>,
    names: Vec<StringIndex>,
}

impl NativeSymbolTable {
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
        lib: LibIndex,
        address: u64,
        function_size: Option<u32>,
        name: StringIndex,
    ) -> NativeSymbolIndex {
        let index = NativeSymbolIndex(self.names.len() as u32);
        self.lib_indexes.push(lib);
        self.addresses.push(address);
        self.function_sizes.push(function_size);
        self.names.push(name);
        index
    }

    pub fn lib(&self, index: NativeSymbolIndex) -> LibIndex {
        self.lib_indexes[index.usize()]
    }

    pub fn address(&self, index: NativeSymbolIndex) -> u64 {
        self.addresses[index.usize()]
    }

    pub fn function_size(&self, index: NativeSymbolIndex) -> Option<u32> {
        self.function_sizes[index.usize()]
    }

    pub fn name(&self, index: NativeSymbolIndex) -> StringIndex {
        self.names[index.usize()]
    }
}

impl Serialize for NativeSymbolIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for NativeSymbolTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.names.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("libIndex", &self.lib_indexes)?;
        map.serialize_entry("address", &self.addresses)?;
        map.serialize_entry("functionSize", &self.function_sizes)?;
        map.serialize_entry("name", &self.names)?;
        map.end()
    }
}
