use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::category::{CategoryIndex, SubcategoryIndex};
use crate::fast_hash_map::FastHashMap;
use crate::func_table::FuncIndex;
use crate::native_symbols::NativeSymbolIndex;
use crate::string_table::StringIndex;

/// An index into a thread's [`FrameTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct FrameIndex(pub(crate) u32);

impl FrameIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// The full set of columns that makes a frame row distinct. Two frames with
/// the same func but different lines (or addresses, or inline depths) are
/// different rows.
pub type FrameKey = (
    FuncIndex,
    Option<CategoryIndex>,
    Option<SubcategoryIndex>,
    Option<StringIndex>,
    Option<u32>,
    Option<u32>,
    Option<u64>,
    Option<NativeSymbolIndex>,
    u16,
);

/// The frames of one thread: one row per distinct
/// (func, category, subcategory, implementation, line, column, inlining)
/// combination appearing in any stack. Multiple stacks can share a frame.
#[derive(Debug, Clone, Default)]
pub struct FrameTable {
    funcs: Vec<FuncIndex>,
    categories: Vec<Option<CategoryIndex>>,
    subcategories: Vec<Option<SubcategoryIndex>>,
    implementations: Vec<Option<StringIndex>>,
    lines: Vec<Option<u32>>,
    columns: Vec<Option<u32>>,
    addresses: Vec<Option<u64>>,
    native_symbols: Vec<Option<NativeSymbolIndex>>,
    inline_depths: Vec<u16>,
    inner_window_ids: Vec<Option<u64>>,
    index: FastHashMap<FrameKey, FrameIndex>,
}

impl FrameTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        func: FuncIndex,
        category: Option<CategoryIndex>,
        subcategory: Option<SubcategoryIndex>,
        implementation: Option<StringIndex>,
        line: Option<u32>,
        column: Option<u32>,
        address: Option<u64>,
        native_symbol: Option<NativeSymbolIndex>,
        inline_depth: u16,
        inner_window_id: Option<u64>,
    ) -> FrameIndex {
        let index = FrameIndex(self.funcs.len() as u32);
        self.funcs.push(func);
        self.categories.push(category);
        self.subcategories.push(subcategory);
        self.implementations.push(implementation);
        self.lines.push(line);
        self.columns.push(column);
        self.addresses.push(address);
        self.native_symbols.push(native_symbol);
        self.inline_depths.push(inline_depth);
        self.inner_window_ids.push(inner_window_id);
        self.index
            .entry((
                func,
                category,
                subcategory,
                implementation,
                line,
                column,
                address,
                native_symbol,
                inline_depth,
            ))
            .or_insert(index);
        index
    }

    /// Find or append a row with the given columns.
    #[allow(clippy::too_many_arguments)]
    pub fn index_for_frame(
        &mut self,
        func: FuncIndex,
        category: Option<CategoryIndex>,
        subcategory: Option<SubcategoryIndex>,
        implementation: Option<StringIndex>,
        line: Option<u32>,
        column: Option<u32>,
        address: Option<u64>,
        native_symbol: Option<NativeSymbolIndex>,
        inline_depth: u16,
        inner_window_id: Option<u64>,
    ) -> FrameIndex {
        match self.index.get(&(
            func,
            category,
            subcategory,
            implementation,
            line,
            column,
            address,
            native_symbol,
            inline_depth,
        )) {
            Some(index) => *index,
            None => self.push(
                func,
                category,
                subcategory,
                implementation,
                line,
                column,
                address,
                native_symbol,
                inline_depth,
                inner_window_id,
            ),
        }
    }

    pub(crate) fn remap_categories(&mut self, map: impl Fn(CategoryIndex) -> CategoryIndex) {
        for category in self.categories.iter_mut().flatten() {
            *category = map(*category);
        }
    }

    pub fn func(&self, index: FrameIndex) -> FuncIndex {
        self.funcs[index.usize()]
    }

    pub fn category(&self, index: FrameIndex) -> Option<CategoryIndex> {
        self.categories[index.usize()]
    }

    pub fn subcategory(&self, index: FrameIndex) -> Option<SubcategoryIndex> {
        self.subcategories[index.usize()]
    }

    pub fn implementation(&self, index: FrameIndex) -> Option<StringIndex> {
        self.implementations[index.usize()]
    }

    pub fn line(&self, index: FrameIndex) -> Option<u32> {
        self.lines[index.usize()]
    }

    pub fn column(&self, index: FrameIndex) -> Option<u32> {
        self.columns[index.usize()]
    }

    pub fn address(&self, index: FrameIndex) -> Option<u64> {
        self.addresses[index.usize()]
    }

    pub fn native_symbol(&self, index: FrameIndex) -> Option<NativeSymbolIndex> {
        self.native_symbols[index.usize()]
    }

    pub fn inline_depth(&self, index: FrameIndex) -> u16 {
        self.inline_depths[index.usize()]
    }

    pub fn inner_window_id(&self, index: FrameIndex) -> Option<u64> {
        self.inner_window_ids[index.usize()]
    }
}

impl Serialize for FrameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for FrameTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.funcs.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("func", &self.funcs)?;
        map.serialize_entry("category", &self.categories)?;
        map.serialize_entry("subcategory", &self.subcategories)?;
        map.serialize_entry("implementation", &self.implementations)?;
        map.serialize_entry("line", &self.lines)?;
        map.serialize_entry("column", &self.columns)?;
        map.serialize_entry("address", &self.addresses)?;
        map.serialize_entry("nativeSymbol", &self.native_symbols)?;
        map.serialize_entry("inlineDepth", &self.inline_depths)?;
        map.serialize_entry("innerWindowID", &self.inner_window_ids)?;
        map.end()
    }
}
