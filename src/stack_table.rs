use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::category::{CategoryIndex, SubcategoryIndex};
use crate::fast_hash_map::FastHashMap;
use crate::frame_table::FrameIndex;

/// An index into a thread's [`StackTable`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct StackIndex(pub(crate) u32);

impl StackIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// The stacks of one thread, as a prefix tree: one row per distinct
/// (prefix stack, frame) pair.
///
/// Invariant: a row's prefix always precedes the row itself, so a single
/// forward pass over the table visits parents before children.
///
/// The category of a row is inherited from its frame if the frame has one,
/// otherwise from its prefix row; rows with neither get the profile's
/// default category.
#[derive(Debug, Clone, Default)]
pub struct StackTable {
    prefixes: Vec<Option<StackIndex>>,
    frames: Vec<FrameIndex>,
    categories: Vec<CategoryIndex>,
    subcategories: Vec<SubcategoryIndex>,

    // (prefix, frame) -> stack index
    index: FastHashMap<(Option<StackIndex>, FrameIndex), StackIndex>,
}

impl StackTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn index_for_stack(
        &mut self,
        prefix: Option<StackIndex>,
        frame: FrameIndex,
        category: CategoryIndex,
        subcategory: SubcategoryIndex,
    ) -> StackIndex {
        match self.index.get(&(prefix, frame)) {
            Some(stack) => *stack,
            None => {
                let stack = StackIndex(self.frames.len() as u32);
                self.prefixes.push(prefix);
                self.frames.push(frame);
                self.categories.push(category);
                self.subcategories.push(subcategory);
                self.index.insert((prefix, frame), stack);
                stack
            }
        }
    }

    pub fn prefix(&self, index: StackIndex) -> Option<StackIndex> {
        self.prefixes[index.usize()]
    }

    pub fn frame(&self, index: StackIndex) -> FrameIndex {
        self.frames[index.usize()]
    }

    pub fn category(&self, index: StackIndex) -> CategoryIndex {
        self.categories[index.usize()]
    }

    pub fn subcategory(&self, index: StackIndex) -> SubcategoryIndex {
        self.subcategories[index.usize()]
    }

    /// The depth of the row in the prefix tree; root rows have depth 0.
    pub fn depth(&self, index: StackIndex) -> usize {
        let mut depth = 0;
        let mut current = self.prefixes[index.usize()];
        while let Some(prefix) = current {
            depth += 1;
            current = self.prefixes[prefix.usize()];
        }
        depth
    }

    /// The chain of stack rows from the root to (and including) `index`.
    pub fn chain_to_root(&self, index: StackIndex) -> Vec<StackIndex> {
        let mut chain = Vec::new();
        let mut current = Some(index);
        while let Some(stack) = current {
            chain.push(stack);
            current = self.prefixes[stack.usize()];
        }
        chain.reverse();
        chain
    }

    /// Rewrite the category column, used when threads move into a profile
    /// with a different category list.
    pub(crate) fn remap_categories(&mut self, map: impl Fn(CategoryIndex) -> CategoryIndex) {
        for category in &mut self.categories {
            *category = map(*category);
        }
    }

    /// Resolve the category of a new row per the inheritance rule.
    pub fn inherited_category(
        &self,
        prefix: Option<StackIndex>,
        frame_category: Option<CategoryIndex>,
        frame_subcategory: Option<SubcategoryIndex>,
        default_category: CategoryIndex,
    ) -> (CategoryIndex, SubcategoryIndex) {
        if let Some(category) = frame_category {
            let subcategory = frame_subcategory.unwrap_or(SubcategoryIndex::OTHER);
            return (category, subcategory);
        }
        match prefix {
            Some(prefix) => (
                self.categories[prefix.usize()],
                self.subcategories[prefix.usize()],
            ),
            None => (default_category, SubcategoryIndex::OTHER),
        }
    }
}

impl Serialize for StackIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for StackTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.frames.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("prefix", &self.prefixes)?;
        map.serialize_entry("frame", &self.frames)?;
        map.serialize_entry("category", &self.categories)?;
        map.serialize_entry("subcategory", &self.subcategories)?;
        map.end()
    }
}
