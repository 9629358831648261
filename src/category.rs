use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::category_color::CategoryColor;

/// An index into the profile's [`CategoryList`].
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct CategoryIndex(pub(crate) u32);

impl CategoryIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// An index into a category's subcategory list. Meaningful only together
/// with its category.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct SubcategoryIndex(pub(crate) u32);

impl SubcategoryIndex {
    /// The "Other" subcategory. All categories have this as their first
    /// subcategory.
    pub const OTHER: Self = SubcategoryIndex(0);

    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

/// The information about one category from `meta.categories`.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub color: CategoryColor,
    pub subcategories: Vec<String>,
}

/// The ordered list of categories of a profile.
#[derive(Debug, Clone, Default)]
pub struct CategoryList {
    categories: Vec<Category>,
}

impl CategoryList {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, index: CategoryIndex) -> Option<&Category> {
        self.categories.get(index.usize())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CategoryIndex, &Category)> {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| (CategoryIndex(i as u32), c))
    }

    /// The index of the category with the given name, if any. Categories are
    /// identified by name when profiles are merged.
    pub fn index_for_name(&self, name: &str) -> Option<CategoryIndex> {
        self.categories
            .iter()
            .position(|c| c.name == name)
            .map(|i| CategoryIndex(i as u32))
    }

    pub fn find_or_add(&mut self, category: &Category) -> CategoryIndex {
        if let Some(index) = self.index_for_name(&category.name) {
            return index;
        }
        let index = CategoryIndex(self.categories.len() as u32);
        self.categories.push(category.clone());
        index
    }

    /// The index of the "Other" category, used wherever a stack chain has no
    /// category of its own. Falls back to the last category if none is named
    /// "Other", and to index 0 for an empty list.
    pub fn default_category(&self) -> CategoryIndex {
        self.index_for_name("Other")
            .unwrap_or(CategoryIndex(self.categories.len().saturating_sub(1) as u32))
    }
}

impl Serialize for CategoryIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for SubcategoryIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("color", &self.color)?;
        map.serialize_entry("subcategories", &self.subcategories)?;
        map.end()
    }
}

impl Serialize for CategoryList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.categories.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde_derive::Deserialize)]
        struct RawCategory {
            name: String,
            #[serde(default)]
            color: CategoryColor,
            #[serde(default)]
            subcategories: Vec<String>,
        }
        let raw = RawCategory::deserialize(deserializer)?;
        let mut subcategories = raw.subcategories;
        if subcategories.is_empty() {
            subcategories.push("Other".to_string());
        }
        Ok(Category {
            name: raw.name,
            color: raw.color,
            subcategories,
        })
    }
}

impl<'de> Deserialize<'de> for CategoryList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(CategoryList {
            categories: Vec::<Category>::deserialize(deserializer)?,
        })
    }
}
