//! Structural merging of profiles for comparison.
//!
//! Merging aligns the table structure of several profiles: categories,
//! libs, resources, funcs and frames are consolidated by identity key, and
//! every foreign key in the dependent tables is rewritten through a
//! translation map (resources depend on libs, funcs on resources, frames
//! on funcs). The merged profile carries the source threads plus one
//! "comparison" thread whose stack, sample and marker tables start empty;
//! actual comparison data is computed downstream against the aligned
//! tables.

use crate::category::{CategoryIndex, SubcategoryIndex};
use crate::error::Error;
use crate::fast_hash_map::FastHashMap;
use crate::frame_table::FrameIndex;
use crate::func_table::FuncIndex;
use crate::lib_table::LibIndex;
use crate::native_symbols::NativeSymbolIndex;
use crate::profile::{Profile, ProfileMeta};
use crate::resource_table::ResourceIndex;
use crate::string_table::StringIndex;
use crate::thread::Thread;

/// Old-row to merged-row translation for one source table.
#[derive(Debug, Clone)]
pub struct TranslationMap<I: Copy>(Vec<I>);

impl<I: Copy> Default for TranslationMap<I> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<I: Copy> TranslationMap<I> {
    fn push(&mut self, merged: I) {
        self.0.push(merged);
    }

    pub fn translate(&self, old: usize) -> I {
        self.0[old]
    }
}

/// The translation maps produced for one source thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadTranslationMaps {
    pub strings: TranslationMap<StringIndex>,
    pub libs: TranslationMap<LibIndex>,
    pub resources: TranslationMap<ResourceIndex>,
    pub funcs: TranslationMap<FuncIndex>,
    pub frames: TranslationMap<FrameIndex>,
    pub native_symbols: TranslationMap<NativeSymbolIndex>,
}

/// Merge profiles into one profile suitable for comparison.
///
/// The merged interval is the minimum across inputs, so the finest
/// sampling granularity wins. Categories are merged by name; the source
/// threads are carried over with their category columns rewritten to the
/// merged list.
pub fn merge_profiles(profiles: &[Profile]) -> Result<Profile, Error> {
    let first = profiles.first().ok_or(Error::NothingToMerge)?;

    let mut meta = ProfileMeta {
        interval: profiles
            .iter()
            .map(|p| p.meta.interval)
            .fold(f64::INFINITY, f64::min),
        start_time: profiles
            .iter()
            .map(|p| p.meta.start_time)
            .fold(f64::INFINITY, f64::min),
        product: first.meta.product.clone(),
        categories: first.meta.categories.clone(),
        sample_units: first.meta.sample_units.clone(),
    };

    let mut threads = Vec::new();
    let mut pages = Vec::new();
    for profile in profiles {
        // Category indices are profile-wide; rewrite them per thread.
        let category_map: Vec<CategoryIndex> = profile
            .meta
            .categories
            .iter()
            .map(|(_, category)| meta.categories.find_or_add(category))
            .collect();
        for thread in profile.threads() {
            let mut thread = thread.clone();
            let map = |c: CategoryIndex| category_map[c.usize()];
            thread.stack_table.remap_categories(map);
            thread.frame_table.remap_categories(map);
            thread.markers.remap_categories(map);
            threads.push(thread);
        }
        pages.extend(profile.pages().iter().cloned());
    }

    let (comparison, _maps) = merge_threads_structurally(&threads);
    threads.push(comparison);

    Ok(Profile {
        meta,
        threads,
        pages,
    })
}

/// Build one thread whose lib, resource, func, frame and native symbol
/// tables consolidate the given threads' rows by identity key. Returns the
/// per-source-thread translation maps alongside it.
pub fn merge_threads_structurally(threads: &[Thread]) -> (Thread, Vec<ThreadTranslationMaps>) {
    let mut merged = Thread {
        name: "Comparison".to_string(),
        pid: "0".to_string(),
        tid: "0".to_string(),
        is_main_thread: true,
        ..Thread::default()
    };

    // NativeSymbolTable has no interning key of its own; dedupe here.
    let mut symbol_index: FastHashMap<(LibIndex, u64, StringIndex), NativeSymbolIndex> =
        FastHashMap::default();

    // Merging consolidates frames by (func, category, subcategory,
    // implementation), a coarser identity than the frame table's full
    // per-line interning key.
    type MergedFrameKey = (
        FuncIndex,
        Option<CategoryIndex>,
        Option<SubcategoryIndex>,
        Option<StringIndex>,
    );
    let mut frame_index: FastHashMap<MergedFrameKey, FrameIndex> = FastHashMap::default();

    let mut all_maps = Vec::with_capacity(threads.len());
    for thread in threads {
        let mut maps = ThreadTranslationMaps::default();

        for i in 0..thread.string_table().len() {
            let s = thread
                .string_table()
                .get(StringIndex(i as u32))
                .unwrap_or_default();
            maps.strings.push(merged.string_table.index_for_string(s));
        }

        for lib in thread.lib_table().iter() {
            maps.libs.push(merged.lib_table.index_for_lib(lib));
        }

        // Resources depend on libs.
        let resources = thread.resource_table();
        for i in 0..resources.len() {
            let old = ResourceIndex(i as u32);
            let lib = resources.lib(old).map(|l| maps.libs.translate(l.usize()));
            let name = maps.strings.translate(resources.name(old).usize());
            let host = resources
                .host(old)
                .map(|h| maps.strings.translate(h.usize()));
            maps.resources.push(merged.resource_table.index_for_resource(
                lib,
                name,
                host,
                resources.kind(old),
            ));
        }

        // Funcs depend on resources.
        let funcs = thread.func_table();
        for i in 0..funcs.len() {
            let old = FuncIndex(i as u32);
            let name = maps.strings.translate(funcs.name(old).usize());
            let resource = funcs
                .resource(old)
                .map(|r| maps.resources.translate(r.usize()));
            let file_name = funcs
                .file_name(old)
                .map(|f| maps.strings.translate(f.usize()));
            maps.funcs.push(merged.func_table.index_for_func(
                name,
                funcs.flags(old),
                resource,
                file_name,
                funcs.line_number(old),
                funcs.column_number(old),
            ));
        }

        let symbols = thread.native_symbol_table();
        for i in 0..symbols.len() {
            let old = NativeSymbolIndex(i as u32);
            let lib = maps.libs.translate(symbols.lib(old).usize());
            let name = maps.strings.translate(symbols.name(old).usize());
            let address = symbols.address(old);
            let merged_index = *symbol_index
                .entry((lib, address, name))
                .or_insert_with(|| {
                    merged
                        .native_symbol_table
                        .push(lib, address, symbols.function_size(old), name)
                });
            maps.native_symbols.push(merged_index);
        }

        // Frames depend on funcs.
        let frames = thread.frame_table();
        for i in 0..frames.len() {
            let old = FrameIndex(i as u32);
            let func = maps.funcs.translate(frames.func(old).usize());
            let implementation = frames
                .implementation(old)
                .map(|s| maps.strings.translate(s.usize()));
            let native_symbol = frames
                .native_symbol(old)
                .map(|s| maps.native_symbols.translate(s.usize()));
            let category = frames.category(old);
            let subcategory = frames.subcategory(old);
            let merged_index = *frame_index
                .entry((func, category, subcategory, implementation))
                .or_insert_with(|| {
                    merged.frame_table.push(
                        func,
                        category,
                        subcategory,
                        implementation,
                        frames.line(old),
                        frames.column(old),
                        frames.address(old),
                        native_symbol,
                        frames.inline_depth(old),
                        frames.inner_window_id(old),
                    )
                });
            maps.frames.push(merged_index);
        }

        all_maps.push(maps);
    }

    (merged, all_maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;
    use serde_json::json;

    fn profile_with_interval(interval: f64, func_name: &str) -> Profile {
        Profile::from_value(json!({
            "meta": {
                "interval": interval,
                "startTime": 0.0,
                "product": "Firefox",
                "categories": [
                    { "name": "Other", "color": "grey", "subcategories": ["Other"] },
                ],
            },
            "libs": [],
            "threads": [{
                "name": "GeckoMain",
                "pid": "1",
                "tid": "1",
                "stringArray": [func_name],
                "funcTable": {
                    "length": 1,
                    "name": [0],
                    "isJS": [false],
                    "relevantForJS": [false],
                    "resource": [-1],
                    "fileName": [null],
                    "lineNumber": [null],
                    "columnNumber": [null],
                },
                "frameTable": {
                    "length": 1,
                    "func": [0],
                    "category": [0],
                    "subcategory": [0],
                    "line": [null],
                    "column": [null],
                    "address": [-1],
                    "inlineDepth": [0],
                },
                "stackTable": { "length": 1, "prefix": [null], "frame": [0] },
                "samples": { "length": 1, "time": [1.0], "stack": [0] },
                "markers": { "length": 0, "name": [], "category": [], "phase": [], "startTime": [], "endTime": [], "data": [] },
                "resourceTable": { "length": 0, "lib": [], "name": [], "host": [], "type": [] },
                "nativeSymbols": { "length": 0, "libIndex": [], "address": [], "functionSize": [], "name": [] },
            }],
        }))
        .unwrap()
    }

    #[test]
    fn minimum_interval_wins() {
        let a = profile_with_interval(10.0, "work");
        let b = profile_with_interval(20.0, "work");
        let merged = merge_profiles(&[a, b]).unwrap();
        assert_eq!(merged.meta.interval, 10.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            merge_profiles(&[]),
            Err(Error::NothingToMerge)
        ));
    }

    #[test]
    fn comparison_thread_consolidates_funcs() {
        let a = profile_with_interval(10.0, "work");
        let b = profile_with_interval(20.0, "work");
        let merged = merge_profiles(&[a, b]).unwrap();

        // Two source threads plus the comparison thread.
        assert_eq!(merged.threads().len(), 3);
        let comparison = merged.threads().last().unwrap();
        assert_eq!(comparison.name(), "Comparison");
        // The shared func "work" merged into one row.
        assert_eq!(comparison.func_table().len(), 1);
        assert!(comparison.samples().is_empty());
        assert!(comparison.stack_table().is_empty());
        assert!(comparison.markers().is_empty());
    }

    #[test]
    fn distinct_funcs_stay_distinct() {
        let a = profile_with_interval(10.0, "alpha");
        let b = profile_with_interval(10.0, "beta");
        let merged = merge_profiles(&[a, b]).unwrap();
        let comparison = merged.threads().last().unwrap();
        assert_eq!(comparison.func_table().len(), 2);
    }
}
