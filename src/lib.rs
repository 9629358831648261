//! This crate reads profiles in the [Firefox Profiler](https://profiler.firefox.com/)'s
//! ["Processed profile format"](https://github.com/firefox-devtools/profiler/blob/main/docs-developer/processed-profile-format.md)
//! and derives the structures the profiler UI is built on: call trees
//! (regular and inverted), paired markers, per-line and per-address timings,
//! and structurally merged comparison profiles.
//!
//! Use [`Profile::from_str`] / [`Profile::from_reader`] to load a profile.
//! Each [`Thread`] is an immutable snapshot of columnar tables; range and
//! search filters and the call tree [`Transform`]s all produce new
//! snapshots, and derived structures are rebuilt from whichever snapshot
//! you hand them.
//!
//! ## Example
//!
//! ```
//! use fxprof_analysis::{CallTree, Profile, Transform, apply_transform};
//!
//! # fn analyze(json: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let profile = Profile::from_str(json)?;
//! let thread = profile.thread(0)?;
//!
//! // Build the call tree and print the heaviest root.
//! let tree = CallTree::build(thread, profile.default_category(), false);
//! if let Some(&root) = tree.roots().first() {
//!     println!(
//!         "{}: total {}, self {}",
//!         thread.func_name(tree.func(root)),
//!         tree.total(root),
//!         tree.self_time(root),
//!     );
//! }
//!
//! // Merge a function out of every call path and rebuild.
//! if let Some(&root) = tree.roots().first() {
//!     let merged = apply_transform(thread, &Transform::MergeFunction { func: tree.func(root) });
//!     let _tree = CallTree::build(&merged, profile.default_category(), false);
//! }
//! # Ok(())
//! # }
//! ```

pub use debugid;

mod address_timings;
mod call_tree;
mod category;
mod category_color;
mod error;
mod fast_hash_map;
mod filters;
mod frame_table;
mod func_table;
mod lib_table;
mod line_timings;
mod marker_table;
mod markers;
mod memo;
mod merge;
mod native_symbols;
mod profile;
mod profile_json;
mod query;
mod resource_table;
mod sample_table;
mod stack_table;
mod string_table;
#[cfg(test)]
mod test_fixtures;
mod thread;
mod timestamp;
mod transforms;

pub use address_timings::{
    get_address_timings, get_stack_address_info, AddressTimings, StackAddressInfo,
};
pub use call_tree::{compute_function_timings, CallNodeIndex, CallTree, FunctionTiming};
pub use category::{Category, CategoryIndex, CategoryList, SubcategoryIndex};
pub use category_color::CategoryColor;
pub use error::Error;
pub use filters::{filter_thread_to_range, filter_thread_to_search_string};
pub use frame_table::{FrameIndex, FrameTable};
pub use func_table::{FuncFlags, FuncIndex, FuncTable};
pub use lib_table::{Lib, LibIndex, LibTable};
pub use line_timings::{get_line_timings, get_stack_line_info, LineTimings, StackLineInfo};
pub use marker_table::{MarkerTable, MarkerTiming};
pub use markers::{
    filter_markers_to_range, filter_markers_to_search_string, find_ipc_counterpart_thread,
    BailoutPayload, CauseBacktrace, CompositorScreenshotPayload, FileIoPayload,
    InvalidationPayload, IpcDirection, IpcPayload, LogPayload, Marker, MarkerPayload,
    MarkerProcessor, NetworkPayload, TracingPayload, UserTimingPayload,
};
pub use memo::Memoized;
pub use merge::{merge_profiles, merge_threads_structurally, ThreadTranslationMaps, TranslationMap};
pub use native_symbols::{NativeSymbolIndex, NativeSymbolTable};
pub use profile::{Page, Profile, ProfileMeta, SampleUnits};
pub use query::{FunctionSummary, ProfileQuerier, QueryResponse};
pub use resource_table::{ResourceIndex, ResourceKind, ResourceTable};
pub use sample_table::{NativeAllocationsTable, SampleTable, WeightType};
pub use stack_table::{StackIndex, StackTable};
pub use string_table::{StringIndex, StringTable};
pub use thread::Thread;
pub use timestamp::Timestamp;
pub use transforms::{apply_transform, apply_transform_stack, Transform};
