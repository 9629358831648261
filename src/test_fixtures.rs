//! Hand-built threads for unit tests.

use crate::category::{CategoryIndex, SubcategoryIndex};
use crate::func_table::FuncFlags;
use crate::thread::Thread;
use crate::timestamp::Timestamp;

/// Build a thread from sample paths. Each path is a root-to-leaf chain of
/// func names; each entry becomes one sample with weight 1.0, at 1ms
/// intervals starting from zero.
pub(crate) fn thread_from_paths(paths: &[&[&str]]) -> Thread {
    thread_from_paths_with_categories(paths, |_| None)
}

/// Like [`thread_from_paths`], but `category_for` can assign a frame
/// category per func name. Funcs without one inherit from their prefix
/// stack, falling back to category 0.
pub(crate) fn thread_from_paths_with_categories(
    paths: &[&[&str]],
    category_for: impl Fn(&str) -> Option<u32>,
) -> Thread {
    let mut thread = Thread {
        name: "GeckoMain".to_string(),
        pid: "1".to_string(),
        tid: "1".to_string(),
        is_main_thread: true,
        ..Thread::default()
    };
    let default_category = CategoryIndex(0);
    for (i, path) in paths.iter().enumerate() {
        let mut prefix = None;
        for name in *path {
            let name_index = thread.string_table.index_for_string(name);
            let func = thread.func_table.index_for_func(
                name_index,
                FuncFlags::empty(),
                None,
                None,
                None,
                None,
            );
            let frame_category = category_for(name).map(CategoryIndex);
            let frame = thread.frame_table.index_for_frame(
                func,
                frame_category,
                None,
                None,
                None,
                None,
                None,
                None,
                0,
                None,
            );
            let (category, subcategory) = thread.stack_table.inherited_category(
                prefix,
                frame_category,
                frame_category.map(|_| SubcategoryIndex::OTHER),
                default_category,
            );
            prefix = Some(
                thread
                    .stack_table
                    .index_for_stack(prefix, frame, category, subcategory),
            );
        }
        thread
            .samples
            .push(Timestamp::from_millis_since_reference(i as f64), prefix, 1.0);
    }
    thread
}
