//! The call tree transform pipeline.
//!
//! Each transform is a pure function from one thread snapshot to the next;
//! the displayed thread is the fold of the transform stack over the base
//! thread. Transforms rewrite the stack table with a forward pass over its
//! rows (valid because of the prefix ordering invariant) and then remap the
//! sample and allocation columns through an old-to-new row map.

use crate::category::CategoryIndex;
use crate::func_table::{FuncFlags, FuncIndex};
use crate::resource_table::ResourceIndex;
use crate::stack_table::{StackIndex, StackTable};
use crate::thread::Thread;

/// A user-applied call tree transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Remove one specific call node from every matching path, reattaching
    /// its children to its caller.
    MergeCallNode { path: Vec<FuncIndex> },
    /// Remove every occurrence of a function from every path, reattaching
    /// children to the caller.
    MergeFunction { func: FuncIndex },
    /// Re-root the tree at the call node with the given root-based path.
    /// Samples not passing through the path lose their stack. When the path
    /// was taken from an inverted tree it is leaf-based and matched from
    /// each sample's leaf upwards.
    FocusSubtree { path: Vec<FuncIndex>, inverted: bool },
    /// Re-root the tree at the outermost occurrence of a function.
    FocusFunction { func: FuncIndex },
    /// Keep only samples whose leaf frame has the given category. Shrinks
    /// the sample set.
    FocusCategory { category: CategoryIndex },
    /// Coalesce runs of frames belonging to the resource into one synthetic
    /// node per call path.
    CollapseResource { resource: ResourceIndex },
    /// Drop repeated occurrences of a function on a path, consecutive or
    /// not, keeping the outermost.
    CollapseRecursion { func: FuncIndex },
    /// Drop only immediately repeated occurrences of a function.
    CollapseDirectRecursion { func: FuncIndex },
    /// Discard everything below a function, attributing the subtree's time
    /// to it as self time.
    CollapseFunctionSubtree { func: FuncIndex },
    /// Remove every sample whose stack contains the function. Shrinks the
    /// sample set.
    DropFunction { func: FuncIndex },
}

impl Transform {
    /// The short code used when transforms are recorded in URLs and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Transform::MergeCallNode { .. } => "mcn",
            Transform::MergeFunction { .. } => "mf",
            Transform::FocusSubtree { .. } => "fs",
            Transform::FocusFunction { .. } => "ff",
            Transform::FocusCategory { .. } => "fc",
            Transform::CollapseResource { .. } => "cr",
            Transform::CollapseRecursion { .. } => "rec",
            Transform::CollapseDirectRecursion { .. } => "drec",
            Transform::CollapseFunctionSubtree { .. } => "cfs",
            Transform::DropFunction { .. } => "df",
        }
    }
}

/// Apply one transform, producing a new thread snapshot.
pub fn apply_transform(thread: &Thread, transform: &Transform) -> Thread {
    match transform {
        Transform::MergeCallNode { path } => merge_call_node(thread, path),
        Transform::MergeFunction { func } => merge_function(thread, *func),
        Transform::FocusSubtree { path, inverted } => {
            if *inverted {
                focus_inverted_subtree(thread, path)
            } else {
                focus_subtree(thread, path)
            }
        }
        Transform::FocusFunction { func } => focus_function(thread, *func),
        Transform::FocusCategory { category } => focus_category(thread, *category),
        Transform::CollapseResource { resource } => collapse_resource(thread, *resource),
        Transform::CollapseRecursion { func } => collapse_recursion(thread, *func, false),
        Transform::CollapseDirectRecursion { func } => collapse_recursion(thread, *func, true),
        Transform::CollapseFunctionSubtree { func } => collapse_function_subtree(thread, *func),
        Transform::DropFunction { func } => drop_function(thread, *func),
    }
}

/// Fold a transform stack over a base thread, left to right.
pub fn apply_transform_stack(thread: &Thread, transforms: &[Transform]) -> Thread {
    let mut current = thread.clone();
    for transform in transforms {
        current = apply_transform(&current, transform);
    }
    current
}

/// Accumulates a rewritten stack table plus the old-to-new row map.
struct StackRewrite {
    table: StackTable,
    map: Vec<Option<StackIndex>>,
}

impl StackRewrite {
    fn with_capacity(len: usize) -> Self {
        Self {
            table: StackTable::new(),
            map: Vec::with_capacity(len),
        }
    }

    /// Carry the row over under the (possibly shifted) new prefix.
    fn keep(&mut self, thread: &Thread, row: StackIndex, new_prefix: Option<StackIndex>) {
        let stack_table = thread.stack_table();
        let new = self.table.index_for_stack(
            new_prefix,
            stack_table.frame(row),
            stack_table.category(row),
            stack_table.subcategory(row),
        );
        self.map.push(Some(new));
    }

    fn mapped(&self, old: Option<StackIndex>) -> Option<StackIndex> {
        old.and_then(|s| self.map[s.usize()])
    }

    /// Install the rewritten table and remap samples and allocations.
    fn finish(self, thread: &Thread) -> Thread {
        let StackRewrite { table, map } = self;
        let mut new_thread = thread.clone();
        new_thread.stack_table = table;
        for i in 0..new_thread.samples.len() {
            let stack = new_thread.samples.stack(i);
            new_thread
                .samples
                .set_stack(i, stack.and_then(|s| map[s.usize()]));
        }
        if let Some(allocations) = &mut new_thread.native_allocations {
            allocations.map_stacks(|stack| stack.and_then(|s| map[s.usize()]));
        }
        new_thread
    }
}

fn merge_function(thread: &Thread, target: FuncIndex) -> Thread {
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let new_prefix = rewrite.mapped(stack_table.prefix(row));
        if thread.func_for_stack(row) == target {
            rewrite.map.push(new_prefix);
        } else {
            rewrite.keep(thread, row, new_prefix);
        }
    }
    rewrite.finish(thread)
}

fn merge_call_node(thread: &Thread, path: &[FuncIndex]) -> Thread {
    if path.is_empty() {
        return thread.clone();
    }
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    // path_match[i] = Some(k) when the row's func chain is exactly
    // path[..k]; rows that reach the full path length are the merge target.
    let mut path_match: Vec<Option<usize>> = Vec::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let func = thread.func_for_stack(row);
        let matched = match prefix {
            None => Some(0),
            Some(p) => path_match[p.usize()],
        };
        let matched = match matched {
            Some(k) if k < path.len() && path[k] == func => Some(k + 1),
            _ => None,
        };
        path_match.push(matched);

        let new_prefix = rewrite.mapped(prefix);
        if matched == Some(path.len()) {
            rewrite.map.push(new_prefix);
        } else {
            rewrite.keep(thread, row, new_prefix);
        }
    }
    rewrite.finish(thread)
}

fn focus_subtree(thread: &Thread, path: &[FuncIndex]) -> Thread {
    if path.is_empty() {
        return thread.clone();
    }
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    let mut path_match: Vec<Option<usize>> = Vec::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let func = thread.func_for_stack(row);
        let matched = match prefix {
            None => Some(0),
            Some(p) => path_match[p.usize()],
        };
        let matched = match matched {
            Some(k) if k < path.len() && path[k] == func => Some(k + 1),
            _ => None,
        };
        path_match.push(matched);

        match matched {
            // The focused node becomes the new root; its ancestors on the
            // path are discarded.
            Some(k) if k == path.len() => rewrite.keep(thread, row, None),
            // Partially down the path, or off it entirely without a
            // surviving ancestor: the row does not exist in the new tree.
            Some(_) => rewrite.map.push(None),
            None => {
                let new_prefix = rewrite.mapped(prefix);
                if new_prefix.is_some() {
                    rewrite.keep(thread, row, new_prefix);
                } else {
                    rewrite.map.push(None);
                }
            }
        }
    }
    rewrite.finish(thread)
}

/// Focus on an inverted-tree node: the path is leaf-based, so it is matched
/// against each sample walking from the leaf towards the root, and the
/// sample's stack is truncated at the deepest matched caller. The stack
/// table itself is unchanged.
fn focus_inverted_subtree(thread: &Thread, path: &[FuncIndex]) -> Thread {
    if path.is_empty() {
        return thread.clone();
    }
    let stack_table = thread.stack_table();
    let mut new_thread = thread.clone();
    let match_sample = |leaf: Option<StackIndex>| -> Option<StackIndex> {
        let mut current = leaf?;
        for (k, func) in path.iter().enumerate() {
            if thread.func_for_stack(current) != *func {
                return None;
            }
            if k + 1 == path.len() {
                return Some(current);
            }
            current = stack_table.prefix(current)?;
        }
        None
    };
    for i in 0..new_thread.samples.len() {
        let stack = new_thread.samples.stack(i);
        new_thread.samples.set_stack(i, match_sample(stack));
    }
    if let Some(allocations) = &mut new_thread.native_allocations {
        allocations.map_stacks(match_sample);
    }
    new_thread
}

fn focus_function(thread: &Thread, target: FuncIndex) -> Thread {
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let new_prefix = rewrite.mapped(stack_table.prefix(row));
        if new_prefix.is_some() {
            rewrite.keep(thread, row, new_prefix);
        } else if thread.func_for_stack(row) == target {
            // Outermost occurrence: becomes a root.
            rewrite.keep(thread, row, None);
        } else {
            rewrite.map.push(None);
        }
    }
    rewrite.finish(thread)
}

fn focus_category(thread: &Thread, category: CategoryIndex) -> Thread {
    let mut new_thread = thread.clone();
    let samples = &thread.samples;
    new_thread.samples = samples.retained_rows(|i| match samples.stack(i) {
        Some(stack) => thread.stack_table.category(stack) == category,
        None => false,
    });
    new_thread
}

fn collapse_resource(thread: &Thread, target: ResourceIndex) -> Thread {
    let mut new_thread = thread.clone();

    // One synthetic func stands in for the whole resource; its name is the
    // resource's name.
    let resource_name = thread.resource_table.name(target);
    let collapsed_func = new_thread.func_table.index_for_func(
        resource_name,
        FuncFlags::empty(),
        Some(target),
        None,
        None,
        None,
    );

    let in_resource =
        |func: FuncIndex| -> bool { thread.func_table.resource(func) == Some(target) };

    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let new_prefix = rewrite.mapped(prefix);
        if in_resource(thread.func_for_stack(row)) {
            // A run of resource frames collapses into a single node.
            if prefix.is_some_and(|p| in_resource(thread.func_for_stack(p))) {
                rewrite.map.push(new_prefix);
            } else {
                let frame = new_thread.frame_table.index_for_frame(
                    collapsed_func,
                    Some(stack_table.category(row)),
                    Some(stack_table.subcategory(row)),
                    None,
                    None,
                    None,
                    None,
                    None,
                    0,
                    None,
                );
                let new = rewrite.table.index_for_stack(
                    new_prefix,
                    frame,
                    stack_table.category(row),
                    stack_table.subcategory(row),
                );
                rewrite.map.push(Some(new));
            }
        } else {
            rewrite.keep(thread, row, new_prefix);
        }
    }

    new_thread.stack_table = rewrite.table;
    for i in 0..new_thread.samples.len() {
        let stack = new_thread.samples.stack(i);
        new_thread
            .samples
            .set_stack(i, stack.and_then(|s| rewrite.map[s.usize()]));
    }
    if let Some(allocations) = &mut new_thread.native_allocations {
        allocations.map_stacks(|stack| stack.and_then(|s| rewrite.map[s.usize()]));
    }
    new_thread
}

fn collapse_recursion(thread: &Thread, target: FuncIndex, direct_only: bool) -> Thread {
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    // seen[i]: the target func occurs somewhere on the chain ending at i.
    let mut seen: Vec<bool> = Vec::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let func = thread.func_for_stack(row);
        let seen_above = prefix.is_some_and(|p| seen[p.usize()]);
        seen.push(seen_above || func == target);

        let is_repeat = func == target
            && if direct_only {
                prefix.is_some_and(|p| thread.func_for_stack(p) == target)
            } else {
                seen_above
            };
        let new_prefix = rewrite.mapped(prefix);
        if is_repeat {
            rewrite.map.push(new_prefix);
        } else {
            rewrite.keep(thread, row, new_prefix);
        }
    }
    rewrite.finish(thread)
}

fn collapse_function_subtree(thread: &Thread, target: FuncIndex) -> Thread {
    let stack_table = thread.stack_table();
    let mut rewrite = StackRewrite::with_capacity(stack_table.len());
    // collapsed[i]: the row is at or below an occurrence of the target.
    let mut collapsed: Vec<bool> = Vec::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let below = prefix.is_some_and(|p| collapsed[p.usize()]);
        collapsed.push(below || thread.func_for_stack(row) == target);

        let new_prefix = rewrite.mapped(prefix);
        if below {
            // Descendant frames vanish; their samples re-point at the
            // target row, turning subtree time into its self time.
            rewrite.map.push(new_prefix);
        } else {
            rewrite.keep(thread, row, new_prefix);
        }
    }
    rewrite.finish(thread)
}

fn drop_function(thread: &Thread, target: FuncIndex) -> Thread {
    let stack_table = thread.stack_table();
    let mut contains: Vec<bool> = Vec::with_capacity(stack_table.len());
    for i in 0..stack_table.len() {
        let row = StackIndex(i as u32);
        let above = stack_table
            .prefix(row)
            .is_some_and(|p| contains[p.usize()]);
        contains.push(above || thread.func_for_stack(row) == target);
    }
    let mut new_thread = thread.clone();
    let samples = &thread.samples;
    new_thread.samples = samples.retained_rows(|i| match samples.stack(i) {
        Some(stack) => !contains[stack.usize()],
        None => true,
    });
    if let Some(allocations) = &mut new_thread.native_allocations {
        allocations.map_stacks(|stack| stack.filter(|s| !contains[s.usize()]));
    }
    new_thread
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_tree::CallTree;
    use crate::test_fixtures::{thread_from_paths, thread_from_paths_with_categories};

    fn func_named(thread: &Thread, name: &str) -> FuncIndex {
        (0..thread.func_table().len())
            .map(|i| FuncIndex(i as u32))
            .find(|f| thread.func_name(*f) == name)
            .unwrap()
    }

    fn tree_paths(thread: &Thread) -> Vec<Vec<String>> {
        (0..thread.samples().len())
            .filter_map(|i| thread.samples().stack(i))
            .map(|s| {
                thread
                    .func_path(s)
                    .into_iter()
                    .map(|f| thread.func_name(f).to_string())
                    .collect()
            })
            .collect()
    }

    fn self_sum(thread: &Thread) -> f64 {
        CallTree::build(thread, CategoryIndex(0), false).self_time_sum()
    }

    #[test]
    fn merge_function_removes_every_occurrence() {
        let thread = thread_from_paths(&[&["A", "B", "C", "D"]]);
        let b = func_named(&thread, "B");
        let merged = apply_transform(&thread, &Transform::MergeFunction { func: b });
        assert_eq!(tree_paths(&merged), vec![vec!["A", "C", "D"]]);
        assert_eq!(self_sum(&merged), self_sum(&thread));
    }

    #[test]
    fn merge_call_node_is_path_scoped() {
        // B appears under A and under X; only the A/B node is merged.
        let thread = thread_from_paths(&[&["A", "B", "C"], &["X", "B", "C"]]);
        let a = func_named(&thread, "A");
        let b = func_named(&thread, "B");
        let merged = apply_transform(
            &thread,
            &Transform::MergeCallNode { path: vec![a, b] },
        );
        assert_eq!(
            tree_paths(&merged),
            vec![vec!["A", "C"], vec!["X", "B", "C"]]
        );
        assert_eq!(self_sum(&merged), self_sum(&thread));
    }

    #[test]
    fn merge_call_node_with_stale_path_is_a_noop() {
        let thread = thread_from_paths(&[&["A", "B"]]);
        let b = func_named(&thread, "B");
        let merged = apply_transform(
            &thread,
            &Transform::MergeCallNode { path: vec![b, b] },
        );
        assert_eq!(tree_paths(&merged), tree_paths(&thread));
    }

    #[test]
    fn focus_subtree_reroots_at_the_path() {
        let thread = thread_from_paths(&[&["A", "B", "C"], &["A", "X"], &["D", "B"]]);
        let a = func_named(&thread, "A");
        let b = func_named(&thread, "B");
        let focused = apply_transform(
            &thread,
            &Transform::FocusSubtree {
                path: vec![a, b],
                inverted: false,
            },
        );
        // Sample count is stable; only the first sample keeps a stack, now
        // rooted at B.
        assert_eq!(focused.samples().len(), 3);
        assert_eq!(tree_paths(&focused), vec![vec!["B", "C"]]);
    }

    #[test]
    fn focus_inverted_subtree_truncates_at_matched_caller() {
        // Inverted path [C, B]: samples ending in ... -> B -> C survive,
        // truncated at B.
        let thread = thread_from_paths(&[&["A", "B", "C"], &["X", "B", "C"], &["A", "C"]]);
        let b = func_named(&thread, "B");
        let c = func_named(&thread, "C");
        let focused = apply_transform(
            &thread,
            &Transform::FocusSubtree {
                path: vec![c, b],
                inverted: true,
            },
        );
        assert_eq!(
            tree_paths(&focused),
            vec![vec!["A", "B"], vec!["X", "B"]]
        );
    }

    #[test]
    fn focus_function_reroots_at_outermost_occurrence() {
        let thread = thread_from_paths(&[&["A", "B", "C"], &["X", "B"], &["D"]]);
        let b = func_named(&thread, "B");
        let focused = apply_transform(&thread, &Transform::FocusFunction { func: b });
        assert_eq!(focused.samples().len(), 3);
        assert_eq!(tree_paths(&focused), vec![vec!["B", "C"], vec!["B"]]);
    }

    #[test]
    fn focus_category_drops_sample_rows() {
        let thread = thread_from_paths_with_categories(
            &[&["A", "B"], &["A", "C"]],
            |name| if name == "B" { Some(1) } else { None },
        );
        let focused = apply_transform(
            &thread,
            &Transform::FocusCategory {
                category: CategoryIndex(1),
            },
        );
        assert_eq!(focused.samples().len(), 1);
        assert_eq!(tree_paths(&focused), vec![vec!["A", "B"]]);
    }

    #[test]
    fn collapse_recursion_keeps_outermost_occurrence() {
        let thread = thread_from_paths(&[&["A", "B", "A", "C"]]);
        let a = func_named(&thread, "A");
        let collapsed = apply_transform(&thread, &Transform::CollapseRecursion { func: a });
        assert_eq!(tree_paths(&collapsed), vec![vec!["A", "B", "C"]]);
        assert_eq!(self_sum(&collapsed), self_sum(&thread));

        // Direct-recursion collapse leaves the indirect repeat alone.
        let direct =
            apply_transform(&thread, &Transform::CollapseDirectRecursion { func: a });
        assert_eq!(tree_paths(&direct), vec![vec!["A", "B", "A", "C"]]);

        let thread2 = thread_from_paths(&[&["A", "A", "A", "B"]]);
        let a2 = func_named(&thread2, "A");
        let direct2 =
            apply_transform(&thread2, &Transform::CollapseDirectRecursion { func: a2 });
        assert_eq!(tree_paths(&direct2), vec![vec!["A", "B"]]);
    }

    #[test]
    fn collapse_function_subtree_absorbs_descendants() {
        let thread = thread_from_paths(&[&["A", "B", "C"], &["A", "B", "D"], &["A", "E"]]);
        let b = func_named(&thread, "B");
        let collapsed =
            apply_transform(&thread, &Transform::CollapseFunctionSubtree { func: b });
        assert_eq!(
            tree_paths(&collapsed),
            vec![vec!["A", "B"], vec!["A", "B"], vec!["A", "E"]]
        );
        // Subtree time became B's self time.
        let tree = CallTree::build(&collapsed, CategoryIndex(0), false);
        let path = vec![func_named(&collapsed, "A"), b];
        let node = tree.node_for_path(&path).unwrap();
        assert_eq!(tree.self_time(node), 2.0);
        assert_eq!(self_sum(&collapsed), self_sum(&thread));
    }

    #[test]
    fn collapse_resource_coalesces_library_frames() {
        use crate::category::SubcategoryIndex;
        use crate::resource_table::ResourceKind;
        use crate::timestamp::Timestamp;

        // Build A -> f1 -> f2 -> B by hand, with f1 and f2 in libfoo.
        let mut thread = Thread::default();
        let lib_name = thread.string_table.index_for_string("libfoo");
        let resource = thread
            .resource_table
            .push(None, lib_name, None, ResourceKind::Library);
        let mut prefix = None;
        for (name, in_lib) in [("A", false), ("f1", true), ("f2", true), ("B", false)] {
            let name = thread.string_table.index_for_string(name);
            let func = thread.func_table.index_for_func(
                name,
                FuncFlags::empty(),
                in_lib.then_some(resource),
                None,
                None,
                None,
            );
            let frame = thread
                .frame_table
                .index_for_frame(func, None, None, None, None, None, None, None, 0, None);
            prefix = Some(thread.stack_table.index_for_stack(
                prefix,
                frame,
                CategoryIndex(0),
                SubcategoryIndex::OTHER,
            ));
        }
        thread.samples.push(Timestamp::ZERO, prefix, 1.0);

        let collapsed =
            apply_transform(&thread, &Transform::CollapseResource { resource });
        assert_eq!(tree_paths(&collapsed), vec![vec!["A", "libfoo", "B"]]);
        assert_eq!(self_sum(&collapsed), self_sum(&thread));
    }

    #[test]
    fn drop_function_removes_matching_samples() {
        let thread = thread_from_paths(&[&["A", "B"], &["A", "C"], &["B"]]);
        let b = func_named(&thread, "B");
        let dropped = apply_transform(&thread, &Transform::DropFunction { func: b });
        assert_eq!(dropped.samples().len(), 1);
        assert_eq!(tree_paths(&dropped), vec![vec!["A", "C"]]);
    }

    #[test]
    fn transforms_remap_native_allocation_stacks() {
        use crate::sample_table::NativeAllocationsTable;
        use crate::timestamp::Timestamp;

        let mut thread = thread_from_paths(&[&["A", "B", "C"]]);
        let sample_stack = thread.samples().stack(0);
        let mut allocations = NativeAllocationsTable::new_unbalanced();
        allocations.push(
            Timestamp::from_millis_since_reference(1.0),
            sample_stack,
            64,
            None,
            None,
        );
        allocations.push(
            Timestamp::from_millis_since_reference(2.0),
            None,
            32,
            None,
            None,
        );
        thread.native_allocations = Some(allocations);

        let b = func_named(&thread, "B");
        let merged = apply_transform(&thread, &Transform::MergeFunction { func: b });

        let allocations = merged.native_allocations().unwrap();
        assert_eq!(allocations.stack(0), merged.samples().stack(0));
        let path: Vec<&str> = merged
            .func_path(allocations.stack(0).unwrap())
            .into_iter()
            .map(|f| merged.func_name(f))
            .collect();
        assert_eq!(path, vec!["A", "C"]);
        assert_eq!(allocations.stack(1), None);
    }

    #[test]
    fn transform_stack_composes() {
        let thread = thread_from_paths(&[&["A", "B", "C"], &["A", "B"]]);
        let a = func_named(&thread, "A");
        let b = func_named(&thread, "B");
        let result = apply_transform_stack(
            &thread,
            &[
                Transform::MergeFunction { func: a },
                Transform::CollapseFunctionSubtree { func: b },
            ],
        );
        assert_eq!(tree_paths(&result), vec![vec!["B"], vec!["B"]]);
    }
}
