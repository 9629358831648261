//! Range and search filtering.
//!
//! Filters produce new `Thread` snapshots; the tables of the input thread
//! are never mutated. Sample rows that fail a search filter keep their row
//! (so sample counts and timestamps stay stable) but lose their stack.

use crate::marker_table::{MarkerTable, MarkerTiming};
use crate::stack_table::StackIndex;
use crate::thread::Thread;
use crate::timestamp::Timestamp;

/// Narrow a thread to the samples, markers and allocations that fall inside
/// the half-open time range `[range_start, range_end)`.
///
/// Interval markers are kept if they overlap the range at all, matching the
/// marker chart behavior.
pub fn filter_thread_to_range(
    thread: &Thread,
    range_start: Timestamp,
    range_end: Timestamp,
) -> Thread {
    let mut filtered = thread.clone();
    filtered.samples = thread.samples.filtered_to_range(range_start, range_end);
    filtered.markers = filter_marker_table_to_range(&thread.markers, range_start, range_end);
    filtered.native_allocations = thread
        .native_allocations
        .as_ref()
        .map(|a| a.filtered_to_range(range_start, range_end));
    filtered
}

fn filter_marker_table_to_range(
    markers: &MarkerTable,
    range_start: Timestamp,
    range_end: Timestamp,
) -> MarkerTable {
    let mut filtered = MarkerTable::new();
    for i in 0..markers.len() {
        let keep = match *markers.timing(i) {
            MarkerTiming::Instant(t) => t >= range_start && t < range_end,
            MarkerTiming::Interval(s, e) => s < range_end && e >= range_start,
            // Unpaired halves may pair with a row outside the range; keep
            // them and let the marker processor clamp.
            MarkerTiming::IntervalStart(s) => s < range_end,
            MarkerTiming::IntervalEnd(e) => e >= range_start,
        };
        if keep {
            filtered.push(
                markers.name(i),
                markers.category(i),
                markers.timing(i).clone(),
                markers.data(i).cloned(),
            );
        }
    }
    filtered
}

/// Keep only samples whose stack contains a frame matching the search
/// string. Matching is a case-insensitive substring test against the func
/// name, the func's resource name and the func's file name. Non-matching
/// samples keep their row with a null stack.
pub fn filter_thread_to_search_string(thread: &Thread, search: &str) -> Thread {
    if search.is_empty() {
        return thread.clone();
    }
    let needle = search.to_lowercase();

    // A stack matches if its own frame matches or any ancestor does; the
    // prefix ordering invariant lets us resolve this in one forward pass.
    let stack_table = &thread.stack_table;
    let mut matched = vec![false; stack_table.len()];
    for i in 0..stack_table.len() {
        let stack = StackIndex(i as u32);
        let inherited = stack_table
            .prefix(stack)
            .map_or(false, |p| matched[p.usize()]);
        matched[i] = inherited || stack_row_matches(thread, stack, &needle);
    }

    let mut filtered = thread.clone();
    for i in 0..filtered.samples.len() {
        match filtered.samples.stack(i) {
            Some(stack) if matched[stack.usize()] => {}
            Some(_) => filtered.samples.set_stack(i, None),
            None => {}
        }
    }
    if let Some(allocations) = &mut filtered.native_allocations {
        allocations.map_stacks(|stack| stack.filter(|s| matched[s.usize()]));
    }
    filtered
}

fn stack_row_matches(thread: &Thread, stack: StackIndex, needle: &str) -> bool {
    let func = thread.func_for_stack(stack);
    let strings = &thread.string_table;
    let contains = |s: Option<&str>| s.is_some_and(|s| s.to_lowercase().contains(needle));
    if contains(strings.get(thread.func_table.name(func))) {
        return true;
    }
    if let Some(resource) = thread.func_table.resource(func) {
        if contains(strings.get(thread.resource_table.name(resource))) {
            return true;
        }
    }
    if let Some(file_name) = thread.func_table.file_name(func) {
        if contains(strings.get(file_name)) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::thread_from_paths;

    #[test]
    fn range_filter_narrows_samples() {
        // Samples at 0ms, 1ms, 2ms, 3ms.
        let thread = thread_from_paths(&[&["A"], &["A", "B"], &["A", "B"], &["C"]]);
        let filtered = filter_thread_to_range(
            &thread,
            Timestamp::from_millis_since_reference(1.0),
            Timestamp::from_millis_since_reference(3.0),
        );
        assert_eq!(filtered.samples.len(), 2);
        assert_eq!(
            filtered.samples.time(0),
            Timestamp::from_millis_since_reference(1.0)
        );
        // The unfiltered thread is untouched.
        assert_eq!(thread.samples.len(), 4);
    }

    #[test]
    fn search_filter_keeps_rows_but_nulls_stacks() {
        let thread = thread_from_paths(&[&["A", "B", "C"], &["A", "X"], &["D"]]);
        let filtered = filter_thread_to_search_string(&thread, "b");
        assert_eq!(filtered.samples.len(), 3);
        // Sample 0 has B on its stack, the others do not.
        assert!(filtered.samples.stack(0).is_some());
        assert!(filtered.samples.stack(1).is_none());
        assert!(filtered.samples.stack(2).is_none());
    }

    #[test]
    fn search_matches_descendants_of_matching_frames() {
        // "A" matches the root, so every sample under it survives.
        let thread = thread_from_paths(&[&["A", "B", "C"], &["A", "X"], &["D"]]);
        let filtered = filter_thread_to_search_string(&thread, "a");
        assert!(filtered.samples.stack(0).is_some());
        assert!(filtered.samples.stack(1).is_some());
        assert!(filtered.samples.stack(2).is_none());
    }

    #[test]
    fn empty_search_is_identity() {
        let thread = thread_from_paths(&[&["A"]]);
        let filtered = filter_thread_to_search_string(&thread, "");
        assert_eq!(filtered.samples.len(), thread.samples.len());
        assert_eq!(filtered.samples.stack(0), thread.samples.stack(0));
    }
}
