//! Per-source-line timing attribution for the source view.
//!
//! Works in two phases: [`get_stack_line_info`] resolves, per stack row,
//! which lines of one file the row's chain touches and which line receives
//! self time; [`get_line_timings`] then folds the samples over that per-row
//! info. The per-row line sets are `Rc`-shared with the prefix row whenever
//! a row adds nothing new, so the pass stays linear in practice.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::frame_table::FrameTable;
use crate::func_table::FuncTable;
use crate::sample_table::SampleTable;
use crate::stack_table::{StackIndex, StackTable};
use crate::string_table::StringIndex;

/// Per-stack-row line information for one file.
#[derive(Debug, Clone)]
pub struct StackLineInfo {
    /// For each stack row, the set of lines in the file hit anywhere on the
    /// row's chain, or `None` when the chain never enters the file.
    pub stack_lines: Vec<Option<Rc<BTreeSet<u32>>>>,
    /// For each stack row, the line that receives self time when a sample's
    /// leaf is this row, or `None` when self time belongs to another file.
    pub self_line: Vec<Option<u32>>,
}

/// Accumulated line hits for one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineTimings {
    /// Sample weight per line, counted once per sample that touches the
    /// line anywhere on its stack. Recursion does not multiply the count.
    pub total_line_hits: BTreeMap<u32, f64>,
    /// Sample weight per line for samples whose self time lands on it.
    pub self_line_hits: BTreeMap<u32, f64>,
}

/// Resolve per-stack-row line info for the file named by `file`.
///
/// With `inverted` set, the stack table is an inverted one: each chain runs
/// from the original leaf (the root row) towards the callers, so self time
/// belongs to the chain's root and every row inherits its self line from
/// its prefix. The total sets are chain unions either way, which is what
/// makes line timings identical between the two orientations.
pub fn get_stack_line_info(
    stack_table: &StackTable,
    frame_table: &FrameTable,
    func_table: &FuncTable,
    file: StringIndex,
    inverted: bool,
) -> StackLineInfo {
    let len = stack_table.len();
    let mut stack_lines: Vec<Option<Rc<BTreeSet<u32>>>> = Vec::with_capacity(len);
    let mut self_line: Vec<Option<u32>> = Vec::with_capacity(len);
    // The line of the nearest non-inlined in-file frame on the chain, used
    // to attribute self time of inlined frames to their outer line.
    let mut outer_line: Vec<Option<u32>> = Vec::with_capacity(len);

    for i in 0..len {
        let row = StackIndex(i as u32);
        let prefix = stack_table.prefix(row);
        let frame = stack_table.frame(row);
        let func = frame_table.func(frame);
        let in_file = func_table.file_name(func) == Some(file);
        let line = if in_file { frame_table.line(frame) } else { None };

        let prefix_lines = prefix.and_then(|p| stack_lines[p.usize()].clone());
        let lines = match (line, prefix_lines) {
            (Some(line), Some(prefix_lines)) => {
                if prefix_lines.contains(&line) {
                    Some(prefix_lines)
                } else {
                    let mut set = (*prefix_lines).clone();
                    set.insert(line);
                    Some(Rc::new(set))
                }
            }
            (Some(line), None) => Some(Rc::new(BTreeSet::from([line]))),
            (None, prefix_lines) => prefix_lines,
        };
        stack_lines.push(lines);

        if inverted {
            // The chain root is the original self frame.
            let inherited = match prefix {
                Some(p) => self_line[p.usize()],
                None => line,
            };
            self_line.push(inherited);
            outer_line.push(None);
        } else {
            let prefix_outer = prefix.and_then(|p| outer_line[p.usize()]);
            let outer = if frame_table.inline_depth(frame) == 0 {
                line
            } else {
                prefix_outer
            };
            outer_line.push(outer);
            self_line.push(if in_file {
                if frame_table.inline_depth(frame) == 0 {
                    line
                } else {
                    outer
                }
            } else {
                None
            });
        }
    }

    StackLineInfo {
        stack_lines,
        self_line,
    }
}

/// Fold the samples over the per-row line info.
pub fn get_line_timings(info: &StackLineInfo, samples: &SampleTable) -> LineTimings {
    let mut timings = LineTimings::default();
    for (_, stack, weight) in samples.iter() {
        let Some(stack) = stack else { continue };
        if let Some(lines) = &info.stack_lines[stack.usize()] {
            for &line in lines.iter() {
                *timings.total_line_hits.entry(line).or_insert(0.0) += weight;
            }
        }
        if let Some(line) = info.self_line[stack.usize()] {
            *timings.self_line_hits.entry(line).or_insert(0.0) += weight;
        }
    }
    timings
}
