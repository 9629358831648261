//! The call node tree builder.
//!
//! A call node is identified by (parent call node, func) — not by stack
//! index. Two samples with different stack rows but identical func chains
//! land in the same call node; this is what distinguishes the call tree from
//! the raw stack table.

use serde::ser::{Serialize, Serializer};

use crate::category::CategoryIndex;
use crate::fast_hash_map::{FastHashMap, FastHashSet, FastIndexMap};
use crate::func_table::FuncIndex;
use crate::stack_table::StackIndex;
use crate::thread::Thread;

/// An index into a [`CallTree`]'s node arrays.
#[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
pub struct CallNodeIndex(pub(crate) u32);

impl CallNodeIndex {
    pub(crate) fn usize(self) -> usize {
        self.0 as usize
    }
}

impl Serialize for CallNodeIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

/// The derived call tree of one thread.
///
/// Rebuilt from scratch whenever the filtered thread changes; never patched
/// incrementally.
#[derive(Debug, Clone)]
pub struct CallTree {
    inverted: bool,
    default_category: CategoryIndex,
    funcs: Vec<FuncIndex>,
    parents: Vec<Option<CallNodeIndex>>,
    depths: Vec<u16>,
    children: Vec<Vec<CallNodeIndex>>,
    totals: Vec<f64>,
    selfs: Vec<f64>,
    category_times: Vec<FastHashMap<CategoryIndex, f64>>,
    roots: Vec<CallNodeIndex>,
}

impl CallTree {
    /// Build the (possibly inverted) call tree for a thread.
    ///
    /// For the inverted tree each sample's path is reversed before
    /// accumulation: roots are the original leaf functions and children are
    /// callers. Self time is attributed to the inverted root, so the summed
    /// self time over all nodes is the same in both orientations.
    pub fn build(thread: &Thread, default_category: CategoryIndex, inverted: bool) -> CallTree {
        let mut builder = CallTreeBuilder::new(inverted, default_category);

        // Multiple samples share leaf stacks; accumulate weights per stack
        // first so each distinct chain is walked once. Insertion order keeps
        // call node numbering deterministic.
        let samples = thread.samples();
        let mut weight_per_stack: FastIndexMap<StackIndex, f64> = FastIndexMap::default();
        for (_, stack, weight) in samples.iter() {
            if let Some(stack) = stack {
                *weight_per_stack.entry(stack).or_insert(0.0) += weight;
            }
        }

        let stack_table = thread.stack_table();
        for (&leaf, &weight) in &weight_per_stack {
            // Chain rows ordered leaf to root.
            let mut chain = Vec::new();
            let mut current = Some(leaf);
            while let Some(stack) = current {
                chain.push(stack);
                current = stack_table.prefix(stack);
            }

            if inverted {
                // The reversed path: the original leaf becomes the root.
                let mut parent = None;
                for (k, &row) in chain.iter().enumerate() {
                    let func = thread.func_for_stack(row);
                    let node = builder.intern(parent, func);
                    builder.totals[node.usize()] += weight;
                    *builder.category_times[node.usize()]
                        .entry(stack_table.category(row))
                        .or_insert(0.0) += weight;
                    if k == 0 {
                        builder.selfs[node.usize()] += weight;
                    }
                    parent = Some(node);
                }
            } else {
                let mut parent = None;
                let mut leaf_node = None;
                for &row in chain.iter().rev() {
                    let func = thread.func_for_stack(row);
                    let node = builder.intern(parent, func);
                    builder.totals[node.usize()] += weight;
                    *builder.category_times[node.usize()]
                        .entry(stack_table.category(row))
                        .or_insert(0.0) += weight;
                    parent = Some(node);
                    leaf_node = Some(node);
                }
                if let Some(leaf_node) = leaf_node {
                    builder.selfs[leaf_node.usize()] += weight;
                }
            }
        }

        builder.finish()
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn len(&self) -> usize {
        self.funcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.funcs.is_empty()
    }

    /// Root nodes, ordered by descending total (ties by func index).
    pub fn roots(&self) -> &[CallNodeIndex] {
        &self.roots
    }

    pub fn func(&self, node: CallNodeIndex) -> FuncIndex {
        self.funcs[node.usize()]
    }

    pub fn parent(&self, node: CallNodeIndex) -> Option<CallNodeIndex> {
        self.parents[node.usize()]
    }

    pub fn depth(&self, node: CallNodeIndex) -> u16 {
        self.depths[node.usize()]
    }

    /// Children ordered by descending total (ties by func index).
    pub fn children(&self, node: CallNodeIndex) -> &[CallNodeIndex] {
        &self.children[node.usize()]
    }

    pub fn total(&self, node: CallNodeIndex) -> f64 {
        self.totals[node.usize()]
    }

    pub fn self_time(&self, node: CallNodeIndex) -> f64 {
        self.selfs[node.usize()]
    }

    /// The node's dominant category: the category with the largest time
    /// contribution across the stacks this node aggregates. Ties go to the
    /// lowest category index, so the result is deterministic.
    pub fn category(&self, node: CallNodeIndex) -> CategoryIndex {
        let times = &self.category_times[node.usize()];
        let mut best: Option<(CategoryIndex, f64)> = None;
        for (&category, &time) in times {
            best = Some(match best {
                None => (category, time),
                Some((best_category, best_time)) => {
                    if time > best_time || (time == best_time && category < best_category) {
                        (category, time)
                    } else {
                        (best_category, best_time)
                    }
                }
            });
        }
        best.map(|(c, _)| c).unwrap_or(self.default_category)
    }

    /// The sum of self time over every node. Equal to the sum of weights of
    /// the samples with known stacks.
    pub fn self_time_sum(&self) -> f64 {
        self.selfs.iter().sum()
    }

    /// Resolve a func path (root-first) to a call node.
    pub fn node_for_path(&self, path: &[FuncIndex]) -> Option<CallNodeIndex> {
        let mut candidates: &[CallNodeIndex] = &self.roots;
        let mut matched = None;
        for func in path {
            let node = *candidates.iter().find(|n| self.func(**n) == *func)?;
            matched = Some(node);
            candidates = self.children(node);
        }
        matched
    }

    /// The func path (root-first) of a node.
    pub fn path_for_node(&self, node: CallNodeIndex) -> Vec<FuncIndex> {
        let mut path = Vec::new();
        let mut current = Some(node);
        while let Some(node) = current {
            path.push(self.func(node));
            current = self.parent(node);
        }
        path.reverse();
        path
    }

    /// The node and all of its descendants, preorder.
    pub fn descendants(&self, node: CallNodeIndex) -> Vec<CallNodeIndex> {
        let mut result = vec![node];
        let mut i = 0;
        while i < result.len() {
            result.extend_from_slice(self.children(result[i]));
            i += 1;
        }
        result
    }
}

struct CallTreeBuilder {
    inverted: bool,
    default_category: CategoryIndex,
    funcs: Vec<FuncIndex>,
    parents: Vec<Option<CallNodeIndex>>,
    depths: Vec<u16>,
    children: Vec<Vec<CallNodeIndex>>,
    totals: Vec<f64>,
    selfs: Vec<f64>,
    category_times: Vec<FastHashMap<CategoryIndex, f64>>,
    roots: Vec<CallNodeIndex>,
    index: FastHashMap<(Option<CallNodeIndex>, FuncIndex), CallNodeIndex>,
}

impl CallTreeBuilder {
    fn new(inverted: bool, default_category: CategoryIndex) -> Self {
        Self {
            inverted,
            default_category,
            funcs: Vec::new(),
            parents: Vec::new(),
            depths: Vec::new(),
            children: Vec::new(),
            totals: Vec::new(),
            selfs: Vec::new(),
            category_times: Vec::new(),
            roots: Vec::new(),
            index: FastHashMap::default(),
        }
    }

    fn intern(&mut self, parent: Option<CallNodeIndex>, func: FuncIndex) -> CallNodeIndex {
        if let Some(node) = self.index.get(&(parent, func)) {
            return *node;
        }
        let node = CallNodeIndex(self.funcs.len() as u32);
        self.funcs.push(func);
        self.parents.push(parent);
        self.depths.push(match parent {
            Some(parent) => self.depths[parent.usize()] + 1,
            None => 0,
        });
        self.children.push(Vec::new());
        self.totals.push(0.0);
        self.selfs.push(0.0);
        self.category_times.push(FastHashMap::default());
        match parent {
            Some(parent) => self.children[parent.usize()].push(node),
            None => self.roots.push(node),
        }
        self.index.insert((parent, func), node);
        node
    }

    fn finish(mut self) -> CallTree {
        // Deterministic display order: descending total, ties by func index.
        let totals = &self.totals;
        let funcs = &self.funcs;
        let sort_key = |n: &CallNodeIndex| {
            (
                std::cmp::Reverse(ordered_float(totals[n.usize()])),
                funcs[n.usize()],
            )
        };
        for children in &mut self.children {
            children.sort_by_key(sort_key);
        }
        self.roots.sort_by_key(sort_key);
        CallTree {
            inverted: self.inverted,
            default_category: self.default_category,
            funcs: self.funcs,
            parents: self.parents,
            depths: self.depths,
            children: self.children,
            totals: self.totals,
            selfs: self.selfs,
            category_times: self.category_times,
            roots: self.roots,
        }
    }
}

// Totals are finite sums of sample weights, so ordering by bits after the
// standard monotone flip is sound.
fn ordered_float(f: f64) -> u64 {
    let bits = f.to_bits();
    if bits >> 63 == 0 {
        bits | (1 << 63)
    } else {
        !bits
    }
}

/// Per-function timings across all call paths (the "function list" view).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTiming {
    pub func: FuncIndex,
    pub total: f64,
    pub self_time: f64,
}

/// Aggregate total and self time per function, deduplicating recursion: a
/// function appearing twice in one sample's stack counts that sample's
/// weight once in its total.
pub fn compute_function_timings(thread: &Thread) -> Vec<FunctionTiming> {
    let stack_table = thread.stack_table();
    let mut weight_per_stack: FastIndexMap<StackIndex, f64> = FastIndexMap::default();
    for (_, stack, weight) in thread.samples().iter() {
        if let Some(stack) = stack {
            *weight_per_stack.entry(stack).or_insert(0.0) += weight;
        }
    }

    let mut totals: FastHashMap<FuncIndex, f64> = FastHashMap::default();
    let mut selfs: FastHashMap<FuncIndex, f64> = FastHashMap::default();
    let mut seen: FastHashSet<FuncIndex> = FastHashSet::default();
    for (&leaf, &weight) in &weight_per_stack {
        seen.clear();
        *selfs.entry(thread.func_for_stack(leaf)).or_insert(0.0) += weight;
        let mut current = Some(leaf);
        while let Some(stack) = current {
            let func = thread.func_for_stack(stack);
            if seen.insert(func) {
                *totals.entry(func).or_insert(0.0) += weight;
            }
            current = stack_table.prefix(stack);
        }
    }

    let mut timings: Vec<FunctionTiming> = totals
        .into_iter()
        .map(|(func, total)| FunctionTiming {
            func,
            total,
            self_time: selfs.get(&func).copied().unwrap_or(0.0),
        })
        .collect();
    timings.sort_by_key(|t| (std::cmp::Reverse(ordered_float(t.total)), t.func));
    timings
}
