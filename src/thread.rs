use crate::frame_table::FrameTable;
use crate::func_table::{FuncIndex, FuncTable};
use crate::lib_table::LibTable;
use crate::marker_table::{MarkerTable, MarkerTiming};
use crate::native_symbols::NativeSymbolTable;
use crate::resource_table::ResourceTable;
use crate::sample_table::{NativeAllocationsTable, SampleTable};
use crate::stack_table::{StackIndex, StackTable};
use crate::string_table::StringTable;
use crate::timestamp::Timestamp;

/// One thread's complete table set.
///
/// All row indexes are local to this thread. Derivation functions treat a
/// `Thread` as an immutable snapshot; the transform pipeline produces new
/// snapshots rather than mutating in place.
#[derive(Debug, Clone, Default)]
pub struct Thread {
    pub(crate) name: String,
    pub(crate) pid: String,
    pub(crate) tid: String,
    pub(crate) process_name: Option<String>,
    pub(crate) is_main_thread: bool,
    pub(crate) string_table: StringTable,
    pub(crate) lib_table: LibTable,
    pub(crate) resource_table: ResourceTable,
    pub(crate) func_table: FuncTable,
    pub(crate) frame_table: FrameTable,
    pub(crate) native_symbol_table: NativeSymbolTable,
    pub(crate) stack_table: StackTable,
    pub(crate) samples: SampleTable,
    pub(crate) markers: MarkerTable,
    pub(crate) native_allocations: Option<NativeAllocationsTable>,
}

impl Thread {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn tid(&self) -> &str {
        &self.tid
    }

    pub fn process_name(&self) -> Option<&str> {
        self.process_name.as_deref()
    }

    pub fn is_main_thread(&self) -> bool {
        self.is_main_thread
    }

    pub fn string_table(&self) -> &StringTable {
        &self.string_table
    }

    pub fn lib_table(&self) -> &LibTable {
        &self.lib_table
    }

    pub fn resource_table(&self) -> &ResourceTable {
        &self.resource_table
    }

    pub fn func_table(&self) -> &FuncTable {
        &self.func_table
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.frame_table
    }

    pub fn native_symbol_table(&self) -> &NativeSymbolTable {
        &self.native_symbol_table
    }

    pub fn stack_table(&self) -> &StackTable {
        &self.stack_table
    }

    pub fn samples(&self) -> &SampleTable {
        &self.samples
    }

    pub fn markers(&self) -> &MarkerTable {
        &self.markers
    }

    pub fn native_allocations(&self) -> Option<&NativeAllocationsTable> {
        self.native_allocations.as_ref()
    }

    /// The func of the frame at the given stack row.
    pub fn func_for_stack(&self, stack: StackIndex) -> FuncIndex {
        self.frame_table.func(self.stack_table.frame(stack))
    }

    /// The name of a func, or `"<unknown>"` if its string index is stale.
    pub fn func_name(&self, func: FuncIndex) -> &str {
        self.string_table
            .get(self.func_table.name(func))
            .unwrap_or("<unknown>")
    }

    /// The func chain of a stack, ordered root to leaf.
    pub fn func_path(&self, stack: StackIndex) -> Vec<FuncIndex> {
        self.stack_table
            .chain_to_root(stack)
            .into_iter()
            .map(|s| self.func_for_stack(s))
            .collect()
    }

    /// The time span covered by this thread's samples and markers, or `None`
    /// for a thread with neither.
    pub fn time_range(&self) -> Option<(Timestamp, Timestamp)> {
        let mut range: Option<(Timestamp, Timestamp)> = None;
        let mut extend = |t: Timestamp| {
            range = Some(match range {
                Some((start, end)) => (start.min(t), end.max(t)),
                None => (t, t),
            });
        };
        if !self.samples.is_empty() {
            extend(self.samples.time(0));
            extend(self.samples.time(self.samples.len() - 1));
        }
        for i in 0..self.markers.len() {
            match *self.markers.timing(i) {
                MarkerTiming::Instant(t)
                | MarkerTiming::IntervalStart(t)
                | MarkerTiming::IntervalEnd(t) => extend(t),
                MarkerTiming::Interval(s, e) => {
                    extend(s);
                    extend(e);
                }
            }
        }
        range
    }
}
