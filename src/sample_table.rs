use std::fmt::{Display, Formatter};
use std::ops::Range;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Error;
use crate::fast_hash_map::FastHashMap;
use crate::stack_table::StackIndex;
use crate::timestamp::Timestamp;

/// How the weight column of a sample table is to be interpreted.
///
/// Time-based sampling uses `Samples` with a weight of one per sample;
/// comparison profiles can carry negative weights; allocation tables carry
/// byte weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightType {
    #[default]
    Samples,
    TracingMs,
    Bytes,
}

impl Display for WeightType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WeightType::Samples => write!(f, "samples"),
            WeightType::TracingMs => write!(f, "tracing-ms"),
            WeightType::Bytes => write!(f, "bytes"),
        }
    }
}

impl WeightType {
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "tracing-ms" => WeightType::TracingMs,
            "bytes" => WeightType::Bytes,
            _ => WeightType::Samples,
        }
    }
}

impl Serialize for WeightType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The samples of one thread.
///
/// Invariant: timestamps are non-decreasing, so time-range narrowing is a
/// binary search. A `None` stack means the sample's stack is unknown.
#[derive(Debug, Clone, Default)]
pub struct SampleTable {
    weight_type: WeightType,
    stacks: Vec<Option<StackIndex>>,
    times: Vec<Timestamp>,
    weights: Vec<f64>,
}

impl SampleTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_weight_type(weight_type: WeightType) -> Self {
        Self {
            weight_type,
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn weight_type(&self) -> WeightType {
        self.weight_type
    }

    pub fn push(&mut self, time: Timestamp, stack: Option<StackIndex>, weight: f64) {
        self.times.push(time);
        self.stacks.push(stack);
        self.weights.push(weight);
    }

    pub fn time(&self, i: usize) -> Timestamp {
        self.times[i]
    }

    pub fn stack(&self, i: usize) -> Option<StackIndex> {
        self.stacks[i]
    }

    pub fn set_stack(&mut self, i: usize, stack: Option<StackIndex>) {
        self.stacks[i] = stack;
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, Option<StackIndex>, f64)> + '_ {
        (0..self.len()).map(move |i| (self.times[i], self.stacks[i], self.weights[i]))
    }

    /// The half-open index range of samples whose time falls in
    /// `[range_start, range_end)`.
    pub fn range_indices(&self, range_start: Timestamp, range_end: Timestamp) -> Range<usize> {
        let start = self.times.partition_point(|t| *t < range_start);
        let end = self.times.partition_point(|t| *t < range_end);
        start..end
    }

    /// A copy narrowed to the given time range.
    pub fn filtered_to_range(&self, range_start: Timestamp, range_end: Timestamp) -> SampleTable {
        let range = self.range_indices(range_start, range_end);
        SampleTable {
            weight_type: self.weight_type,
            stacks: self.stacks[range.clone()].to_vec(),
            times: self.times[range.clone()].to_vec(),
            weights: self.weights[range].to_vec(),
        }
    }

    /// A copy with the row set reduced to those where `keep` returns true.
    /// Used by the transforms which genuinely shrink the sample set.
    pub fn retained_rows(&self, mut keep: impl FnMut(usize) -> bool) -> SampleTable {
        let mut out = SampleTable::with_weight_type(self.weight_type);
        for i in 0..self.len() {
            if keep(i) {
                out.push(self.times[i], self.stacks[i], self.weights[i]);
            }
        }
        out
    }
}

impl Serialize for SampleTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.times.len();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("weightType", &self.weight_type)?;
        map.serialize_entry("stack", &self.stacks)?;
        map.serialize_entry("time", &self.times)?;
        map.serialize_entry("weight", &self.weights)?;
        map.end()
    }
}

/// The native allocations of one thread, a sample-like table whose weights
/// are bytes (positive for allocations, negative for deallocations).
///
/// The original "unbalanced" shape has no memory addresses; the "balanced"
/// shape added a memory address and thread id per row. Retained-allocation
/// derivation is only possible on the balanced shape.
#[derive(Debug, Clone, Default)]
pub struct NativeAllocationsTable {
    times: Vec<Timestamp>,
    stacks: Vec<Option<StackIndex>>,
    weights: Vec<i64>,
    memory_addresses: Option<Vec<u64>>,
    thread_ids: Option<Vec<i64>>,
}

impl NativeAllocationsTable {
    pub fn new_unbalanced() -> Self {
        Default::default()
    }

    pub fn new_balanced() -> Self {
        Self {
            memory_addresses: Some(Vec::new()),
            thread_ids: Some(Vec::new()),
            ..Default::default()
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn is_balanced(&self) -> bool {
        self.memory_addresses.is_some()
    }

    pub fn push(
        &mut self,
        time: Timestamp,
        stack: Option<StackIndex>,
        weight: i64,
        memory_address: Option<u64>,
        thread_id: Option<i64>,
    ) {
        self.times.push(time);
        self.stacks.push(stack);
        self.weights.push(weight);
        if let (Some(addresses), Some(address)) = (&mut self.memory_addresses, memory_address) {
            addresses.push(address);
        }
        if let (Some(tids), Some(tid)) = (&mut self.thread_ids, thread_id) {
            tids.push(tid);
        }
    }

    pub fn stack(&self, i: usize) -> Option<StackIndex> {
        self.stacks[i]
    }

    pub fn time(&self, i: usize) -> Timestamp {
        self.times[i]
    }

    pub fn weight(&self, i: usize) -> i64 {
        self.weights[i]
    }

    /// The allocations which were never freed during the profile, as a
    /// sample table in bytes, suitable for building a retained-memory tree.
    ///
    /// An allocation row pairs with a later deallocation row at the same
    /// memory address; paired rows cancel. Requires the balanced shape.
    pub fn retained_allocations(&self) -> Result<SampleTable, Error> {
        let memory_addresses = self
            .memory_addresses
            .as_ref()
            .ok_or(Error::UnbalancedAllocations)?;

        let mut live: FastHashMap<u64, usize> = FastHashMap::default();
        let mut retained = vec![false; self.len()];
        for i in 0..self.len() {
            let address = memory_addresses[i];
            if self.weights[i] >= 0 {
                if let Some(previous) = live.insert(address, i) {
                    // Two live allocations at one address: the first one was
                    // freed without a matching deallocation sample.
                    retained[previous] = false;
                }
                retained[i] = true;
            } else if let Some(allocation) = live.remove(&address) {
                retained[allocation] = false;
            }
        }

        let mut out = SampleTable::with_weight_type(WeightType::Bytes);
        for i in 0..self.len() {
            if retained[i] {
                out.push(self.times[i], self.stacks[i], self.weights[i] as f64);
            }
        }
        Ok(out)
    }

    /// A copy narrowed to the given time range.
    pub fn filtered_to_range(
        &self,
        range_start: Timestamp,
        range_end: Timestamp,
    ) -> NativeAllocationsTable {
        let start = self.times.partition_point(|t| *t < range_start);
        let end = self.times.partition_point(|t| *t < range_end);
        NativeAllocationsTable {
            times: self.times[start..end].to_vec(),
            stacks: self.stacks[start..end].to_vec(),
            weights: self.weights[start..end].to_vec(),
            memory_addresses: self
                .memory_addresses
                .as_ref()
                .map(|v| v[start..end].to_vec()),
            thread_ids: self.thread_ids.as_ref().map(|v| v[start..end].to_vec()),
        }
    }

    pub fn map_stacks(&mut self, mut f: impl FnMut(Option<StackIndex>) -> Option<StackIndex>) {
        for stack in &mut self.stacks {
            *stack = f(*stack);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(millis: f64) -> Timestamp {
        Timestamp::from_millis_since_reference(millis)
    }

    #[test]
    fn range_narrowing_is_half_open() {
        let mut samples = SampleTable::new();
        for i in 0..5 {
            samples.push(t(i as f64), None, 1.0);
        }
        assert_eq!(samples.range_indices(t(1.0), t(3.0)), 1..3);
        assert_eq!(samples.filtered_to_range(t(1.0), t(3.0)).len(), 2);
        assert_eq!(samples.range_indices(t(10.0), t(20.0)), 5..5);
    }

    #[test]
    fn retained_allocations_requires_balanced_table() {
        let mut unbalanced = NativeAllocationsTable::new_unbalanced();
        unbalanced.push(t(0.0), None, 16, None, None);
        assert!(matches!(
            unbalanced.retained_allocations(),
            Err(Error::UnbalancedAllocations)
        ));
    }

    #[test]
    fn retained_allocations_pairs_by_address() {
        let mut table = NativeAllocationsTable::new_balanced();
        table.push(t(0.0), None, 16, Some(0x1000), Some(1));
        table.push(t(1.0), None, 32, Some(0x2000), Some(1));
        table.push(t(2.0), None, -16, Some(0x1000), Some(1));
        table.push(t(3.0), None, 8, Some(0x3000), Some(1));
        let retained = table.retained_allocations().unwrap();
        assert_eq!(retained.len(), 2);
        assert_eq!(retained.weight(0), 32.0);
        assert_eq!(retained.weight(1), 8.0);
    }
}
