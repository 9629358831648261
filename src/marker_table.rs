use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::category::CategoryIndex;
use crate::markers::MarkerPayload;
use crate::string_table::StringIndex;
use crate::timestamp::Timestamp;

/// Specifies timestamps for a raw marker row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerTiming {
    /// Instant markers describe a single point in time.
    Instant(Timestamp),
    /// Interval markers describe a time interval with a start and end.
    Interval(Timestamp, Timestamp),
    /// Just the start of an interval; the marker processor pairs it with an
    /// `IntervalEnd` row of the same name, or extends it to the end of the
    /// profile if none follows.
    IntervalStart(Timestamp),
    /// Just the end of an interval; pairs with the last unmatched
    /// `IntervalStart` of the same name, or starts at the beginning of the
    /// profile if none precedes it.
    IntervalEnd(Timestamp),
}

/// The raw markers of one thread, before pairing and payload resolution.
#[derive(Debug, Clone, Default)]
pub struct MarkerTable {
    names: Vec<StringIndex>,
    categories: Vec<CategoryIndex>,
    timings: Vec<MarkerTiming>,
    datas: Vec<Option<MarkerPayload>>,
}

impl MarkerTable {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn push(
        &mut self,
        name: StringIndex,
        category: CategoryIndex,
        timing: MarkerTiming,
        data: Option<MarkerPayload>,
    ) {
        self.names.push(name);
        self.categories.push(category);
        self.timings.push(timing);
        self.datas.push(data);
    }

    pub(crate) fn remap_categories(&mut self, map: impl Fn(CategoryIndex) -> CategoryIndex) {
        for category in &mut self.categories {
            *category = map(*category);
        }
    }

    pub fn name(&self, i: usize) -> StringIndex {
        self.names[i]
    }

    pub fn category(&self, i: usize) -> CategoryIndex {
        self.categories[i]
    }

    pub fn timing(&self, i: usize) -> &MarkerTiming {
        &self.timings[i]
    }

    pub fn data(&self, i: usize) -> Option<&MarkerPayload> {
        self.datas[i].as_ref()
    }
}

impl Serialize for MarkerTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Matches the processed format's marker table shape: phase 0 is
        // instant, 1 interval, 2 interval start, 3 interval end.
        let len = self.names.len();
        let mut starts = Vec::with_capacity(len);
        let mut ends = Vec::with_capacity(len);
        let mut phases = Vec::with_capacity(len);
        for timing in &self.timings {
            let (s, e, phase) = match *timing {
                MarkerTiming::Instant(s) => (Some(s), None, 0u8),
                MarkerTiming::Interval(s, e) => (Some(s), Some(e), 1),
                MarkerTiming::IntervalStart(s) => (Some(s), None, 2),
                MarkerTiming::IntervalEnd(e) => (None, Some(e), 3),
            };
            starts.push(s);
            ends.push(e);
            phases.push(phase);
        }
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("length", &len)?;
        map.serialize_entry("category", &self.categories)?;
        map.serialize_entry("data", &self.datas)?;
        map.serialize_entry("endTime", &ends)?;
        map.serialize_entry("name", &self.names)?;
        map.serialize_entry("phase", &phases)?;
        map.serialize_entry("startTime", &starts)?;
        map.end()
    }
}
