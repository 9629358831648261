//! Marker payloads and the marker processor.
//!
//! Raw marker rows arrive in two shapes: complete rows (instant or interval)
//! and tracing-style start/end halves which have to be paired up. The
//! processor resolves both into derived [`Marker`] values with a concrete
//! start, an optional end, and a typed payload.

use regex::Regex;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_derive::{Deserialize as DeriveDeserialize, Serialize as DeriveSerialize};
use serde_json::Value;

use crate::category::CategoryIndex;
use crate::fast_hash_map::FastHashMap;
use crate::marker_table::{MarkerTable, MarkerTiming};
use crate::string_table::{StringIndex, StringTable};
use crate::thread::Thread;
use crate::timestamp::Timestamp;

/// The direction of an IPC marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpcDirection {
    Sending,
    Receiving,
}

/// Payload of a `Network` marker, with the request's timing breakdown.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPayload {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "URI", default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub domain_lookup_start: Option<Timestamp>,
    #[serde(default)]
    pub domain_lookup_end: Option<Timestamp>,
    #[serde(default)]
    pub connect_start: Option<Timestamp>,
    #[serde(default)]
    pub tcp_connect_end: Option<Timestamp>,
    #[serde(default)]
    pub secure_connection_start: Option<Timestamp>,
    #[serde(default)]
    pub connect_end: Option<Timestamp>,
    #[serde(default)]
    pub request_start: Option<Timestamp>,
    #[serde(default)]
    pub response_start: Option<Timestamp>,
    #[serde(default)]
    pub response_end: Option<Timestamp>,
}

/// Payload of an `IPC` marker. `send_tid`/`recv_tid` reference the thread on
/// the other side of the channel; the counterpart marker lives on that
/// thread and may be absent from the capture.
#[derive(Debug, Clone, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpcPayload {
    #[serde(default)]
    pub other_pid: Option<i64>,
    pub message_seqno: i64,
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub side: Option<String>,
    pub direction: IpcDirection,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub sync: bool,
    #[serde(default)]
    pub send_tid: Option<i64>,
    #[serde(default)]
    pub recv_tid: Option<i64>,
}

/// Payload of a `UserTiming` marker (performance.mark / performance.measure).
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTimingPayload {
    pub name: String,
    #[serde(default)]
    pub entry_type: Option<String>,
}

/// The stack captured at the point that caused a tracing marker.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct CauseBacktrace {
    #[serde(default)]
    pub time: Option<Timestamp>,
    #[serde(default)]
    pub stack: Option<u64>,
}

/// Payload of a `tracing` marker. The `interval` field marks start/end
/// halves in the legacy marker shape.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingPayload {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub cause: Option<CauseBacktrace>,
}

/// Payload of a `FileIO` marker.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIoPayload {
    #[serde(default)]
    pub operation: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub thread_id: Option<i64>,
}

/// Payload of a `Log` marker.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogPayload {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Payload parsed from an `Invalidate <url>:<line>` marker string.
#[derive(Debug, Clone, Default, PartialEq, Eq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidationPayload {
    pub url: String,
    #[serde(default)]
    pub line: Option<u32>,
}

/// Payload parsed from a
/// `Bailout_<type> <where> on line <N> of <script>:<M>` marker string.
#[derive(Debug, Clone, Default, PartialEq, Eq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct BailoutPayload {
    pub bailout_type: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub script: String,
    pub bailout_line: u32,
    #[serde(default)]
    pub function_line: Option<u32>,
}

/// Payload of a `CompositorScreenshot` marker.
#[derive(Debug, Clone, Default, PartialEq, DeriveSerialize, DeriveDeserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositorScreenshotPayload {
    #[serde(default)]
    pub url: Option<u64>,
    #[serde(rename = "windowID", default)]
    pub window_id: Option<String>,
    #[serde(default)]
    pub window_width: Option<f64>,
    #[serde(default)]
    pub window_height: Option<f64>,
}

/// A marker payload, discriminated by the `type` property of the raw JSON.
///
/// Unrecognized payload types are preserved as [`MarkerPayload::Unknown`]
/// for forward compatibility; they are never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerPayload {
    Network(NetworkPayload),
    Ipc(IpcPayload),
    UserTiming(UserTimingPayload),
    Tracing(TracingPayload),
    /// `GCMinor`: the nursery collection timing dictionary, preserved as-is.
    GcMinor(Value),
    /// `GCMajor`: the major collection timing dictionary, preserved as-is.
    GcMajor(Value),
    /// `GCSlice`: the slice timing dictionary, preserved as-is.
    GcSlice(Value),
    FileIo(FileIoPayload),
    Log(LogPayload),
    Invalidation(InvalidationPayload),
    Bailout(BailoutPayload),
    CompositorScreenshot(CompositorScreenshotPayload),
    Text(String),
    DummyForTests,
    Unknown(Value),
}

impl MarkerPayload {
    pub fn type_name(&self) -> &str {
        match self {
            MarkerPayload::Network(_) => "Network",
            MarkerPayload::Ipc(_) => "IPC",
            MarkerPayload::UserTiming(_) => "UserTiming",
            MarkerPayload::Tracing(_) => "tracing",
            MarkerPayload::GcMinor(_) => "GCMinor",
            MarkerPayload::GcMajor(_) => "GCMajor",
            MarkerPayload::GcSlice(_) => "GCSlice",
            MarkerPayload::FileIo(_) => "FileIO",
            MarkerPayload::Log(_) => "Log",
            MarkerPayload::Invalidation(_) => "Invalidation",
            MarkerPayload::Bailout(_) => "Bailout",
            MarkerPayload::CompositorScreenshot(_) => "CompositorScreenshot",
            MarkerPayload::Text(_) => "Text",
            MarkerPayload::DummyForTests => "DummyForTests",
            MarkerPayload::Unknown(value) => value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("Unknown"),
        }
    }

    fn from_value(value: Value) -> Option<MarkerPayload> {
        if value.is_null() {
            return None;
        }
        let type_name = value.get("type").and_then(Value::as_str).unwrap_or("");
        let payload = match type_name {
            "Network" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Network)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "IPC" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Ipc)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "UserTiming" => serde_json::from_value(value.clone())
                .map(MarkerPayload::UserTiming)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "tracing" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Tracing)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "GCMinor" => MarkerPayload::GcMinor(value),
            "GCMajor" => MarkerPayload::GcMajor(value),
            "GCSlice" => MarkerPayload::GcSlice(value),
            "FileIO" => serde_json::from_value(value.clone())
                .map(MarkerPayload::FileIo)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "Log" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Log)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "Invalidation" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Invalidation)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "Bailout" => serde_json::from_value(value.clone())
                .map(MarkerPayload::Bailout)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "CompositorScreenshot" => serde_json::from_value(value.clone())
                .map(MarkerPayload::CompositorScreenshot)
                .unwrap_or(MarkerPayload::Unknown(value)),
            "Text" => match value.get("name").and_then(Value::as_str) {
                Some(text) => MarkerPayload::Text(text.to_string()),
                None => MarkerPayload::Unknown(value),
            },
            "DummyForTests" => MarkerPayload::DummyForTests,
            _ => MarkerPayload::Unknown(value),
        };
        Some(payload)
    }

    fn to_value(&self) -> Value {
        fn tagged(type_name: &str, inner: Value) -> Value {
            match inner {
                Value::Object(mut map) => {
                    map.insert("type".to_string(), Value::String(type_name.to_string()));
                    Value::Object(map)
                }
                other => other,
            }
        }
        match self {
            MarkerPayload::Network(p) => tagged("Network", serde_json::to_value(p).unwrap()),
            MarkerPayload::Ipc(p) => tagged("IPC", serde_json::to_value(p).unwrap()),
            MarkerPayload::UserTiming(p) => tagged("UserTiming", serde_json::to_value(p).unwrap()),
            MarkerPayload::Tracing(p) => tagged("tracing", serde_json::to_value(p).unwrap()),
            MarkerPayload::GcMinor(v) | MarkerPayload::GcMajor(v) | MarkerPayload::GcSlice(v) => {
                v.clone()
            }
            MarkerPayload::FileIo(p) => tagged("FileIO", serde_json::to_value(p).unwrap()),
            MarkerPayload::Log(p) => tagged("Log", serde_json::to_value(p).unwrap()),
            MarkerPayload::Invalidation(p) => {
                tagged("Invalidation", serde_json::to_value(p).unwrap())
            }
            MarkerPayload::Bailout(p) => tagged("Bailout", serde_json::to_value(p).unwrap()),
            MarkerPayload::CompositorScreenshot(p) => {
                tagged("CompositorScreenshot", serde_json::to_value(p).unwrap())
            }
            MarkerPayload::Text(text) => {
                serde_json::json!({ "type": "Text", "name": text })
            }
            MarkerPayload::DummyForTests => serde_json::json!({ "type": "DummyForTests" }),
            MarkerPayload::Unknown(v) => v.clone(),
        }
    }
}

impl Serialize for MarkerPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MarkerPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(MarkerPayload::from_value(value).unwrap_or(MarkerPayload::Unknown(Value::Null)))
    }
}

/// A derived marker with a resolved start, optional end, and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: StringIndex,
    pub start: Timestamp,
    /// `None` for instant markers.
    pub end: Option<Timestamp>,
    pub category: CategoryIndex,
    pub data: Option<MarkerPayload>,
    /// True when one half of a start/end pair was missing and the marker was
    /// extended to the profile's start or end.
    pub incomplete: bool,
}

impl Marker {
    pub fn duration_millis(&self) -> Option<f64> {
        self.end.map(|end| end.as_millis() - self.start.as_millis())
    }

    /// Whether the marker overlaps the given half-open time range.
    pub fn overlaps_range(&self, range_start: Timestamp, range_end: Timestamp) -> bool {
        match self.end {
            Some(end) => self.start < range_end && end > range_start,
            None => self.start >= range_start && self.start < range_end,
        }
    }
}

/// Resolves raw marker rows into derived [`Marker`]s.
///
/// Holds the compiled string grammars for the `Invalidate` and `Bailout_`
/// marker-name families.
pub struct MarkerProcessor {
    invalidation_regex: Regex,
    bailout_regex: Regex,
}

impl Default for MarkerProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerProcessor {
    pub fn new() -> Self {
        Self {
            invalidation_regex: Regex::new(r"^Invalidate (?P<url>.+?):(?P<line>[0-9]+)$").unwrap(),
            bailout_regex: Regex::new(
                r"^Bailout_(?P<type>\S+) (?P<where>.+?) on line (?P<bailoutLine>[0-9]+) of (?P<script>.+?):(?P<functionLine>[0-9]+)$",
            )
            .unwrap(),
        }
    }

    /// Parse the marker-name grammars that encode a payload in the name
    /// string. A non-matching string is not an error; the marker stays a
    /// plain marker.
    pub fn payload_from_name(&self, name: &str) -> Option<MarkerPayload> {
        if let Some(captures) = self.invalidation_regex.captures(name) {
            return Some(MarkerPayload::Invalidation(InvalidationPayload {
                url: captures["url"].to_string(),
                line: captures["line"].parse().ok(),
            }));
        }
        if let Some(captures) = self.bailout_regex.captures(name) {
            return Some(MarkerPayload::Bailout(BailoutPayload {
                bailout_type: captures["type"].to_string(),
                where_: captures["where"].to_string(),
                script: captures["script"].to_string(),
                bailout_line: captures["bailoutLine"].parse().ok()?,
                function_line: captures["functionLine"].parse().ok(),
            }));
        }
        None
    }

    /// Convert a raw marker table into derived markers.
    ///
    /// Start/end halves are paired per name with stack discipline: the last
    /// unmatched start pairs with the next end of the same name. An
    /// unmatched end becomes a marker starting at `profile_start`; an
    /// unmatched start becomes a marker ending at `profile_end`. The result
    /// is sorted by start time.
    pub fn derive_markers(
        &self,
        markers: &MarkerTable,
        string_table: &StringTable,
        profile_start: Timestamp,
        profile_end: Timestamp,
    ) -> Vec<Marker> {
        let mut derived = Vec::with_capacity(markers.len());
        let mut open_intervals: FastHashMap<StringIndex, Vec<OpenInterval>> =
            FastHashMap::default();

        for i in 0..markers.len() {
            let name = markers.name(i);
            let category = markers.category(i);
            let data = markers.data(i).cloned().or_else(|| {
                string_table
                    .get(name)
                    .and_then(|name| self.payload_from_name(name))
            });
            match *markers.timing(i) {
                MarkerTiming::Instant(time) => derived.push(Marker {
                    name,
                    start: time,
                    end: None,
                    category,
                    data,
                    incomplete: false,
                }),
                MarkerTiming::Interval(start, end) => derived.push(Marker {
                    name,
                    start,
                    end: Some(end),
                    category,
                    data,
                    incomplete: false,
                }),
                MarkerTiming::IntervalStart(start) => {
                    open_intervals.entry(name).or_default().push(OpenInterval {
                        start,
                        category,
                        data,
                    });
                }
                MarkerTiming::IntervalEnd(end) => {
                    match open_intervals.get_mut(&name).and_then(Vec::pop) {
                        Some(open) => derived.push(Marker {
                            name,
                            start: open.start,
                            end: Some(end),
                            category: open.category,
                            data: open.data.or(data),
                            incomplete: false,
                        }),
                        None => derived.push(Marker {
                            name,
                            start: profile_start,
                            end: Some(end),
                            category,
                            data,
                            incomplete: true,
                        }),
                    }
                }
            }
        }

        for (name, opens) in open_intervals {
            for open in opens {
                derived.push(Marker {
                    name,
                    start: open.start,
                    end: Some(profile_end),
                    category: open.category,
                    data: open.data,
                    incomplete: true,
                });
            }
        }

        derived.sort_by_key(|marker| marker.start);
        derived
    }
}

struct OpenInterval {
    start: Timestamp,
    category: CategoryIndex,
    data: Option<MarkerPayload>,
}

/// The markers overlapping the given half-open time range.
pub fn filter_markers_to_range(
    markers: &[Marker],
    range_start: Timestamp,
    range_end: Timestamp,
) -> Vec<Marker> {
    markers
        .iter()
        .filter(|m| m.overlaps_range(range_start, range_end))
        .cloned()
        .collect()
}

/// The markers whose name or searchable payload strings contain `needle`
/// (case-insensitive).
pub fn filter_markers_to_search_string(
    markers: &[Marker],
    string_table: &StringTable,
    needle: &str,
) -> Vec<Marker> {
    let needle = needle.to_lowercase();
    markers
        .iter()
        .filter(|m| {
            if let Some(name) = string_table.get(m.name) {
                if name.to_lowercase().contains(&needle) {
                    return true;
                }
            }
            let payload_string = match &m.data {
                Some(MarkerPayload::Network(p)) => p.uri.as_deref(),
                Some(MarkerPayload::Ipc(p)) => Some(p.message_type.as_str()),
                Some(MarkerPayload::UserTiming(p)) => Some(p.name.as_str()),
                Some(MarkerPayload::FileIo(p)) => p.filename.as_deref(),
                Some(MarkerPayload::Text(text)) => Some(text.as_str()),
                _ => None,
            };
            payload_string
                .map(|s| s.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Find the thread holding the counterpart of an IPC marker: the marker with
/// the same message seqno travelling in the opposite direction.
///
/// Absence is not an error; the "select the other thread" affordance is
/// simply unavailable for this marker.
pub fn find_ipc_counterpart_thread(
    threads: &[Thread],
    payload: &IpcPayload,
) -> Option<usize> {
    for (thread_index, thread) in threads.iter().enumerate() {
        let markers = thread.markers();
        for i in 0..markers.len() {
            if let Some(MarkerPayload::Ipc(other)) = markers.data(i) {
                if other.message_seqno == payload.message_seqno
                    && other.direction != payload.direction
                {
                    return Some(thread_index);
                }
            }
        }
    }
    log::warn!(
        "No counterpart found for IPC marker with seqno {} ({:?})",
        payload.message_seqno,
        payload.direction
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker_table::MarkerTable;

    fn t(millis: f64) -> Timestamp {
        Timestamp::from_millis_since_reference(millis)
    }

    #[test]
    fn pairs_start_and_end_with_stack_discipline() {
        let mut strings = StringTable::new();
        let name = strings.index_for_string("Rasterize");
        let cat = CategoryIndex(0);
        let mut table = MarkerTable::new();
        table.push(name, cat, MarkerTiming::IntervalStart(t(1.0)), None);
        table.push(name, cat, MarkerTiming::IntervalStart(t(2.0)), None);
        table.push(name, cat, MarkerTiming::IntervalEnd(t(3.0)), None);
        table.push(name, cat, MarkerTiming::IntervalEnd(t(5.0)), None);

        let processor = MarkerProcessor::new();
        let markers = processor.derive_markers(&table, &strings, t(0.0), t(10.0));
        assert_eq!(markers.len(), 2);
        // Last unmatched start pairs with the next end.
        assert_eq!(markers[0].start, t(1.0));
        assert_eq!(markers[0].end, Some(t(5.0)));
        assert_eq!(markers[1].start, t(2.0));
        assert_eq!(markers[1].end, Some(t(3.0)));
        assert!(!markers[0].incomplete);
    }

    #[test]
    fn unmatched_end_starts_at_profile_start() {
        let mut strings = StringTable::new();
        let name = strings.index_for_string("Rasterize");
        let mut table = MarkerTable::new();
        table.push(
            name,
            CategoryIndex(3),
            MarkerTiming::IntervalEnd(t(1.0)),
            None,
        );
        let processor = MarkerProcessor::new();
        let markers = processor.derive_markers(&table, &strings, t(0.0), t(8.0));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].start, t(0.0));
        assert_eq!(markers[0].end, Some(t(1.0)));
        assert!(markers[0].incomplete);
    }

    #[test]
    fn unmatched_start_ends_at_profile_end() {
        let mut strings = StringTable::new();
        let name = strings.index_for_string("LongTask");
        let mut table = MarkerTable::new();
        table.push(
            name,
            CategoryIndex(0),
            MarkerTiming::IntervalStart(t(6.0)),
            None,
        );
        let processor = MarkerProcessor::new();
        let markers = processor.derive_markers(&table, &strings, t(0.0), t(8.0));
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].start, t(6.0));
        assert_eq!(markers[0].end, Some(t(8.0)));
        assert!(markers[0].incomplete);
    }

    #[test]
    fn parses_invalidation_names() {
        let processor = MarkerProcessor::new();
        match processor.payload_from_name("Invalidate https://example.com/app.js:42") {
            Some(MarkerPayload::Invalidation(p)) => {
                assert_eq!(p.url, "https://example.com/app.js");
                assert_eq!(p.line, Some(42));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
        match processor.payload_from_name("Invalidate self-hosted:321") {
            Some(MarkerPayload::Invalidation(p)) => {
                assert_eq!(p.url, "self-hosted");
                assert_eq!(p.line, Some(321));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn parses_bailout_names() {
        let processor = MarkerProcessor::new();
        let name = "Bailout_ShapeGuard after getelem on line 3666 of resource://foo.js:3656";
        match processor.payload_from_name(name) {
            Some(MarkerPayload::Bailout(p)) => {
                assert_eq!(p.bailout_type, "ShapeGuard");
                assert_eq!(p.where_, "after getelem");
                assert_eq!(p.script, "resource://foo.js");
                assert_eq!(p.bailout_line, 3666);
                assert_eq!(p.function_line, Some(3656));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn non_matching_name_stays_generic() {
        let processor = MarkerProcessor::new();
        assert_eq!(processor.payload_from_name("Invalidate"), None);
        assert_eq!(processor.payload_from_name("Bailout_weird"), None);
        assert_eq!(processor.payload_from_name("DOMEvent"), None);
    }

    #[test]
    fn payload_type_dispatch() {
        let network = MarkerPayload::from_value(serde_json::json!({
            "type": "Network",
            "id": 12,
            "status": "STATUS_STOP",
            "URI": "https://example.com/",
            "requestStart": 2.0,
            "responseStart": 3.0,
            "responseEnd": 4.5,
        }))
        .unwrap();
        match network {
            MarkerPayload::Network(p) => {
                assert_eq!(p.id, 12);
                assert_eq!(p.uri.as_deref(), Some("https://example.com/"));
                assert_eq!(p.response_end, Some(t(4.5)));
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        let unknown =
            MarkerPayload::from_value(serde_json::json!({ "type": "SomeFutureThing", "x": 1 }))
                .unwrap();
        assert!(matches!(unknown, MarkerPayload::Unknown(_)));
        assert_eq!(unknown.type_name(), "SomeFutureThing");

        let dummy = MarkerPayload::from_value(serde_json::json!({ "type": "DummyForTests" }));
        assert_eq!(dummy, Some(MarkerPayload::DummyForTests));
    }

    #[test]
    fn range_overlap() {
        let mut strings = StringTable::new();
        let name = strings.index_for_string("M");
        let interval = Marker {
            name,
            start: t(2.0),
            end: Some(t(4.0)),
            category: CategoryIndex(0),
            data: None,
            incomplete: false,
        };
        assert!(interval.overlaps_range(t(3.0), t(10.0)));
        assert!(interval.overlaps_range(t(0.0), t(3.0)));
        assert!(!interval.overlaps_range(t(4.0), t(10.0)));
        let instant = Marker {
            end: None,
            ..interval.clone()
        };
        assert!(instant.overlaps_range(t(2.0), t(3.0)));
        assert!(!instant.overlaps_range(t(3.0), t(4.0)));
    }
}
