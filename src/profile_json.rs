//! The raw shape of the processed profile JSON, and its conversion into the
//! validated table set.
//!
//! Deserialization is forgiving (missing optional columns default), but the
//! conversion into typed tables checks every column length and foreign key;
//! a profile that fails these checks cannot be displayed and the whole load
//! fails.

use debugid::DebugId;
use serde_derive::Deserialize;
use serde_json::Value;

use crate::category::{CategoryIndex, CategoryList, SubcategoryIndex};
use crate::error::Error;
use crate::frame_table::FrameTable;
use crate::func_table::{FuncFlags, FuncTable};
use crate::lib_table::{Lib, LibIndex, LibTable};
use crate::marker_table::{MarkerTable, MarkerTiming};
use crate::markers::{MarkerPayload, TracingPayload};
use crate::native_symbols::{NativeSymbolIndex, NativeSymbolTable};
use crate::profile::{Page, Profile, ProfileMeta, SampleUnits};
use crate::resource_table::{ResourceIndex, ResourceKind, ResourceTable};
use crate::sample_table::{NativeAllocationsTable, SampleTable, WeightType};
use crate::stack_table::{StackIndex, StackTable};
use crate::string_table::{StringIndex, StringTable};
use crate::thread::Thread;
use crate::timestamp::Timestamp;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileJson {
    pub meta: MetaJson,
    #[serde(default)]
    pub threads: Vec<ThreadJson>,
    #[serde(default)]
    pub pages: Vec<PageJson>,
    #[serde(default)]
    pub libs: Vec<LibJson>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MetaJson {
    #[serde(default = "default_interval")]
    pub interval: f64,
    #[serde(default)]
    pub start_time: f64,
    #[serde(default)]
    pub product: String,
    #[serde(default)]
    pub categories: CategoryList,
    #[serde(default)]
    pub sample_units: Option<SampleUnitsJson>,
}

fn default_interval() -> f64 {
    1.0
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SampleUnitsJson {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub event_delay: Option<String>,
    #[serde(rename = "threadCPUDelta", default)]
    pub thread_cpu_delta: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageJson {
    #[serde(rename = "tabID", default)]
    pub tab_id: Option<u64>,
    #[serde(rename = "innerWindowID")]
    pub inner_window_id: u64,
    pub url: String,
    #[serde(rename = "embedderInnerWindowID", default)]
    pub embedder_inner_window_id: u64,
    #[serde(default)]
    pub is_private_browsing: bool,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LibJson {
    pub name: Option<String>,
    pub debug_name: Option<String>,
    pub path: Option<String>,
    pub debug_path: Option<String>,
    pub breakpad_id: Option<String>,
    pub code_id: Option<String>,
    pub arch: Option<String>,
}

/// `pid` and `tid` appear both as numbers and as strings in the wild.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(untagged)]
pub(crate) enum StringOrNumber {
    #[default]
    Missing,
    String(String),
    Number(serde_json::Number),
}

impl StringOrNumber {
    fn into_string(self) -> String {
        match self {
            StringOrNumber::Missing => String::new(),
            StringOrNumber::String(s) => s,
            StringOrNumber::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThreadJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub pid: StringOrNumber,
    #[serde(default)]
    pub tid: StringOrNumber,
    #[serde(default)]
    pub process_name: Option<String>,
    #[serde(default)]
    pub is_main_thread: bool,
    /// Current column name for the string table.
    #[serde(default)]
    pub string_array: Option<Vec<String>>,
    /// Older profiles used `stringTable` for the same data.
    #[serde(default)]
    pub string_table: Option<Vec<String>>,
    #[serde(default)]
    pub libs: Vec<LibJson>,
    #[serde(default)]
    pub resource_table: ResourceTableJson,
    #[serde(default)]
    pub func_table: FuncTableJson,
    #[serde(default)]
    pub native_symbols: Option<NativeSymbolsJson>,
    #[serde(default)]
    pub frame_table: FrameTableJson,
    #[serde(default)]
    pub stack_table: StackTableJson,
    #[serde(default)]
    pub samples: SamplesJson,
    #[serde(default)]
    pub markers: MarkersJson,
    #[serde(default)]
    pub native_allocations: Option<NativeAllocationsJson>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ResourceTableJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub lib: Vec<Option<i64>>,
    #[serde(default)]
    pub name: Vec<u64>,
    #[serde(default)]
    pub host: Vec<Option<u64>>,
    #[serde(rename = "type", default)]
    pub kind: Vec<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FuncTableJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub name: Vec<u64>,
    #[serde(rename = "isJS", default)]
    pub is_js: Vec<bool>,
    #[serde(rename = "relevantForJS", default)]
    pub relevant_for_js: Vec<bool>,
    #[serde(default)]
    pub resource: Vec<i64>,
    #[serde(default)]
    pub file_name: Vec<Option<u64>>,
    #[serde(default)]
    pub line_number: Vec<Option<u32>>,
    #[serde(default)]
    pub column_number: Vec<Option<u32>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NativeSymbolsJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub lib_index: Vec<u64>,
    #[serde(default)]
    pub address: Vec<u64>,
    #[serde(default)]
    pub function_size: Vec<Option<u32>>,
    #[serde(default)]
    pub name: Vec<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FrameTableJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub func: Vec<u64>,
    #[serde(default)]
    pub category: Vec<Option<u64>>,
    #[serde(default)]
    pub subcategory: Vec<Option<u64>>,
    #[serde(default)]
    pub implementation: Vec<Option<u64>>,
    #[serde(default)]
    pub line: Vec<Option<u32>>,
    #[serde(default)]
    pub column: Vec<Option<u32>>,
    #[serde(default)]
    pub address: Vec<i64>,
    #[serde(default)]
    pub native_symbol: Vec<Option<u64>>,
    #[serde(default)]
    pub inline_depth: Vec<u16>,
    #[serde(rename = "innerWindowID", default)]
    pub inner_window_id: Vec<Option<u64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StackTableJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub prefix: Vec<Option<u64>>,
    #[serde(default)]
    pub frame: Vec<u64>,
    #[serde(default)]
    pub category: Vec<Option<u64>>,
    #[serde(default)]
    pub subcategory: Vec<Option<u64>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SamplesJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub stack: Vec<Option<u64>>,
    #[serde(default)]
    pub time: Vec<f64>,
    #[serde(default)]
    pub weight: Option<Vec<f64>>,
    #[serde(default)]
    pub weight_type: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarkersJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub name: Vec<u64>,
    #[serde(default)]
    pub category: Vec<Option<u64>>,
    #[serde(default)]
    pub data: Vec<Value>,
    /// Legacy single-timestamp column; paired tracing rows use it together
    /// with `data.interval`.
    #[serde(default)]
    pub time: Vec<Option<f64>>,
    #[serde(default)]
    pub start_time: Vec<Option<f64>>,
    #[serde(default)]
    pub end_time: Vec<Option<f64>>,
    #[serde(default)]
    pub phase: Vec<Option<u8>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NativeAllocationsJson {
    #[serde(default)]
    pub length: usize,
    #[serde(default)]
    pub time: Vec<f64>,
    #[serde(default)]
    pub weight: Vec<i64>,
    #[serde(default)]
    pub stack: Vec<Option<u64>>,
    #[serde(default)]
    pub memory_address: Option<Vec<u64>>,
    #[serde(default)]
    pub thread_id: Option<Vec<i64>>,
}

fn check_len<T>(
    table: &'static str,
    column: &'static str,
    col: &[T],
    expected: usize,
) -> Result<(), Error> {
    if col.len() != expected {
        return Err(Error::ColumnLengthMismatch {
            table,
            column,
            actual: col.len(),
            expected,
        });
    }
    Ok(())
}

fn check_index(
    table: &'static str,
    column: &'static str,
    index: u64,
    len: usize,
) -> Result<usize, Error> {
    let index = index as usize;
    if index >= len {
        return Err(Error::IndexOutOfRange {
            table,
            column,
            index,
            len,
        });
    }
    Ok(index)
}

fn lib_from_json(json: &LibJson) -> Lib {
    Lib {
        name: json.name.clone().unwrap_or_default(),
        debug_name: json.debug_name.clone().unwrap_or_default(),
        path: json.path.clone().unwrap_or_default(),
        debug_path: json.debug_path.clone().unwrap_or_default(),
        debug_id: json
            .breakpad_id
            .as_deref()
            .and_then(|id| DebugId::from_breakpad(id).ok()),
        code_id: json.code_id.clone(),
        arch: json.arch.clone(),
    }
}

pub(crate) fn profile_from_json(json: ProfileJson) -> Result<Profile, Error> {
    let categories = json.meta.categories.clone();
    let default_category = categories.default_category();

    // Newer profiles store libs globally; older profiles store them per
    // thread. Threads without their own libs use the global list.
    let global_libs = json.libs;
    let mut threads = Vec::with_capacity(json.threads.len());
    for thread_json in json.threads {
        let libs_json = if thread_json.libs.is_empty() {
            global_libs.clone()
        } else {
            thread_json.libs.clone()
        };
        threads.push(thread_from_json(
            thread_json,
            libs_json,
            &categories,
            default_category,
        )?);
    }

    let pages = json
        .pages
        .into_iter()
        .map(|p| Page {
            tab_id: p.tab_id,
            inner_window_id: p.inner_window_id,
            url: p.url,
            embedder_inner_window_id: p.embedder_inner_window_id,
            is_private_browsing: p.is_private_browsing,
        })
        .collect();

    Ok(Profile {
        meta: ProfileMeta {
            interval: json.meta.interval,
            start_time: json.meta.start_time,
            product: json.meta.product,
            categories,
            sample_units: json.meta.sample_units.map(|u| SampleUnits {
                time: u.time,
                event_delay: u.event_delay,
                thread_cpu_delta: u.thread_cpu_delta,
            }),
        },
        threads,
        pages,
    })
}

fn thread_from_json(
    json: ThreadJson,
    libs_json: Vec<LibJson>,
    categories: &CategoryList,
    default_category: CategoryIndex,
) -> Result<Thread, Error> {
    let name = json.name.clone();
    let strings = json
        .string_array
        .or(json.string_table)
        .unwrap_or_default();
    let string_table = StringTable::from_strings(strings);
    let string_count = string_table.len();

    let mut lib_table = LibTable::new();
    for lib in &libs_json {
        lib_table.push(lib_from_json(lib));
    }

    // Resource table.
    let r = &json.resource_table;
    let resource_len = r.length;
    check_len("resource", "name", &r.name, resource_len)?;
    let mut resource_table = ResourceTable::new();
    for i in 0..resource_len {
        let lib = match r.lib.get(i).copied().flatten() {
            Some(lib) if lib >= 0 => Some(LibIndex(check_index(
                "lib",
                "resource.lib",
                lib as u64,
                lib_table.len(),
            )? as u32)),
            _ => None,
        };
        let name = StringIndex(check_index("string", "resource.name", r.name[i], string_count)? as u32);
        let host = match r.host.get(i).copied().flatten() {
            Some(host) => Some(StringIndex(
                check_index("string", "resource.host", host, string_count)? as u32,
            )),
            None => None,
        };
        let kind = ResourceKind::from_u32(r.kind.get(i).copied().unwrap_or(0));
        resource_table.push(lib, name, host, kind);
    }

    // Func table.
    let f = &json.func_table;
    let func_len = f.length;
    check_len("func", "name", &f.name, func_len)?;
    let mut func_table = FuncTable::new();
    for i in 0..func_len {
        let name = StringIndex(check_index("string", "func.name", f.name[i], string_count)? as u32);
        let mut flags = FuncFlags::empty();
        if f.is_js.get(i).copied().unwrap_or(false) {
            flags |= FuncFlags::IS_JS;
        }
        if f.relevant_for_js.get(i).copied().unwrap_or(false) {
            flags |= FuncFlags::IS_RELEVANT_FOR_JS;
        }
        let resource = match f.resource.get(i).copied().unwrap_or(-1) {
            r if r >= 0 => Some(ResourceIndex(check_index(
                "resource",
                "func.resource",
                r as u64,
                resource_table.len(),
            )? as u32)),
            _ => None,
        };
        let file_name = match f.file_name.get(i).copied().flatten() {
            Some(file) => Some(StringIndex(
                check_index("string", "func.fileName", file, string_count)? as u32,
            )),
            None => None,
        };
        func_table.push(
            name,
            flags,
            resource,
            file_name,
            f.line_number.get(i).copied().flatten(),
            f.column_number.get(i).copied().flatten(),
        );
    }

    // Native symbols.
    let mut native_symbol_table = NativeSymbolTable::new();
    if let Some(ns) = &json.native_symbols {
        let ns_len = ns.length;
        check_len("nativeSymbols", "libIndex", &ns.lib_index, ns_len)?;
        check_len("nativeSymbols", "address", &ns.address, ns_len)?;
        check_len("nativeSymbols", "name", &ns.name, ns_len)?;
        for i in 0..ns_len {
            let lib = LibIndex(check_index(
                "lib",
                "nativeSymbols.libIndex",
                ns.lib_index[i],
                lib_table.len(),
            )? as u32);
            let name = StringIndex(check_index(
                "string",
                "nativeSymbols.name",
                ns.name[i],
                string_count,
            )? as u32);
            native_symbol_table.push(
                lib,
                ns.address[i],
                ns.function_size.get(i).copied().flatten(),
                name,
            );
        }
    }

    // Frame table.
    let fr = &json.frame_table;
    let frame_len = fr.length;
    check_len("frame", "func", &fr.func, frame_len)?;
    let mut frame_table = FrameTable::new();
    for i in 0..frame_len {
        let func = crate::func_table::FuncIndex(check_index(
            "func",
            "frame.func",
            fr.func[i],
            func_table.len(),
        )? as u32);
        let category = match fr.category.get(i).copied().flatten() {
            Some(c) => Some(CategoryIndex(
                check_index("category", "frame.category", c, categories.len())? as u32,
            )),
            None => None,
        };
        let subcategory = fr
            .subcategory
            .get(i)
            .copied()
            .flatten()
            .map(|s| SubcategoryIndex(s as u32));
        let implementation = match fr.implementation.get(i).copied().flatten() {
            Some(s) => Some(StringIndex(
                check_index("string", "frame.implementation", s, string_count)? as u32,
            )),
            None => None,
        };
        let address = match fr.address.get(i).copied().unwrap_or(-1) {
            a if a >= 0 => Some(a as u64),
            _ => None,
        };
        let native_symbol = match fr.native_symbol.get(i).copied().flatten() {
            Some(s) => Some(NativeSymbolIndex(check_index(
                "nativeSymbols",
                "frame.nativeSymbol",
                s,
                native_symbol_table.len(),
            )? as u32)),
            None => None,
        };
        frame_table.push(
            func,
            category,
            subcategory,
            implementation,
            fr.line.get(i).copied().flatten(),
            fr.column.get(i).copied().flatten(),
            address,
            native_symbol,
            fr.inline_depth.get(i).copied().unwrap_or(0),
            fr.inner_window_id.get(i).copied().flatten(),
        );
    }

    // Stack table, with the prefix-order invariant and the category
    // inheritance rule.
    let st = &json.stack_table;
    let stack_len = st.length;
    check_len("stack", "frame", &st.frame, stack_len)?;
    check_len("stack", "prefix", &st.prefix, stack_len)?;
    let mut stack_table = StackTable::new();
    for i in 0..stack_len {
        let prefix = match st.prefix[i] {
            Some(p) => {
                let p = check_index("stack", "stack.prefix", p, stack_len)?;
                if p >= i {
                    return Err(Error::StackPrefixOrder(i, p));
                }
                Some(StackIndex(p as u32))
            }
            None => None,
        };
        let frame = crate::frame_table::FrameIndex(check_index(
            "frame",
            "stack.frame",
            st.frame[i],
            frame_table.len(),
        )? as u32);
        let (category, subcategory) = match st.category.get(i).copied().flatten() {
            Some(c) => {
                let c = CategoryIndex(
                    check_index("category", "stack.category", c, categories.len())? as u32,
                );
                let s = st
                    .subcategory
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|s| SubcategoryIndex(s as u32))
                    .unwrap_or(SubcategoryIndex::OTHER);
                (c, s)
            }
            None => stack_table.inherited_category(
                prefix,
                frame_table.category(frame),
                frame_table.subcategory(frame),
                default_category,
            ),
        };
        stack_table.index_for_stack(prefix, frame, category, subcategory);
    }

    // Samples.
    let s = &json.samples;
    let sample_len = s.length;
    check_len("samples", "time", &s.time, sample_len)?;
    check_len("samples", "stack", &s.stack, sample_len)?;
    if let Some(weight) = &s.weight {
        check_len("samples", "weight", weight, sample_len)?;
    }
    let weight_type = s
        .weight_type
        .as_deref()
        .map(WeightType::from_str_lossy)
        .unwrap_or_default();
    let mut samples = SampleTable::with_weight_type(weight_type);
    for i in 0..sample_len {
        let stack = match s.stack[i] {
            Some(stack) => Some(StackIndex(check_index(
                "stack",
                "samples.stack",
                stack,
                stack_table.len(),
            )? as u32)),
            None => None,
        };
        let weight = s.weight.as_ref().map(|w| w[i]).unwrap_or(1.0);
        samples.push(Timestamp::from_millis_since_reference(s.time[i]), stack, weight);
    }

    // Markers, normalized into `MarkerTiming` rows.
    let m = &json.markers;
    let marker_len = m.length;
    check_len("markers", "name", &m.name, marker_len)?;
    let mut markers = MarkerTable::new();
    for i in 0..marker_len {
        let name = StringIndex(check_index("string", "markers.name", m.name[i], string_count)? as u32);
        let category = match m.category.get(i).copied().flatten() {
            Some(c) => CategoryIndex(
                check_index("category", "markers.category", c, categories.len())? as u32,
            ),
            None => default_category,
        };
        let data = m
            .data
            .get(i)
            .cloned()
            .and_then(|v| serde_json::from_value::<Option<MarkerPayload>>(v).ok())
            .flatten();
        let timing = marker_timing_from_json(m, i, &data);
        markers.push(name, category, timing, data);
    }

    // Native allocations.
    let native_allocations = match &json.native_allocations {
        Some(a) => {
            let len = a.length;
            check_len("nativeAllocations", "time", &a.time, len)?;
            check_len("nativeAllocations", "weight", &a.weight, len)?;
            check_len("nativeAllocations", "stack", &a.stack, len)?;
            if let Some(addresses) = &a.memory_address {
                check_len("nativeAllocations", "memoryAddress", addresses, len)?;
            }
            if let Some(tids) = &a.thread_id {
                check_len("nativeAllocations", "threadId", tids, len)?;
            }
            let mut table = if a.memory_address.is_some() {
                NativeAllocationsTable::new_balanced()
            } else {
                NativeAllocationsTable::new_unbalanced()
            };
            for i in 0..len {
                let stack = match a.stack[i] {
                    Some(stack) => Some(StackIndex(check_index(
                        "stack",
                        "nativeAllocations.stack",
                        stack,
                        stack_table.len(),
                    )? as u32)),
                    None => None,
                };
                table.push(
                    Timestamp::from_millis_since_reference(a.time[i]),
                    stack,
                    a.weight[i],
                    a.memory_address.as_ref().map(|v| v[i]),
                    a.thread_id.as_ref().map(|v| v[i]),
                );
            }
            Some(table)
        }
        None => None,
    };

    Ok(Thread {
        name,
        pid: json.pid.into_string(),
        tid: json.tid.into_string(),
        process_name: json.process_name,
        is_main_thread: json.is_main_thread,
        string_table,
        lib_table,
        resource_table,
        func_table,
        frame_table,
        native_symbol_table,
        stack_table,
        samples,
        markers,
        native_allocations,
    })
}

fn marker_timing_from_json(
    m: &MarkersJson,
    i: usize,
    data: &Option<MarkerPayload>,
) -> MarkerTiming {
    let start = m.start_time.get(i).copied().flatten();
    let end = m.end_time.get(i).copied().flatten();
    if let Some(phase) = m.phase.get(i).copied().flatten() {
        let start = Timestamp::from_millis_since_reference(start.unwrap_or(0.0));
        return match phase {
            1 => MarkerTiming::Interval(
                start,
                Timestamp::from_millis_since_reference(end.unwrap_or(0.0)),
            ),
            2 => MarkerTiming::IntervalStart(start),
            3 => MarkerTiming::IntervalEnd(Timestamp::from_millis_since_reference(
                end.unwrap_or(0.0),
            )),
            _ => MarkerTiming::Instant(start),
        };
    }

    // Legacy shape: one `time` column; tracing payloads mark the halves of
    // an interval via `data.interval`.
    let time = Timestamp::from_millis_since_reference(
        m.time.get(i).copied().flatten().or(start).unwrap_or(0.0),
    );
    if let Some(MarkerPayload::Tracing(TracingPayload {
        interval: Some(interval),
        ..
    })) = data
    {
        return match interval.as_str() {
            "start" => MarkerTiming::IntervalStart(time),
            "end" => MarkerTiming::IntervalEnd(time),
            _ => MarkerTiming::Instant(time),
        };
    }
    match end {
        Some(end) => MarkerTiming::Interval(time, Timestamp::from_millis_since_reference(end)),
        None => MarkerTiming::Instant(time),
    }
}
