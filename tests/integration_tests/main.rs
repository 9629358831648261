use std::collections::HashMap;

use assert_json_diff::assert_json_eq;
use serde_json::{json, Value};

use fxprof_analysis::{
    apply_transform, filter_thread_to_range, filter_thread_to_search_string, get_line_timings,
    get_stack_line_info, merge_profiles, CallTree, Error, MarkerPayload, MarkerProcessor, Profile,
    ProfileQuerier, QueryResponse, Timestamp, Transform,
};

/// Build a processed-profile JSON value with one thread whose samples are
/// the given root-to-leaf func name paths, one sample per path at 1ms
/// intervals. Every func lives in "app.js" on line (10 * func index).
fn profile_json_from_paths(paths: &[&[&str]]) -> Value {
    let mut strings: Vec<String> = vec!["app.js".to_string()];
    let mut func_index_by_name: HashMap<String, usize> = HashMap::new();
    let mut func_names: Vec<usize> = Vec::new();

    let mut stack_index_by_key: HashMap<(Option<usize>, usize), usize> = HashMap::new();
    let mut stack_prefixes: Vec<Option<usize>> = Vec::new();
    let mut stack_frames: Vec<usize> = Vec::new();

    let mut sample_stacks: Vec<usize> = Vec::new();
    let mut sample_times: Vec<f64> = Vec::new();

    for (i, path) in paths.iter().enumerate() {
        let mut prefix: Option<usize> = None;
        for name in *path {
            let func = *func_index_by_name.entry(name.to_string()).or_insert_with(|| {
                strings.push(name.to_string());
                func_names.push(strings.len() - 1);
                func_names.len() - 1
            });
            // One frame per func, so the frame index equals the func index.
            let stack = *stack_index_by_key.entry((prefix, func)).or_insert_with(|| {
                stack_prefixes.push(prefix);
                stack_frames.push(func);
                stack_prefixes.len() - 1
            });
            prefix = Some(stack);
        }
        sample_stacks.push(prefix.expect("paths must be non-empty"));
        sample_times.push(i as f64);
    }

    let func_count = func_names.len();
    json!({
        "meta": {
            "interval": 1.0,
            "startTime": 0.0,
            "product": "Firefox",
            "categories": [
                { "name": "Layout", "color": "purple", "subcategories": ["Other"] },
                { "name": "Other", "color": "grey", "subcategories": ["Other"] },
            ],
        },
        "libs": [],
        "threads": [{
            "name": "GeckoMain",
            "pid": "3456",
            "tid": 7890,
            "isMainThread": true,
            "stringArray": strings,
            "resourceTable": { "length": 0, "lib": [], "name": [], "host": [], "type": [] },
            "funcTable": {
                "length": func_count,
                "name": func_names,
                "isJS": vec![true; func_count],
                "relevantForJS": vec![false; func_count],
                "resource": vec![-1i64; func_count],
                "fileName": vec![0usize; func_count],
                "lineNumber": (0..func_count).map(|i| i * 10).collect::<Vec<_>>(),
                "columnNumber": vec![Value::Null; func_count],
            },
            "nativeSymbols": { "length": 0, "libIndex": [], "address": [], "functionSize": [], "name": [] },
            "frameTable": {
                "length": func_count,
                "func": (0..func_count).collect::<Vec<_>>(),
                "category": vec![Value::Null; func_count],
                "subcategory": vec![Value::Null; func_count],
                "line": (0..func_count).map(|i| i * 10).collect::<Vec<_>>(),
                "column": vec![Value::Null; func_count],
                "address": vec![-1i64; func_count],
                "inlineDepth": vec![0u16; func_count],
            },
            "stackTable": {
                "length": stack_prefixes.len(),
                "prefix": stack_prefixes,
                "frame": stack_frames,
            },
            "samples": {
                "length": sample_stacks.len(),
                "stack": sample_stacks,
                "time": sample_times,
                "weightType": "samples",
            },
            "markers": { "length": 0, "name": [], "category": [], "phase": [], "startTime": [], "endTime": [], "data": [] },
        }],
    })
}

fn profile_from_paths(paths: &[&[&str]]) -> Profile {
    Profile::from_value(profile_json_from_paths(paths)).expect("profile should parse")
}

fn node_names(tree: &CallTree, thread: &fxprof_analysis::Thread) -> Vec<(String, f64, f64)> {
    let mut result = Vec::new();
    let mut stack: Vec<fxprof_analysis::CallNodeIndex> = tree.roots().to_vec();
    stack.reverse();
    while let Some(node) = stack.pop() {
        result.push((
            thread.func_name(tree.func(node)).to_string(),
            tree.total(node),
            tree.self_time(node),
        ));
        for &child in tree.children(node).iter().rev() {
            stack.push(child);
        }
    }
    result
}

#[test]
fn call_tree_from_text_fixture() {
    let profile = profile_from_paths(&[&["A", "B", "C"], &["A", "B", "C"], &["A", "B", "H", "I"]]);
    let thread = profile.thread(0).unwrap();
    let tree = CallTree::build(thread, profile.default_category(), false);

    assert_eq!(
        node_names(&tree, thread),
        vec![
            ("A".to_string(), 3.0, 0.0),
            ("B".to_string(), 3.0, 0.0),
            ("C".to_string(), 2.0, 2.0),
            ("H".to_string(), 1.0, 0.0),
            ("I".to_string(), 1.0, 1.0),
        ]
    );

    // Root totals equal the number of samples with stacks.
    let root_total: f64 = tree.roots().iter().map(|&r| tree.total(r)).sum();
    assert_eq!(root_total, 3.0);
}

#[test]
fn merge_function_collapses_b_out() {
    let profile = profile_from_paths(&[&["A", "B", "C", "D"]]);
    let thread = profile.thread(0).unwrap();
    let tree = CallTree::build(thread, profile.default_category(), false);
    let b = tree.func(tree.children(tree.roots()[0])[0]);

    let merged = apply_transform(thread, &Transform::MergeFunction { func: b });
    let merged_tree = CallTree::build(&merged, profile.default_category(), false);
    assert_eq!(
        node_names(&merged_tree, &merged),
        vec![
            ("A".to_string(), 1.0, 0.0),
            ("C".to_string(), 1.0, 0.0),
            ("D".to_string(), 1.0, 1.0),
        ]
    );
    assert_eq!(merged_tree.self_time_sum(), tree.self_time_sum());
}

#[test]
fn unmatched_marker_end_starts_at_profile_start() {
    let mut json = profile_json_from_paths(&[&["A"]]);
    json["threads"][0]["stringArray"]
        .as_array_mut()
        .unwrap()
        .push(json!("Rasterize"));
    let name_index = json["threads"][0]["stringArray"].as_array().unwrap().len() - 1;
    json["threads"][0]["markers"] = json!({
        "length": 1,
        "name": [name_index],
        "category": [0],
        "phase": [3],
        "startTime": [null],
        "endTime": [1.0],
        "data": [null],
    });

    let profile = Profile::from_value(json).unwrap();
    let thread = profile.thread(0).unwrap();
    let (profile_start, profile_end) = profile.time_range();
    let processor = MarkerProcessor::new();
    let markers = processor.derive_markers(
        thread.markers(),
        thread.string_table(),
        profile_start,
        profile_end,
    );

    assert_eq!(markers.len(), 1);
    let marker = &markers[0];
    assert_eq!(thread.string_table().get(marker.name), Some("Rasterize"));
    assert_eq!(marker.start, profile_start);
    assert_eq!(marker.end, Some(Timestamp::from_millis_since_reference(1.0)));
    assert!(marker.incomplete);
}

#[test]
fn invalidation_marker_names_are_parsed() {
    let processor = MarkerProcessor::new();
    let payload = processor
        .payload_from_name("Invalidate https://example.com/app.js:42")
        .unwrap();
    match payload {
        MarkerPayload::Invalidation(invalidation) => {
            assert_eq!(invalidation.url, "https://example.com/app.js");
            assert_eq!(invalidation.line, Some(42));
        }
        other => panic!("expected an invalidation payload, got {other:?}"),
    }
    // Non-matching names fall through without error.
    assert!(processor.payload_from_name("Rasterize").is_none());
}

#[test]
fn merged_profile_takes_the_minimum_interval() {
    let mut a = profile_json_from_paths(&[&["A"]]);
    a["meta"]["interval"] = json!(10.0);
    let mut b = profile_json_from_paths(&[&["A"]]);
    b["meta"]["interval"] = json!(20.0);

    let merged = merge_profiles(&[
        Profile::from_value(a).unwrap(),
        Profile::from_value(b).unwrap(),
    ])
    .unwrap();
    assert_eq!(merged.meta.interval, 10.0);

    // The comparison thread aligns the func tables but holds no data.
    let comparison = merged.threads().last().unwrap();
    assert_eq!(comparison.name(), "Comparison");
    assert!(comparison.samples().is_empty());
    assert_eq!(comparison.func_table().len(), 1);
}

#[test]
fn range_and_search_filters_compose() {
    let profile = profile_from_paths(&[&["A", "B"], &["A", "C"], &["A", "B"], &["D"]]);
    let thread = profile.thread(0).unwrap();

    // Range keeps samples at 1ms and 2ms, search then keeps only the B one.
    let ranged = filter_thread_to_range(
        thread,
        Timestamp::from_millis_since_reference(1.0),
        Timestamp::from_millis_since_reference(3.0),
    );
    let searched = filter_thread_to_search_string(&ranged, "B");
    assert_eq!(searched.samples().len(), 2);

    let tree = CallTree::build(&searched, profile.default_category(), false);
    assert_eq!(
        node_names(&tree, &searched),
        vec![("A".to_string(), 1.0, 0.0), ("B".to_string(), 1.0, 1.0)]
    );
}

#[test]
fn line_timings_dedupe_recursion_through_the_full_pipeline() {
    let profile = profile_from_paths(&[&["A", "B", "C", "B"]]);
    let thread = profile.thread(0).unwrap();
    let file = thread.string_table().lookup("app.js").unwrap();

    let info = get_stack_line_info(
        thread.stack_table(),
        thread.frame_table(),
        thread.func_table(),
        file,
        false,
    );
    let timings = get_line_timings(&info, thread.samples());

    // B's line is hit once per sample even though B is on the stack twice.
    let b_line = 10;
    assert_eq!(timings.total_line_hits.get(&b_line), Some(&1.0));
    assert_eq!(timings.self_line_hits.get(&b_line), Some(&1.0));
}

#[test]
fn querier_reports_top_functions() {
    let profile = profile_from_paths(&[&["A", "B"], &["A", "B"], &["A"], &["C"]]);
    let mut querier = ProfileQuerier::new(&profile, 0).unwrap();

    let response = querier.query("top-total 3").unwrap();
    let serialized = serde_json::to_value(&response).unwrap();
    assert_json_eq!(
        serialized,
        json!({
            "type": "topFunctionsByTotal",
            "functions": [
                { "name": "A", "total": 3.0, "self": 1.0 },
                { "name": "B", "total": 2.0, "self": 2.0 },
                { "name": "C", "total": 1.0, "self": 1.0 },
            ],
        })
    );

    // Narrow to the last sample only.
    querier.query("3,4").unwrap();
    let response = querier.query("top-self").unwrap();
    let QueryResponse::TopFunctionsBySelf { functions } = response else {
        panic!("expected a top-self response");
    };
    assert_eq!(functions.len(), 1);
    assert_eq!(functions[0].name, "C");
}

#[test]
fn serialized_thread_tables_keep_the_processed_shape() {
    let profile = profile_from_paths(&[&["A", "B"]]);
    let thread = profile.thread(0).unwrap();

    assert_json_eq!(
        serde_json::to_value(thread.stack_table()).unwrap(),
        json!({
            "length": 2,
            "prefix": [null, 0],
            "frame": [0, 1],
            "category": [1, 1],
            "subcategory": [0, 0],
        })
    );
    assert_json_eq!(
        serde_json::to_value(thread.samples()).unwrap(),
        json!({
            "length": 1,
            "stack": [1],
            "time": [0.0],
            "weight": [1.0],
            "weightType": "samples",
        })
    );
}

#[test]
fn short_native_allocation_columns_are_rejected() {
    let mut profile_json = profile_json_from_paths(&[&["A", "B"]]);
    profile_json["threads"][0]["nativeAllocations"] = json!({
        "length": 2,
        "time": [1.0, 2.0],
        "weight": [64, -64],
        "weightType": "bytes",
        "stack": [0, 0],
        "memoryAddress": [4096],
        "threadId": [7890, 7890],
    });

    let err = Profile::from_value(profile_json).unwrap_err();
    assert!(matches!(
        err,
        Error::ColumnLengthMismatch {
            table: "nativeAllocations",
            column: "memoryAddress",
            actual: 1,
            expected: 2,
        }
    ));
}
