//! Recovery of malformed model output and partial-failure reporting

use serde_json::{json, Value};
use toolcall_bridge::decode::{NoRepair, SequentialIds, ToolCallDecoder};
use toolcall_bridge::{DecodeDiagnostic, Dialect};

// RUST_LOG=toolcall_bridge=debug shows the skipped fragments
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn decoder() -> ToolCallDecoder {
    init_tracing();
    ToolCallDecoder::builder()
        .id_generator(SequentialIds::new())
        .build()
        .unwrap()
}

fn args(raw: &str) -> Vec<Value> {
    decoder()
        .decode(raw)
        .iter()
        .map(|r| serde_json::from_str(&r.function.arguments).unwrap())
        .collect()
}

#[test]
fn test_python_style_fragment() {
    assert_eq!(
        args("starttoolcall{'name': 'toggle', 'arguments': {'on': True, 'room': None}}endtoolcall"),
        vec![json!({"on": true, "room": null})]
    );
}

#[test]
fn test_trailing_commas_in_array_block() {
    assert_eq!(
        args(r#"<<functions>>[{"name": "a", "arguments": {"x": 1,},},]"#),
        vec![json!({"x": 1})]
    );
}

#[test]
fn test_truncated_completion() {
    let records = decoder().decode(
        r#"<<functions>>[{"name": "a", "arguments": {"x": 1}}, {"name": "b", "arguments": {"y": "#,
    );
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].function.name, "b");
    assert_eq!(records[1].function.arguments, r#"{"y":null}"#);
}

#[test]
fn test_malformed_string_arguments_are_repaired() {
    let records = decoder().decode(r#"<functions>{"name": "f", "arguments": "{'city': 'Paris',}"}"#);
    assert_eq!(records[0].function.arguments, r#"{"city":"Paris"}"#);
}

#[test]
fn test_wrapper_quotes_and_stray_escapes_in_values() {
    assert_eq!(
        args(r#"<functions>{"name": "f", "arguments": {"q": "\"hello\"", "place": "San\\ Francisco"}}"#),
        vec![json!({"q": "hello", "place": "San Francisco"})]
    );
}

#[test]
fn test_unescaped_newline_inside_value() {
    assert_eq!(
        args("starttoolcall{\"name\": \"note\", \"arguments\": {\"text\": \"first\nsecond\"}}endtoolcall"),
        vec![json!({"text": "first\nsecond"})]
    );
}

#[test]
fn test_bad_fragment_does_not_sink_siblings() {
    let raw = "<functions>{\"name\": \"a\", \"arguments\": {}}\n{\"arguments\": {\"x\": 1}}\n{\"name\": \"c\", \"arguments\": {}}";
    let outcome = decoder().decode_with_diagnostics(raw);

    let names: Vec<&str> = outcome.records.iter().map(|r| r.function.name.as_str()).collect();
    assert_eq!(names, vec!["a", "c"]);
    assert_eq!(outcome.diagnostics.len(), 1);
    match &outcome.diagnostics[0] {
        DecodeDiagnostic::FragmentUnrecoverable { index, reason, .. } => {
            assert_eq!(*index, 1);
            assert!(reason.contains("name"), "unexpected reason: {reason}");
        }
        other => panic!("unexpected diagnostic: {other:?}"),
    }
}

#[test]
fn test_name_without_arguments_is_skipped() {
    let outcome = decoder().decode_with_diagnostics(r#"<<functions>>[{"name": "a"}, {"name": "b", "arguments": {}}]"#);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].function.name, "b");
    assert!(matches!(
        outcome.diagnostics.as_slice(),
        [DecodeDiagnostic::FragmentUnrecoverable { index: 0, .. }]
    ));
}

#[test]
fn test_prose_line_inside_jsonl_block_is_ignored() {
    let outcome = decoder().decode_with_diagnostics("<functions>{\"name\": \"a\", \"arguments\": {}}\nI hope this helps!");
    assert_eq!(outcome.records.len(), 1);
    assert!(outcome.diagnostics.is_empty());
}

#[test]
fn test_strict_mode_reports_unreadable_block() {
    let strict = ToolCallDecoder::builder()
        .repair(NoRepair)
        .id_generator(SequentialIds::new())
        .build()
        .unwrap();

    let outcome = strict.decode_with_diagnostics(r#"<<functions>>[{"name": "a", "arguments": {},}]"#);
    assert!(outcome.has_tool_block());
    assert!(outcome.records.is_empty());
    assert!(matches!(
        outcome.diagnostics.as_slice(),
        [DecodeDiagnostic::BlockUnrecoverable {
            dialect: Dialect::BracketedArray,
            ..
        }]
    ));

    // the default decoder salvages the same block
    assert_eq!(decoder().decode(r#"<<functions>>[{"name": "a", "arguments": {},}]"#).len(), 1);
}

#[test]
fn test_garbage_after_sentinel_never_panics() {
    let decoder = decoder();
    for raw in [
        "<<functions>>",
        "<<functions>>not json",
        "<functions>",
        "<functions>}}}]]]",
        "starttoolcallendtoolcall",
        "starttoolcall\"\"endtoolcall",
        "<<functions>>[[[[[[[[[[",
        "<functions>{\"name\": 42, \"arguments\": {}}",
    ] {
        let outcome = decoder.decode_with_diagnostics(raw);
        assert!(outcome.records.is_empty(), "unexpected records for {raw:?}");
        assert!(outcome.has_tool_block());
    }
}
