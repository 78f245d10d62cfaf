//! Configuration loading from YAML / JSON files and the environment

use std::path::PathBuf;
use toolcall_bridge::{CodecConfig, Error, PairedSentinel, ToolCallCodec};

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("toolcall-bridge-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_yaml_file() {
    let path = write_temp(
        "codec.yaml",
        r#"
decoder:
  array_sentinels: []
  line_sentinels: ["[TOOL_CALLS]"]
  paired_sentinels:
    - start: "<tool_call>"
      end: "</tool_call>"
  arguments_keys: ["arguments", "args"]
  id_length: 12
encoder:
  call_sentinel: "[TOOL_CALLS]"
  ensure_ascii: false
"#,
    );
    let config = CodecConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(config.decoder.array_sentinels.is_empty());
    assert_eq!(config.decoder.id_length, 12);
    assert_eq!(
        config.decoder.paired_sentinels,
        vec![PairedSentinel::new("<tool_call>", "</tool_call>")]
    );
    assert_eq!(config.encoder.call_sentinel, "[TOOL_CALLS]");
    assert_eq!(config.encoder.observation_sentinel, "<<observation>>");
    assert!(!config.encoder.ensure_ascii);

    let codec = ToolCallCodec::from_config(&config).unwrap();
    let records = codec.decode(r#"[TOOL_CALLS]{"name": "f", "args": {"a": 1}}"#);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.len(), 12);
    assert_eq!(records[0].function.arguments, r#"{"a":1}"#);
    assert!(codec.decode(r#"<<functions>>[{"name": "f", "arguments": {}}]"#).is_empty());
}

#[test]
fn test_json_file() {
    let path = write_temp(
        "codec.json",
        r#"{"decoder": {"name_keys": ["name", "function"]}, "encoder": {"observation_sentinel": "<obs>"}}"#,
    );
    let config = CodecConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.decoder.name_keys, vec!["name", "function"]);
    assert_eq!(config.encoder.observation_sentinel, "<obs>");

    let codec = ToolCallCodec::from_config(&config).unwrap();
    let records = codec.decode(r#"<functions>{"function": "lookup", "arguments": {}}"#);
    assert_eq!(records[0].function.name, "lookup");
}

#[test]
fn test_unknown_extension_is_rejected() {
    let path = write_temp("codec.toml", "decoder = {}");
    let err = CodecConfig::from_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();

    assert!(matches!(err, Error::Configuration { .. }));
    assert!(err.to_string().contains("unsupported configuration file format"));
}

#[test]
fn test_invalid_values_are_rejected_on_load() {
    let err = CodecConfig::from_yaml_str("decoder:\n  line_sentinels: [\"\"]\n").unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(
        err.context().and_then(|c| c.field_path.as_deref()),
        Some("decoder.line_sentinels[0]")
    );

    let err = CodecConfig::from_json_str(r#"{"decoder": {"id_length": 64}}"#).unwrap_err();
    assert!(err.to_string().contains("decoder.id_length"));

    assert!(matches!(
        CodecConfig::from_yaml_str("decoder: [1, 2").unwrap_err(),
        Error::Yaml(_)
    ));
    assert!(matches!(
        CodecConfig::from_json_str("{").unwrap_err(),
        Error::Serialization(_)
    ));
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        CodecConfig::from_file("/definitely/not/here.yaml").unwrap_err(),
        Error::Io(_)
    ));
}

#[test]
fn test_from_env() {
    let path = write_temp("env.yml", "encoder:\n  default_system_prompt: \"From env.\"\n");
    std::env::set_var(CodecConfig::ENV_VAR, &path);
    let loaded = CodecConfig::from_env();
    std::env::remove_var(CodecConfig::ENV_VAR);
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.unwrap().encoder.default_system_prompt, "From env.");
    assert_eq!(CodecConfig::from_env().unwrap(), CodecConfig::default());
}
