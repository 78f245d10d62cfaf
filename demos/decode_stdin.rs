//! Decode a model completion read from stdin and print the tool calls.
//!
//! Diagnostics are logged through `tracing`; set `RUST_LOG=toolcall_bridge=debug`
//! to also see dialect detection. A codec configuration file can be given
//! with `TOOLCALL_BRIDGE_CONFIG`.
//!
//! Run:
//!   echo '<functions>{"name": "f", "arguments": {"a": 1}}' | cargo run --example decode_stdin

use std::io::Read;
use toolcall_bridge::ToolCallCodec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let codec = ToolCallCodec::from_env()?;

    let mut raw = String::new();
    std::io::stdin().read_to_string(&mut raw)?;

    let outcome = codec.decode_with_diagnostics(&raw);
    match outcome.dialect {
        Some(dialect) => eprintln!(
            "{} block: {} call(s), {} skipped",
            dialect,
            outcome.records.len(),
            outcome.diagnostics.len()
        ),
        None => eprintln!("no tool calls; plain reply"),
    }
    println!("{}", serde_json::to_string_pretty(&outcome.records)?);
    Ok(())
}
