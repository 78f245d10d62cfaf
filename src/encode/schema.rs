//! Tool schema -> interface-style declaration text.
//!
//! Each schema renders as a documented TypeScript-flavoured function:
//!
//! ```text
//! /**
//!  * Calculate the distance between two locations
//!  * @param origin - The starting location
//!  * @param mode - The mode of transportation
//!  * @enum mode - Possible values: "drive", "air"
//!  */
//! function calculate_distance(origin: string, mode?: string): any {}
//! ```

use crate::config::{DEFAULT_TOOL_PROMPT_TEMPLATE, TOOL_TEXT_PLACEHOLDER};
use crate::types::ToolSchema;
use serde_json::{Map, Value};

/// Render all tools into the default instruction block.
pub fn render_tool_block(tools: &[ToolSchema]) -> String {
    render_tool_block_with(tools, DEFAULT_TOOL_PROMPT_TEMPLATE)
}

/// Render all tools into `template`, replacing `{tool_text}`.
pub fn render_tool_block_with(tools: &[ToolSchema], template: &str) -> String {
    let declarations = tools
        .iter()
        .map(render_declaration)
        .collect::<Vec<_>>()
        .join("\n\n");
    template.replace(TOOL_TEXT_PLACEHOLDER, &declarations)
}

/// Doc lines and type for one parameter.
#[derive(Debug, Default)]
struct ParamType {
    ts_type: String,
    description: Option<String>,
    enum_values: Option<String>,
    integer: Option<String>,
    is_object: bool,
}

impl ParamType {
    fn doc_lines(&self) -> impl Iterator<Item = &String> {
        self.description
            .iter()
            .chain(self.enum_values.iter())
            .chain(self.integer.iter())
    }
}

/// Render one schema as a documented function declaration.
pub fn render_declaration(schema: &ToolSchema) -> String {
    let name = schema.name.as_str();
    let parameters = normalize_parameters(schema.parameters.as_ref());
    let required = required_names(&parameters);

    let mut args = Vec::new();
    let mut docs: Vec<String> = Vec::new();
    let mut interfaces = Vec::new();

    if let Some(Value::Object(properties)) = parameters.get("properties") {
        for (param_name, param_schema) in properties {
            let param = param_type(param_schema, param_name);
            let ts_type = if param.is_object {
                let interface_name = format!("{}_{}Params", name, capitalize(param_name));
                let (definition, nested_docs) = render_interface(param_schema, &interface_name);
                interfaces.push(definition);
                docs.extend(nested_docs);
                interface_name
            } else {
                docs.extend(param.doc_lines().cloned());
                param.ts_type
            };
            args.push(format!("{}{}: {}", param_name, optional_marker(&required, param_name), ts_type));
        }
    }

    let mut out = String::from("/**\n");
    if let Some(description) = schema.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!(" * {}\n", description));
    }
    for line in &docs {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(" */\n");
    if !interfaces.is_empty() {
        out.push_str(&interfaces.join("\n\n"));
        out.push_str("\n\n");
    }
    out.push_str(&format!("function {}({}): any {{}}", name, args.join(", ")));
    out
}

/// Parameters may arrive as a JSON-schema object or as a list of
/// `{name, ...}` entries; entries without a `default` are required.
fn normalize_parameters(parameters: Option<&Value>) -> Map<String, Value> {
    match parameters {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::Array(entries)) => {
            let mut properties = Map::new();
            let mut required = Vec::new();
            for entry in entries {
                let Some(param_name) = entry.get("name").and_then(Value::as_str) else {
                    tracing::debug!("skipping list parameter without a name: {}", entry);
                    continue;
                };
                properties.insert(param_name.to_string(), entry.clone());
                if entry.get("default").is_none() {
                    required.push(Value::String(param_name.to_string()));
                }
            }
            let mut map = Map::new();
            map.insert("properties".to_string(), Value::Object(properties));
            map.insert("required".to_string(), Value::Array(required));
            map
        }
        _ => Map::new(),
    }
}

fn required_names(schema: &Map<String, Value>) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn optional_marker(required: &[&str], name: &str) -> &'static str {
    if required.contains(&name) {
        ""
    } else {
        "?"
    }
}

fn param_type(schema: &Value, param_name: &str) -> ParamType {
    let mut param = ParamType {
        ts_type: "any".to_string(),
        ..Default::default()
    };
    let Value::Object(obj) = schema else {
        tracing::debug!("parameter '{}' has no object schema, typing as any", param_name);
        return param;
    };

    match obj.get("type") {
        Some(Value::String(json_type)) => {
            if json_type == "object" {
                param.is_object = true;
                param.ts_type = inline_object(obj);
                return param;
            }
            param.ts_type = scalar_or_array(json_type, obj);
            if json_type == "integer" {
                param.integer = Some(format!(" * @param {} - Integer", param_name));
            }
        }
        Some(Value::Array(types)) => {
            let names: Vec<String> = types
                .iter()
                .filter_map(Value::as_str)
                .map(|t| scalar_or_array(t, obj))
                .collect();
            if !names.is_empty() {
                param.ts_type = names.join(" | ");
            }
        }
        _ => {}
    }

    if let Some(Value::Array(values)) = obj.get("enum") {
        let listed: Vec<String> = values
            .iter()
            .map(|v| format!("\"{}\"", display_value(v)))
            .collect();
        param.enum_values = Some(format!(
            " * @enum {} - Possible values: {}",
            param_name,
            listed.join(", ")
        ));
        param.ts_type = "string".to_string();
    }
    if let Some(description) = obj.get("description") {
        param.description = Some(format!(" * @param {} - {}", param_name, display_value(description)));
    }
    param
}

fn scalar_or_array(json_type: &str, obj: &Map<String, Value>) -> String {
    match json_type {
        "array" => match obj.get("items") {
            Some(items) => format!("{}[]", nested_type(items)),
            None => "any[]".to_string(),
        },
        "number" | "integer" => "number".to_string(),
        "boolean" => "boolean".to_string(),
        "null" => "null".to_string(),
        "string" => "string".to_string(),
        "object" => inline_object(obj),
        _ => "any".to_string(),
    }
}

/// Type of an array item or interface property, without doc lines.
fn nested_type(schema: &Value) -> String {
    let param = param_type(schema, "");
    let ts_type = param.ts_type;
    // a union item type needs parentheses before `[]`
    if ts_type.contains(" | ") {
        format!("({})", ts_type)
    } else {
        ts_type
    }
}

fn inline_object(obj: &Map<String, Value>) -> String {
    let Some(Value::Object(properties)) = obj.get("properties") else {
        return "object".to_string();
    };
    if properties.is_empty() {
        return "object".to_string();
    }
    let required = required_names(obj);
    let fields: Vec<String> = properties
        .iter()
        .map(|(k, v)| format!("{}{}: {}", k, optional_marker(&required, k), nested_type(v)))
        .collect();
    format!("{{ {} }}", fields.join("; "))
}

/// Named interface for an object-typed top-level parameter, plus the doc
/// lines of its properties.
fn render_interface(schema: &Value, interface_name: &str) -> (String, Vec<String>) {
    let empty = Map::new();
    let obj = schema.as_object().unwrap_or(&empty);
    let required = required_names(obj);

    let mut body = Vec::new();
    let mut docs = Vec::new();
    if let Some(Value::Object(properties)) = obj.get("properties") {
        for (prop_name, prop_schema) in properties {
            let prop = param_type(prop_schema, prop_name);
            body.push(format!(
                "    {}{}: {};",
                prop_name,
                optional_marker(&required, prop_name),
                prop.ts_type
            ));
            docs.extend(prop.doc_lines().cloned());
        }
    }

    (
        format!("interface {} {{\n{}\n}}", interface_name, body.join("\n")),
        docs,
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First character upper-cased, the rest lower-cased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
