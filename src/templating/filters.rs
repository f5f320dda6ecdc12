//! Custom Tera filters for fragment templates.
//!
//! All value quoting happens in [`starlark`], so templates never hand-build
//! string literals. JSON values map onto Starlark literals:
//!
//! | JSON | Starlark |
//! |---|---|
//! | string | `"..."` with `\\`, `"`, `\n`, `\r`, `\t` escaped |
//! | bool | `True` / `False` |
//! | null | `None` |
//! | array | `["a", "b"]` |
//! | object | `{"k": "v"}` |

use std::collections::HashMap;
use tera::Value;

/// Render any JSON value as a Starlark literal.
#[must_use]
pub fn to_starlark(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_starlark).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> =
                map.iter().map(|(k, v)| format!("{}: {}", quote(k), to_starlark(v))).collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Tera filter wrapping [`to_starlark`].
pub fn starlark(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_starlark(value)))
}
