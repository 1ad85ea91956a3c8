//! Single-JSON-object syntax: the entire text is one JSON object of the
//! form `{"type": "function", "name": NAME, "parameters": {...}}`.

use serde_json::{json, Value};

use super::SyntaxMatch;
use crate::prepare_tool_call;

/// Parse the whole-text JSON object syntax.
///
/// Lists, numbers, and strings that happen to be valid JSON are not
/// tool calls. The object qualifies when it declares
/// `"type": "function"` or carries a `name`; absent `parameters`
/// default to an empty argument object.
pub fn parse(text: &str) -> SyntaxMatch {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(text) else {
        return SyntaxMatch::NoMatch;
    };

    let is_function = object
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t == "function");
    if !is_function && !object.contains_key("name") {
        return SyntaxMatch::NoMatch;
    }

    let Some(name) = object.get("name").and_then(Value::as_str) else {
        return SyntaxMatch::NoMatch;
    };

    let parameters = object.get("parameters").cloned().unwrap_or_else(|| json!({}));
    SyntaxMatch::Calls(vec![prepare_tool_call(name, parameters)])
}
