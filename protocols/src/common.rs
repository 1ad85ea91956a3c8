//! Types shared across the request and response sides of the API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Tool Definitions
// ============================================================================

/// A tool the model may invoke.
///
/// Tools are supplied by the caller and only ever used to synthesize the
/// tool-catalog instruction block; the gateway never executes them itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool type, currently always "function"
    #[serde(rename = "type", default = "default_function_type")]
    pub tool_type: String,

    pub function: Function,
}

/// Function declaration carried by a [`Tool`].
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: String,

    pub description: Option<String>,

    /// JSON-schema-typed parameter object
    #[serde(default = "default_parameters")]
    pub parameters: Value,

    pub strict: Option<bool>,
}

fn default_function_type() -> String {
    "function".to_string()
}

fn default_parameters() -> Value {
    Value::Object(serde_json::Map::new())
}

/// How the model should use the provided tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolChoice {
    /// "auto", "none", or "required"
    Mode(String),
    /// Force a specific function
    Named {
        #[serde(rename = "type")]
        choice_type: String,
        function: FunctionName,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionName {
    pub name: String,
}

// ============================================================================
// Response Format
// ============================================================================

/// Desired output shape for structured-output mode.
///
/// Either `{"type": "json_object"}` or
/// `{"type": "json_schema", "json_schema": {...}}`. The schema is only
/// ever echoed into an instruction block; model output is never
/// validated against it.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,

    pub json_schema: Option<Value>,
}

impl ResponseFormat {
    /// The schema payload, if this is a `json_schema` format.
    pub fn schema(&self) -> Option<&Value> {
        self.json_schema.as_ref()
    }

    /// True when the declared type requires a schema payload.
    pub fn requires_schema(&self) -> bool {
        self.format_type == "json_schema"
    }
}

// ============================================================================
// Tool Calls (response side)
// ============================================================================

/// A normalized tool invocation reconstructed from model output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Generated identifier, `call_` + 6 alphanumerics
    pub id: String,

    #[serde(rename = "type", default = "default_function_type")]
    pub call_type: String,

    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,

    /// JSON-encoded argument object
    pub arguments: String,
}

// ============================================================================
// Usage
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn tool_deserializes_without_type() {
        let tool: Tool = serde_json::from_value(json!({
            "function": {"name": "search", "parameters": {"type": "object"}}
        }))
        .unwrap();
        assert_eq!(tool.tool_type, "function");
        assert_eq!(tool.function.name, "search");
    }

    #[test]
    fn function_parameters_default_to_empty_object() {
        let f: Function = serde_json::from_value(json!({"name": "ping"})).unwrap();
        assert_eq!(f.parameters, json!({}));
    }

    #[test]
    fn response_format_json_object() {
        let rf: ResponseFormat = serde_json::from_value(json!({"type": "json_object"})).unwrap();
        assert!(!rf.requires_schema());
        assert!(rf.schema().is_none());
    }

    #[test]
    fn response_format_json_schema() {
        let rf: ResponseFormat = serde_json::from_value(json!({
            "type": "json_schema",
            "json_schema": {"name": "answer", "schema": {"type": "object"}}
        }))
        .unwrap();
        assert!(rf.requires_schema());
        assert!(rf.schema().is_some());
    }

    #[test]
    fn tool_choice_accepts_mode_and_named() {
        let auto: ToolChoice = serde_json::from_value(json!("auto")).unwrap();
        assert!(matches!(auto, ToolChoice::Mode(m) if m == "auto"));

        let named: ToolChoice = serde_json::from_value(json!({
            "type": "function",
            "function": {"name": "get_weather"}
        }))
        .unwrap();
        assert!(matches!(named, ToolChoice::Named { .. }));
    }
}
