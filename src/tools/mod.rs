//! Built-in tools offered to callers that do not supply their own
//! execution loop. Tool failures degrade to caller-visible strings,
//! never to errors.

mod papers;

use chat_protocol::Tool;
use serde_json::Value;

pub use papers::{top_papers, top_papers_tool, DAILY_PAPERS_API};

/// Registry of tools the gateway itself can execute.
pub struct ToolRegistry {
    client: reqwest::Client,
}

impl ToolRegistry {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Tool definitions suitable for a request's `tools` array.
    pub fn definitions(&self) -> Vec<Tool> {
        vec![top_papers_tool()]
    }

    /// Execute a tool by name against a JSON argument object.
    ///
    /// Unknown names and malformed arguments return a plain string the
    /// orchestration loop can show the model.
    pub async fn execute(&self, name: &str, arguments: &Value) -> String {
        match name {
            "get_top_papers" => {
                let n = arguments.get("n").and_then(Value::as_u64).unwrap_or(5) as usize;
                let date = arguments
                    .get("date")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                top_papers(&self.client, n, date).await
            }
            other => format!("unknown tool: {other}"),
        }
    }
}
