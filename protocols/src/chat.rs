//! Chat Completions API types (v1/chat/completions).

use rand::{distr::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};

use super::common::{ResponseFormat, Tool, ToolCall, ToolChoice, Usage};

// ============================================================================
// Request Types
// ============================================================================

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// ID of the model to use
    pub model: String,

    /// Ordered conversation history
    pub messages: Vec<ChatMessage>,

    /// What sampling temperature to use
    pub temperature: Option<f32>,

    /// An alternative to sampling with temperature (nucleus sampling)
    pub top_p: Option<f32>,

    /// The maximum number of tokens to generate
    pub max_tokens: Option<u32>,

    /// Whether to stream back partial progress
    #[serde(default)]
    pub stream: bool,

    /// Tools the model may invoke
    pub tools: Option<Vec<Tool>>,

    /// How the model should choose among tools
    pub tool_choice: Option<ToolChoice>,

    /// Structured-output mode
    pub response_format: Option<ResponseFormat>,

    /// A unique identifier representing your end-user
    pub user: Option<String>,
}

impl ChatCompletionRequest {
    pub fn is_stream(&self) -> bool {
        self.stream
    }

    /// True when the request declared at least one tool.
    pub fn has_tools(&self) -> bool {
        self.tools.as_ref().is_some_and(|t| !t.is_empty())
    }
}

/// A single message in the conversation. Immutable once received.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,

    /// Omitted or explicitly `null` content decodes as empty text, as
    /// sent by clients replaying an assistant tool-call turn.
    #[serde(default, deserialize_with = "content_or_default")]
    pub content: MessageContent,

    pub name: Option<String>,

    /// Tool invocations attached to an assistant message
    pub tool_calls: Option<Vec<ToolCall>>,

    /// For `tool` role messages, the id of the call being answered
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    /// Plain assistant message with string content.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant message carrying tool calls and empty content.
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(String::new()),
            name: None,
            tool_calls: Some(tool_calls),
            tool_call_id: None,
        }
    }
}

fn content_or_default<'de, D>(deserializer: D) -> Result<MessageContent, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<MessageContent>::deserialize(deserializer)?.unwrap_or_default())
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: a plain string or an ordered list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

/// One element of multi-part message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    /// Image slot marker with no inline payload; the image bytes travel
    /// out-of-band, matched positionally during template expansion.
    Image,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// http(s) URL, `data:image/...;base64,` URL, or local path
    pub url: String,

    pub detail: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String, // "chat.completion"
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    pub fn single(model: &str, message: ChatMessage, finish_reason: &str) -> Self {
        Self {
            id: generate_completion_id(),
            object: "chat.completion".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message,
                finish_reason: Some(finish_reason.to_string()),
            }],
            usage: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: Option<String>, // "stop", "length", "tool_calls"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionStreamResponse {
    pub id: String,
    pub object: String, // "chat.completion.chunk"
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatStreamChoice>,
}

impl ChatCompletionStreamResponse {
    pub fn delta(id: &str, model: &str, delta: ChatMessageDelta) -> Self {
        Self {
            id: id.to_string(),
            object: "chat.completion.chunk".to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.to_string(),
            choices: vec![ChatStreamChoice {
                index: 0,
                delta,
                finish_reason: None,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChoice {
    pub index: u32,
    pub delta: ChatMessageDelta,
    pub finish_reason: Option<String>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMessageDelta {
    pub role: Option<Role>,
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatMessageDelta {
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            role: Some(Role::Assistant),
            content: Some(text.into()),
            tool_calls: None,
        }
    }
}

/// `chatcmpl-` + 24 alphanumerics, mirroring upstream id shape.
pub fn generate_completion_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("chatcmpl-{suffix}")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn message_content_accepts_plain_string() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": "Hello"
        }))
        .unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, MessageContent::Text("Hello".to_string()));
    }

    #[test]
    fn message_content_accepts_part_list() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "What is this?"},
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.jpg"}}
            ]
        }))
        .unwrap();
        let MessageContent::Parts(parts) = msg.content else {
            panic!("expected parts content");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[1], ContentPart::ImageUrl { .. }));
    }

    #[test]
    fn null_content_decodes_as_empty_text() {
        let msg: ChatMessage = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_abc123",
                "type": "function",
                "function": {"name": "top_papers", "arguments": "{\"n\": 3}"}
            }]
        }))
        .unwrap();
        assert_eq!(msg.content, MessageContent::Text(String::new()));
        assert_eq!(msg.tool_calls.unwrap().len(), 1);
    }

    #[test]
    fn image_slot_serializes_as_bare_type() {
        let part = ContentPart::Image;
        assert_eq!(serde_json::to_value(&part).unwrap(), json!({"type": "image"}));
    }

    #[test]
    fn request_parses_openai_shape() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "model": "llama-3.2-11b-vision-instruct",
            "messages": [
                {"role": "system", "content": "You are helpful"},
                {"role": "user", "content": "Hi"}
            ],
            "temperature": 0.2,
            "stream": true,
            "tools": [
                {"type": "function", "function": {"name": "top_papers", "parameters": {}}}
            ]
        }))
        .unwrap();
        assert!(req.is_stream());
        assert!(req.has_tools());
        assert_eq!(req.messages.len(), 2);
    }

    #[test]
    fn empty_tool_list_counts_as_no_tools() {
        let req: ChatCompletionRequest = serde_json::from_value(json!({
            "model": "m",
            "messages": [{"role": "user", "content": "x"}],
            "tools": []
        }))
        .unwrap();
        assert!(!req.has_tools());
    }

    #[test]
    fn completion_id_shape() {
        let id = generate_completion_id();
        assert!(id.starts_with("chatcmpl-"));
        assert_eq!(id.len(), "chatcmpl-".len() + 24);
    }

    #[test]
    fn tool_call_message_round_trips() {
        let msg = ChatMessage::assistant_tool_calls(vec![crate::common::ToolCall {
            id: "call_abc123".to_string(),
            call_type: "function".to_string(),
            function: crate::common::FunctionCall {
                name: "top_papers".to_string(),
                arguments: "{\"n\": 3}".to_string(),
            },
        }]);
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["tool_calls"][0]["function"]["name"], "top_papers");
        let back: ChatMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back.tool_calls.unwrap().len(), 1);
    }
}
