//! OpenAI-compatible chat-completions protocol definitions.
//!
//! Request and response types for the `/v1/chat/completions` surface,
//! including multi-part (text + image) message content, tool
//! definitions, and structured-output response formats.

pub mod chat;
pub mod common;

pub use chat::{
    generate_completion_id, ChatCompletionRequest, ChatCompletionResponse,
    ChatCompletionStreamResponse, ChatMessage, ChatMessageDelta, ChatStreamChoice, Choice,
    ContentPart, ImageUrl, MessageContent, Role,
};
pub use common::{
    Function, FunctionCall, ResponseFormat, Tool, ToolCall, ToolChoice, Usage,
};
