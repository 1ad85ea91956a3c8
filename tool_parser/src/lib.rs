//! Tool/function call extraction from model output.
//!
//! Vision-language models emit tool invocations in one of three
//! incompatible surface syntaxes:
//!
//! ```text
//! <function=example>{"name": "value"}</function>
//! {"type": "function", "name": "example", "parameters": {"name": "value"}}
//! [example(name='value'), other(n=3)]
//! ```
//!
//! [`extract_tool_calls`] tries the syntaxes in that fixed precedence
//! order and normalizes the first match into [`ToolCall`] records. Text
//! matching none of them is plain assistant content, never an error.

pub mod call_id;
pub mod parsers;

pub use call_id::generate_call_id;
use chat_protocol::ToolCall;
use parsers::SyntaxMatch;

/// Detect and normalize tool invocations in generated text.
///
/// Returns `None` when the text does not encode a tool call in any of
/// the supported syntaxes, or when a matched syntax carries arguments
/// that cannot be parsed (the syntaxes are mutually exclusive, so a
/// malformed match never falls through to the next parser).
pub fn extract_tool_calls(text: &str) -> Option<Vec<ToolCall>> {
    let attempts = [
        parsers::tagged::parse,
        parsers::json_object::parse,
        parsers::call_list::parse,
    ];

    for attempt in attempts {
        match attempt(text) {
            SyntaxMatch::Calls(calls) => return Some(calls),
            SyntaxMatch::Malformed => return None,
            SyntaxMatch::NoMatch => {}
        }
    }
    None
}

/// Build a normalized [`ToolCall`] with a freshly generated id.
pub(crate) fn prepare_tool_call(name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: generate_call_id(),
        call_type: "function".to_string(),
        function: chat_protocol::FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}
