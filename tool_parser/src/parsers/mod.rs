//! Variant parsers for the three tool-call surface syntaxes.
//!
//! Each parser is a pure function over the full generated text,
//! returning a [`SyntaxMatch`] rather than throwing; no shared mutable
//! parser state exists.

pub mod call_list;
pub mod json_object;
pub mod tagged;

use chat_protocol::ToolCall;

/// Outcome of trying one surface syntax against the text.
#[derive(Debug)]
pub enum SyntaxMatch {
    /// The syntax matched and produced normalized calls.
    Calls(Vec<ToolCall>),
    /// The syntax matched structurally but its payload was unparseable;
    /// extraction stops without trying lower-precedence syntaxes.
    Malformed,
    /// The text is not in this syntax at all.
    NoMatch,
}
