//! Reassembly of the generation runtime's fragment stream.
//!
//! The assembler starts in a buffering state and commits to one of two
//! modes for the rest of the turn:
//!
//! - **tool mode** when the request declared tools and the buffered
//!   output starts with `{`, `[`, or `<function` — fragments accumulate
//!   silently and the full buffer is parsed once at stream end, because
//!   syntax detection on a partial buffer is unreliable;
//! - **text mode** otherwise — every fragment is emitted immediately as
//!   an incremental content delta, with the end-of-sequence marker
//!   stripped.

use chat_protocol::ChatMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::generation::GENERATION_ERROR_MARKER;

/// One output event of the assembled response stream.
#[derive(Debug)]
pub enum ResponseEvent {
    /// Incremental assistant text
    Delta(String),
    /// The single structured message of a tool-call turn
    ToolMessage(ChatMessage),
}

enum State {
    Buffering,
    ToolMode,
    TextMode,
}

pub struct StreamAssembler {
    tools_declared: bool,
    eos_marker: String,
}

impl StreamAssembler {
    pub fn new(tools_declared: bool, eos_marker: impl Into<String>) -> Self {
        Self {
            tools_declared,
            eos_marker: eos_marker.into(),
        }
    }

    /// Consume `fragments` until the stream ends or `cancel` fires,
    /// pushing [`ResponseEvent`]s to `events`.
    pub async fn run(
        self,
        mut fragments: mpsc::Receiver<String>,
        events: mpsc::Sender<ResponseEvent>,
        cancel: CancellationToken,
    ) {
        let mut state = State::Buffering;
        let mut buffer = String::new();
        let mut held: Vec<String> = Vec::new();

        loop {
            let fragment = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Caller went away; stopping fragment consumption");
                    return;
                }
                fragment = fragments.recv() => fragment,
            };

            let Some(fragment) = fragment else {
                break;
            };
            debug!(fragment = %fragment, "Received fragment");
            buffer.push_str(&fragment);

            match state {
                State::Buffering => {
                    held.push(fragment);
                    let head = buffer.trim();

                    if self.tools_declared && tool_call_trigger(head) {
                        state = State::ToolMode;
                    } else if self.tools_declared && could_become_trigger(head) {
                        // Not enough output yet to rule a tag out.
                    } else {
                        state = State::TextMode;
                        for piece in held.drain(..) {
                            if !self.emit_text(&events, piece).await {
                                return;
                            }
                        }
                    }
                }
                State::ToolMode => {
                    // Accumulate silently; nothing to emit until stream end.
                }
                State::TextMode => {
                    if !self.emit_text(&events, fragment).await {
                        return;
                    }
                }
            }
        }

        match state {
            State::ToolMode => {
                let combined = buffer.trim().to_string();
                if combined.contains(GENERATION_ERROR_MARKER) {
                    // Truncated by a worker failure; never reconstruct
                    // calls from partial output.
                    self.emit_text(&events, combined).await;
                    return;
                }
                match tool_parser::extract_tool_calls(&combined) {
                    Some(calls) => {
                        let message = ChatMessage::assistant_tool_calls(calls);
                        let _ = events.send(ResponseEvent::ToolMessage(message)).await;
                    }
                    None => {
                        // Looked like a call but was not one; degrade to text.
                        self.emit_text(&events, combined).await;
                    }
                }
            }
            State::Buffering => {
                for piece in held.drain(..) {
                    if !self.emit_text(&events, piece).await {
                        return;
                    }
                }
            }
            State::TextMode => {}
        }
    }

    async fn emit_text(&self, events: &mpsc::Sender<ResponseEvent>, fragment: String) -> bool {
        let fragment = if fragment.contains(&self.eos_marker) {
            fragment.replace(&self.eos_marker, "")
        } else {
            fragment
        };
        events.send(ResponseEvent::Delta(fragment)).await.is_ok()
    }
}

/// True when the buffered head commits the turn to tool mode.
fn tool_call_trigger(head: &str) -> bool {
    head.starts_with('{') || head.starts_with('[') || head.starts_with("<function")
}

/// True while the buffered head could still grow into `<function`.
fn could_become_trigger(head: &str) -> bool {
    head.is_empty() || ("<function".starts_with(head) && head.len() < "<function".len())
}
