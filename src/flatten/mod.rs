//! Conversation flattening: chat-completions messages in, a
//! prompt-ready message list plus an ordered image list out.
//!
//! Flattening performs three rewrites on the way through:
//! - a `system` message is replaced with the tool catalog when the
//!   request declares tools;
//! - the final `user` message gains a `<RESPONSE_FORMAT>` block when a
//!   response format is requested;
//! - `image_url` parts become bare image-slot markers and their
//!   references are resolved out-of-band, order preserved.
//!
//! The target model family cannot mix a system turn with image input,
//! so a leading system message is dropped whenever images are present.

mod prompts;

use std::sync::Arc;

use chat_protocol::{ChatMessage, ContentPart, MessageContent, ResponseFormat, Role, Tool};
use vision_media::{ImageTracker, MediaConnector, ResolvedImage};

pub use prompts::{response_format_block, tool_catalog_prompt};

#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    /// Every image reference in the request failed to resolve
    #[error("none of the {requested} image reference(s) could be resolved")]
    NoUsableImages { requested: usize },

    #[error("failed to render instruction block: {0}")]
    Render(#[from] serde_json::Error),
}

/// A flattened conversation ready for the generation runtime.
#[derive(Debug)]
pub struct FlattenedPrompt {
    pub messages: Vec<ChatMessage>,
    /// Resolved images in slot order
    pub images: Vec<ResolvedImage>,
}

/// Flatten a conversation, resolving image references concurrently.
pub async fn flatten_request(
    mut messages: Vec<ChatMessage>,
    tools: Option<&[Tool]>,
    response_format: Option<&ResponseFormat>,
    connector: Arc<MediaConnector>,
) -> Result<FlattenedPrompt, FlattenError> {
    let tools = tools.filter(|t| !t.is_empty());
    let mut tracker = ImageTracker::new(connector);

    let total = messages.len();
    for (index, message) in messages.iter_mut().enumerate() {
        if message.role == Role::System {
            if let Some(tools) = tools {
                message.content = MessageContent::Text(tool_catalog_prompt(tools)?);
            }
        }

        let last_user = index + 1 == total && message.role == Role::User;

        match &mut message.content {
            MessageContent::Text(text) => {
                if last_user {
                    if let Some(format) = response_format {
                        apply_response_format(text, format)?;
                    }
                }
            }
            MessageContent::Parts(parts) => {
                for part in parts.iter_mut() {
                    if let ContentPart::ImageUrl { image_url } = part {
                        tracker.push(&image_url.url);
                        *part = ContentPart::Image;
                    }
                }
                if last_user && !has_response_format_part(parts) {
                    if let Some(format) = response_format {
                        let block = response_format_block(format.schema())?;
                        parts.push(ContentPart::Text { text: block });
                    }
                }
            }
        }
    }

    let output = tracker.finalize().await;
    if output.all_failed() {
        return Err(FlattenError::NoUsableImages {
            requested: output.requested,
        });
    }

    // The runtime rejects a system turn alongside image input.
    if !output.images.is_empty() && messages.first().is_some_and(|m| m.role == Role::System) {
        messages.remove(0);
    }

    Ok(FlattenedPrompt {
        messages,
        images: output.images,
    })
}

fn apply_response_format(text: &mut String, format: &ResponseFormat) -> Result<(), FlattenError> {
    // Idempotent: retried requests must not stack instruction blocks.
    if text.trim_end().ends_with("</RESPONSE_FORMAT>") {
        return Ok(());
    }
    let block = response_format_block(format.schema())?;
    *text = prompts::append_response_format(text, &block);
    Ok(())
}

/// True when a parts list already carries an instruction block, so a
/// re-flattened message is not given a second one.
fn has_response_format_part(parts: &[ContentPart]) -> bool {
    parts.last().is_some_and(|part| {
        matches!(part, ContentPart::Text { text } if text.trim_end().ends_with("</RESPONSE_FORMAT>"))
    })
}
