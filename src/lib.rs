//! OpenAI-compatible serving layer for vision-language models.
//!
//! The gateway accepts chat-completions requests, flattens the
//! conversation into a prompt the generation runtime understands
//! (resolving image references along the way), forwards it to the
//! runtime, and reassembles the fragment stream into either incremental
//! text deltas or a single tool-call message.

pub mod config;
pub mod error;
pub mod flatten;
pub mod generation;
pub mod server;
pub mod streaming;
pub mod tools;

pub use config::ServerConfig;
pub use error::GatewayError;
pub use server::{build_router, AppState};
