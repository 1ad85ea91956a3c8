//! Generation runtime contract and the HTTP worker client.
//!
//! The gateway does not run the model itself; it forwards flattened
//! prompts to a worker process and consumes its fragment stream. The
//! [`GenerationRuntime`] trait is the seam that lets tests substitute a
//! scripted stream.

use std::time::Duration;

use async_trait::async_trait;
use chat_protocol::ChatCompletionRequest;
use futures::StreamExt;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::flatten::FlattenedPrompt;

/// Marker emitted into the text stream when the worker fails mid-turn.
/// No partial tool-call reconstruction is attempted after it.
pub const GENERATION_ERROR_MARKER: &str = "\n[generation interrupted]";

const FRAGMENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation worker unavailable: {0}")]
    WorkerUnavailable(String),

    #[error("generation worker returned status {0}")]
    WorkerStatus(reqwest::StatusCode),

    #[error("failed to encode image payload: {0}")]
    ImageEncode(#[from] vision_media::MediaError),
}

/// Sampling parameters forwarded to the worker.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub top_p: f32,
    pub max_new_tokens: u32,
}

impl GenerationParams {
    pub fn from_request(request: &ChatCompletionRequest) -> Self {
        Self {
            temperature: request.temperature.unwrap_or(0.7),
            top_p: request.top_p.unwrap_or(0.9),
            max_new_tokens: request.max_tokens.unwrap_or(2048),
        }
    }
}

/// Produces the raw fragment stream for a flattened prompt.
#[async_trait]
pub trait GenerationRuntime: Send + Sync {
    async fn generate(
        &self,
        prompt: &FlattenedPrompt,
        params: &GenerationParams,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<String>, GenerationError>;
}

/// Streams fragments from an HTTP worker's `/generate` endpoint.
pub struct HttpWorkerRuntime {
    client: reqwest::Client,
    worker_url: String,
    request_timeout: Duration,
}

impl HttpWorkerRuntime {
    pub fn new(client: reqwest::Client, worker_url: String, request_timeout: Duration) -> Self {
        Self {
            client,
            worker_url,
            request_timeout,
        }
    }
}

#[async_trait]
impl GenerationRuntime for HttpWorkerRuntime {
    async fn generate(
        &self,
        prompt: &FlattenedPrompt,
        params: &GenerationParams,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<String>, GenerationError> {
        let images = prompt
            .images
            .iter()
            .map(|image| image.to_png_data_url())
            .collect::<Result<Vec<_>, _>>()?;

        let payload = json!({
            "messages": prompt.messages,
            "images": images,
            "temperature": params.temperature,
            "top_p": params.top_p,
            "max_new_tokens": params.max_new_tokens,
        });

        let response = self
            .client
            .post(&self.worker_url)
            .timeout(self.request_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|err| GenerationError::WorkerUnavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::WorkerStatus(status));
        }

        let (tx, rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            loop {
                let chunk = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Generation cancelled; dropping worker stream");
                        break;
                    }
                    chunk = body.next() => chunk,
                };

                match chunk {
                    Some(Ok(bytes)) => {
                        let fragment = String::from_utf8_lossy(&bytes).into_owned();
                        if tx.send(fragment).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "Worker stream failed mid-generation");
                        let _ = tx.send(GENERATION_ERROR_MARKER.to_string()).await;
                        break;
                    }
                    None => break,
                }
            }
        });

        Ok(rx)
    }
}
