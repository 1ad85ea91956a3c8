//! HTTP surface: the chat-completions endpoint plus built-in tool
//! discovery and execution.

use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use chat_protocol::{
    generate_completion_id, ChatCompletionRequest, ChatCompletionResponse,
    ChatCompletionStreamResponse, ChatMessage, ChatMessageDelta, MessageContent, Role,
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::info;
use vision_media::MediaConnector;

use crate::{
    config::ServerConfig,
    error::GatewayError,
    flatten::flatten_request,
    generation::{GenerationParams, GenerationRuntime},
    streaming::{ResponseEvent, StreamAssembler},
    tools::ToolRegistry,
};

pub struct AppState {
    pub config: ServerConfig,
    pub connector: Arc<MediaConnector>,
    pub runtime: Arc<dyn GenerationRuntime>,
    pub tools: ToolRegistry,
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/tools", get(list_tools))
        .route("/v1/tools/call", post(call_tool))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({"tools": state.tools.definitions()}))
}

#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    name: String,
    #[serde(default)]
    arguments: Value,
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToolCallRequest>,
) -> Json<Value> {
    let result = state.tools.execute(&request.name, &request.arguments).await;
    Json(json!({"result": result}))
}

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Response, GatewayError> {
    validate(&request)?;

    let mut messages = request.messages.clone();
    if let Some(system_prompt) = &state.config.system_prompt {
        if !messages.iter().any(|m| m.role == Role::System) {
            messages.insert(
                0,
                ChatMessage {
                    role: Role::System,
                    content: MessageContent::Text(system_prompt.clone()),
                    name: None,
                    tool_calls: None,
                    tool_call_id: None,
                },
            );
        }
    }

    let prompt = flatten_request(
        messages,
        request.tools.as_deref(),
        request.response_format.as_ref(),
        Arc::clone(&state.connector),
    )
    .await?;
    info!(
        messages = prompt.messages.len(),
        images = prompt.images.len(),
        stream = request.is_stream(),
        "Dispatching generation"
    );

    let params = GenerationParams::from_request(&request);
    let cancel = CancellationToken::new();
    let fragments = state
        .runtime
        .generate(&prompt, &params, cancel.clone())
        .await?;

    let assembler = StreamAssembler::new(request.has_tools(), state.config.eos_marker.clone());
    let (event_tx, event_rx) = mpsc::channel(64);
    tokio::spawn(assembler.run(fragments, event_tx, cancel.clone()));

    if request.is_stream() {
        Ok(stream_response(&state.config.model_id, event_rx, cancel).into_response())
    } else {
        Ok(collect_response(&state.config.model_id, event_rx)
            .await
            .into_response())
    }
}

fn validate(request: &ChatCompletionRequest) -> Result<(), GatewayError> {
    if request.messages.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "messages must not be empty".to_string(),
        ));
    }
    if let Some(format) = &request.response_format {
        if format.requires_schema() && format.schema().is_none() {
            return Err(GatewayError::InvalidRequest(
                "response_format type 'json_schema' requires a json_schema payload".to_string(),
            ));
        }
    }
    Ok(())
}

/// Drain the whole event stream into one non-streamed response.
async fn collect_response(
    model: &str,
    mut events: mpsc::Receiver<ResponseEvent>,
) -> Json<ChatCompletionResponse> {
    let mut content = String::new();
    while let Some(event) = events.recv().await {
        match event {
            ResponseEvent::Delta(text) => content.push_str(&text),
            ResponseEvent::ToolMessage(message) => {
                return Json(ChatCompletionResponse::single(model, message, "tool_calls"));
            }
        }
    }
    Json(ChatCompletionResponse::single(
        model,
        ChatMessage::assistant(content),
        "stop",
    ))
}

/// Forward events as server-sent chat-completion chunks.
fn stream_response(
    model: &str,
    mut events: mpsc::Receiver<ResponseEvent>,
    cancel: CancellationToken,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let id = generate_completion_id();
    let model = model.to_string();
    let (sse_tx, sse_rx) = mpsc::channel::<Event>(64);

    tokio::spawn(async move {
        // If the client goes away the send below fails, this task ends,
        // and the guard tells the runtime to stop generating.
        let _guard = cancel.drop_guard();
        let mut tool_turn = false;

        while let Some(event) = events.recv().await {
            let chunk = match event {
                ResponseEvent::Delta(text) => {
                    ChatCompletionStreamResponse::delta(&id, &model, ChatMessageDelta::content(text))
                }
                ResponseEvent::ToolMessage(message) => {
                    tool_turn = true;
                    let delta = ChatMessageDelta {
                        role: Some(Role::Assistant),
                        content: None,
                        tool_calls: message.tool_calls,
                    };
                    let mut chunk = ChatCompletionStreamResponse::delta(&id, &model, delta);
                    chunk.choices[0].finish_reason = Some("tool_calls".to_string());
                    chunk
                }
            };
            if send_chunk(&sse_tx, &chunk).await.is_err() {
                return;
            }
        }

        if !tool_turn {
            let mut finish = ChatCompletionStreamResponse::delta(&id, &model, ChatMessageDelta::default());
            finish.choices[0].finish_reason = Some("stop".to_string());
            if send_chunk(&sse_tx, &finish).await.is_err() {
                return;
            }
        }
        let _ = sse_tx.send(Event::default().data("[DONE]")).await;
    });

    let stream = ReceiverStream::new(sse_rx).map(Ok::<_, Infallible>);
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn send_chunk(
    tx: &mpsc::Sender<Event>,
    chunk: &ChatCompletionStreamResponse,
) -> Result<(), ()> {
    let event = Event::default()
        .json_data(chunk)
        .unwrap_or_else(|_| Event::default().data("{}"));
    tx.send(event).await.map_err(|_| ())
}
