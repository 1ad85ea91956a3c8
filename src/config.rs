//! Server configuration, sourced from CLI flags and environment.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "vlm-gateway", about = "OpenAI-compatible gateway for vision-language models")]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    #[arg(long, env = "VLM_GATEWAY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP server to
    #[arg(long, env = "VLM_GATEWAY_PORT", default_value_t = 8000)]
    pub port: u16,

    /// URL of the generation worker's /generate endpoint
    #[arg(
        long,
        env = "VLM_GATEWAY_WORKER_URL",
        default_value = "http://127.0.0.1:8001/generate"
    )]
    pub worker_url: String,

    /// Model id reported in responses
    #[arg(
        long,
        env = "VLM_GATEWAY_MODEL_ID",
        default_value = "meta-llama/Llama-3.2-11B-Vision-Instruct"
    )]
    pub model_id: String,

    /// Optional system prompt prepended when the request has none
    #[arg(long, env = "VLM_GATEWAY_SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// End-of-sequence marker stripped from streamed text fragments
    #[arg(long, env = "VLM_GATEWAY_EOS_MARKER", default_value = "<|eot_id|>")]
    pub eos_marker: String,

    /// Per-image network fetch timeout in seconds
    #[arg(long, env = "VLM_GATEWAY_FETCH_TIMEOUT", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    /// End-to-end generation timeout in seconds
    #[arg(long, env = "VLM_GATEWAY_REQUEST_TIMEOUT", default_value_t = 600)]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
