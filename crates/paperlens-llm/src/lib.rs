//! paperlens-llm — Text completion backends and the retrying adapter the
//! pipeline calls through.

pub mod backend;
pub mod client;

pub use backend::{
    CompletionRequest, CompletionResponse, LlmBackend, LlmError, Message, OllamaBackend,
    OpenAiCompatibleBackend,
};
pub use client::{CompletionClient, RetryPolicy};
