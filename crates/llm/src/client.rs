//! LLM client abstraction and request/response types.
//!
//! This module defines the core abstractions for talking to a chat provider.

use crate::types::ChatMessage;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tabula_core::{AppError, AppResult};

/// Chat completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,

    /// Provider model identifier (e.g., "gemma2")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Enable streaming responses
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// Create a new chat request with required fields.
    pub fn new(messages: Vec<ChatMessage>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
            max_tokens: None,
            temperature: None,
            stream: false,
        }
    }

    /// Enable streaming for this request.
    pub fn with_streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated assistant message
    pub message: ChatMessage,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Whether the response was complete
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// A fragment of a streaming reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    /// Incremental text content
    pub content: String,

    /// Model generating the stream
    pub model: String,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage statistics (only in final chunk)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<LlmUsage>,
}

/// Stream of reply fragments.
pub type ChatStream = Pin<Box<dyn Stream<Item = AppResult<ChatStreamChunk>> + Send>>;

/// Trait for chat providers.
///
/// Implementations must produce fragments lazily so callers can render them
/// as they arrive. Dropping the stream cancels the underlying request.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse>;

    /// Perform a streaming completion.
    async fn stream(&self, request: &ChatRequest) -> AppResult<ChatStream>;
}

/// Drain a stream, calling `on_fragment` for each non-empty fragment.
///
/// Returns the concatenated reply and the usage reported by the final chunk.
/// Stops at the first chunk flagged `done`. A stream that ends before any
/// chunk is flagged `done` is an error, since the reply is incomplete.
pub async fn collect_stream<F>(
    mut stream: ChatStream,
    mut on_fragment: F,
) -> AppResult<(String, Option<LlmUsage>)>
where
    F: FnMut(&str),
{
    let mut full_content = String::new();
    let mut usage = None;
    let mut completed = false;

    while let Some(result) = stream.next().await {
        let chunk = result?;

        if !chunk.content.is_empty() {
            on_fragment(&chunk.content);
            full_content.push_str(&chunk.content);
        }

        if chunk.done {
            usage = chunk.usage;
            completed = true;
            break;
        }
    }

    if !completed {
        return Err(AppError::Llm("stream ended before completion".to_string()));
    }

    Ok((full_content, usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, done: bool) -> AppResult<ChatStreamChunk> {
        Ok(ChatStreamChunk {
            content: content.to_string(),
            model: "m".to_string(),
            done,
            usage: done.then(|| LlmUsage::new(3, 2)),
        })
    }

    #[tokio::test]
    async fn test_collect_stream_concatenates_fragments() {
        let stream: ChatStream = Box::pin(futures::stream::iter(vec![
            chunk("Hel", false),
            chunk("", false),
            chunk("lo", false),
            chunk("", true),
            chunk("ignored", false),
        ]));

        let mut seen = Vec::new();
        let (text, usage) = collect_stream(stream, |f| seen.push(f.to_string()))
            .await
            .unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(seen, vec!["Hel", "lo"]);
        assert_eq!(usage, Some(LlmUsage::new(3, 2)));
    }

    #[tokio::test]
    async fn test_collect_stream_propagates_errors() {
        let stream: ChatStream = Box::pin(futures::stream::iter(vec![
            chunk("partial", false),
            Err(AppError::Llm("connection reset".to_string())),
        ]));

        let result = collect_stream(stream, |_| {}).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_collect_stream_without_done_is_error() {
        let stream: ChatStream = Box::pin(futures::stream::iter(vec![chunk("half a rep", false)]));

        let mut seen = Vec::new();
        let result = collect_stream(stream, |f| seen.push(f.to_string())).await;

        assert!(matches!(result, Err(AppError::Llm(_))));
        assert_eq!(seen, vec!["half a rep"]);
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![ChatMessage::user("hi")], "gemma2")
            .with_streaming()
            .with_temperature(0.2)
            .with_max_tokens(64);

        assert!(request.stream);
        assert_eq!(request.temperature, Some(0.2));
        assert_eq!(request.max_tokens, Some(64));
        assert_eq!(request.messages.len(), 1);
    }
}
