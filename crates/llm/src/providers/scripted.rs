//! Scripted provider that replays fixed reply fragments.
//!
//! Useful offline and in tests: no network, deterministic output, and the
//! received requests are recorded for inspection.

use crate::client::{ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, LlmClient, LlmUsage};
use crate::types::{ChatMessage, Role};
use futures::StreamExt;
use std::sync::Mutex;
use std::time::Duration;
use tabula_core::{AppError, AppResult};

pub struct ScriptedClient {
    fragments: Vec<String>,
    delay: Option<Duration>,
    truncated: bool,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedClient {
    /// Reply with `fragments`, in order, to every request.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            delay: None,
            truncated: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply by echoing the last user message back in word-sized fragments.
    pub fn echo() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Sleep between fragments to imitate a network stream.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// End streams without the final chunk, like a connection closed mid-reply.
    pub fn truncated(mut self) -> Self {
        self.truncated = true;
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &ChatRequest) -> AppResult<()> {
        self.requests
            .lock()
            .map_err(|_| AppError::Llm("Scripted client state poisoned".to_string()))?
            .push(request.clone());
        Ok(())
    }

    fn fragments_for(&self, request: &ChatRequest) -> Vec<String> {
        if !self.fragments.is_empty() {
            return self.fragments.clone();
        }
        let last = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        last.split_inclusive(' ').map(str::to_string).collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedClient {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.record(request)?;
        let content = self.fragments_for(request).concat();
        Ok(ChatResponse {
            message: ChatMessage::assistant(content),
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> AppResult<ChatStream> {
        self.record(request)?;
        tracing::debug!(model = %request.model, "Replaying scripted stream");

        let model = request.model.clone();
        let mut chunks: Vec<ChatStreamChunk> = self
            .fragments_for(request)
            .into_iter()
            .map(|content| ChatStreamChunk {
                content,
                model: model.clone(),
                done: false,
                usage: None,
            })
            .collect();
        if !self.truncated {
            chunks.push(ChatStreamChunk {
                content: String::new(),
                model,
                done: true,
                usage: Some(LlmUsage::default()),
            });
        }

        let delay = self.delay;
        let stream = futures::stream::iter(chunks).then(move |chunk| async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok::<_, AppError>(chunk)
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::collect_stream;

    #[tokio::test]
    async fn test_scripted_stream_replays_fragments() {
        let client = ScriptedClient::new(["Hello", ", ", "world"]);
        let request = ChatRequest::new(vec![ChatMessage::user("hi")], "gemma2");

        let stream = client.stream(&request).await.unwrap();
        let (text, usage) = collect_stream(stream, |_| {}).await.unwrap();

        assert_eq!(text, "Hello, world");
        assert!(usage.is_some());
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_stream_fails_to_collect() {
        let client = ScriptedClient::new(["half ", "a rep"]).truncated();
        let request = ChatRequest::new(vec![ChatMessage::user("hi")], "gemma2");

        let stream = client.stream(&request).await.unwrap();
        let result = collect_stream(stream, |_| {}).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_echo_repeats_last_user_message() {
        let client = ScriptedClient::echo();
        let request = ChatRequest::new(
            vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("reply"),
                ChatMessage::user("say this back"),
            ],
            "gemma2",
        );

        let response = client.complete(&request).await.unwrap();
        assert_eq!(response.message.content, "say this back");
    }
}
