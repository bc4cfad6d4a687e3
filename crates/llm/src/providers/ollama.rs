//! Ollama chat provider.
//!
//! Talks to the `/api/chat` endpoint of a local Ollama runtime.
//! Ollama API: https://github.com/ollama/ollama/blob/main/docs/api.md

use crate::client::{ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, LlmClient, LlmUsage};
use crate::types::{ChatMessage, Role};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tabula_core::{AppError, AppResult};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Ollama API response format (one NDJSON line when streaming).
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    message: Option<ChatMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaChatResponse {
    fn usage(&self) -> LlmUsage {
        LlmUsage::new(
            self.prompt_eval_count.unwrap_or(0),
            self.eval_count.unwrap_or(0),
        )
    }

    fn into_chunk(self) -> AppResult<ChatStreamChunk> {
        if let Some(error) = self.error {
            return Err(AppError::Llm(format!("Ollama stream error: {}", error)));
        }

        let usage = self.done.then(|| self.usage());
        Ok(ChatStreamChunk {
            content: self.message.map(|m| m.content).unwrap_or_default(),
            model: self.model,
            done: self.done,
            usage,
        })
    }
}

/// Splits a byte stream into newline-terminated lines.
///
/// Network chunks do not align with NDJSON records, so partial lines are
/// buffered until their terminator arrives.
#[derive(Debug, Default)]
struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line).trim().to_string();
            if !text.is_empty() {
                lines.push(text);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let text = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        (!text.is_empty()).then_some(text)
    }
}

fn parse_line(line: &str) -> AppResult<ChatStreamChunk> {
    let response: OllamaChatResponse = serde_json::from_str(line)
        .map_err(|e| AppError::Llm(format!("Failed to parse chunk: {}", e)))?;
    response.into_chunk()
}

/// Ollama chat client.
pub struct OllamaClient {
    /// Base URL for Ollama API
    base_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client against the default local endpoint.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_ENDPOINT)
    }

    /// Create a new Ollama client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn to_ollama_request(&self, request: &ChatRequest, stream: bool) -> OllamaChatRequest {
        let options = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            })
        } else {
            None
        };

        OllamaChatRequest {
            model: request.model.clone(),
            messages: request.messages.clone(),
            stream,
            options,
        }
    }

    async fn send(&self, body: &OllamaChatRequest) -> AppResult<reqwest::Response> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Ollama: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Ollama API error ({}): {}",
                status, error_text
            )));
        }

        Ok(response)
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::info!(model = %request.model, "Sending chat request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_ollama_request(request, false)).await?;

        let ollama_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Ollama response: {}", e)))?;

        let usage = ollama_response.usage();
        let chunk = ollama_response.into_chunk()?;

        tracing::info!("Received chat completion from Ollama");

        Ok(ChatResponse {
            message: ChatMessage {
                role: Role::Assistant,
                content: chunk.content,
            },
            model: chunk.model,
            usage,
            done: chunk.done,
        })
    }

    async fn stream(&self, request: &ChatRequest) -> AppResult<ChatStream> {
        tracing::info!(model = %request.model, "Starting streaming chat request to Ollama");
        tracing::debug!("Request: {:?}", request);

        let response = self.send(&self.to_ollama_request(request, true)).await?;
        let bytes = Box::pin(response.bytes_stream());

        let lines = futures::stream::unfold(
            (bytes, LineDecoder::default(), false),
            |(mut bytes, mut decoder, finished)| async move {
                if finished {
                    return None;
                }
                match bytes.next().await {
                    Some(Ok(chunk)) => {
                        let lines: Vec<AppResult<String>> =
                            decoder.push(&chunk).into_iter().map(Ok).collect();
                        Some((lines, (bytes, decoder, false)))
                    }
                    Some(Err(e)) => Some((
                        vec![Err(AppError::Llm(format!("Stream error: {}", e)))],
                        (bytes, decoder, true),
                    )),
                    None => {
                        let rest: Vec<AppResult<String>> =
                            decoder.finish().into_iter().map(Ok).collect();
                        Some((rest, (bytes, decoder, true)))
                    }
                }
            },
        );

        let chunks = lines
            .flat_map(futures::stream::iter)
            .map(|line| line.and_then(|l| parse_line(&l)));

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_client_creation() {
        let client = OllamaClient::with_base_url("http://localhost:8080/");
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_ollama_request_conversion() {
        let client = OllamaClient::new();
        let request = ChatRequest::new(
            vec![ChatMessage::user("Hello"), ChatMessage::assistant("Hi")],
            "gemma2",
        )
        .with_temperature(0.7);

        let body = serde_json::to_value(client.to_ollama_request(&request, true)).unwrap();
        assert_eq!(body["model"], "gemma2");
        assert_eq!(body["stream"], true);
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["options"]["temperature"], serde_json::json!(0.7f32));
        assert!(body["options"].get("num_predict").is_none());

        let plain = serde_json::to_value(
            client.to_ollama_request(&ChatRequest::new(vec![], "gemma2"), false),
        )
        .unwrap();
        assert!(plain.get("options").is_none());
    }

    #[test]
    fn test_line_decoder_buffers_partial_lines() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.push(b"{\"a\":").is_empty());
        assert_eq!(decoder.push(b"1}\n\n{\"b\""), vec!["{\"a\":1}"]);
        assert_eq!(decoder.push(b":2}\n"), vec!["{\"b\":2}"]);
        assert_eq!(decoder.finish(), None);

        decoder.push(b"{\"tail\":true}");
        assert_eq!(decoder.finish(), Some("{\"tail\":true}".to_string()));
    }

    #[test]
    fn test_parse_stream_lines() {
        let chunk = parse_line(
            r#"{"model":"gemma2","message":{"role":"assistant","content":"Hel"},"done":false}"#,
        )
        .unwrap();
        assert_eq!(chunk.content, "Hel");
        assert!(!chunk.done);
        assert!(chunk.usage.is_none());

        let last = parse_line(
            r#"{"model":"gemma2","message":{"role":"assistant","content":""},"done":true,"prompt_eval_count":10,"eval_count":4}"#,
        )
        .unwrap();
        assert!(last.done);
        assert_eq!(last.usage, Some(LlmUsage::new(10, 4)));

        assert!(parse_line(r#"{"error":"model not found"}"#).is_err());
        assert!(parse_line("not json").is_err());
    }
}
