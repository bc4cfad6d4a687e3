//! Chat-model integration for Tabula.
//!
//! A provider-agnostic abstraction for streaming chat completions. The editor
//! only depends on the [`LlmClient`] trait; providers plug in behind it.
//!
//! # Providers
//! - **Ollama**: local LLM runtime (default)
//! - **Scripted**: replays fixed fragments, for tests and offline use
//!
//! # Example
//! ```no_run
//! use tabula_llm::{ChatMessage, ChatRequest, LlmClient, OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new(vec![ChatMessage::user("Hello, world!")], "gemma2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.message.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

pub use client::{
    collect_stream, ChatRequest, ChatResponse, ChatStream, ChatStreamChunk, LlmClient, LlmUsage,
};
pub use factory::create_client;
pub use providers::{OllamaClient, ScriptedClient};
pub use types::{ChatMessage, Role};
