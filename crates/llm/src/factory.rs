//! LLM provider factory.
//!
//! Builds a client from the configured provider name.

use crate::client::LlmClient;
use crate::providers::{OllamaClient, ScriptedClient};
use std::sync::Arc;
use tabula_core::config::normalize_provider;
use tabula_core::{AppError, AppResult};

/// Create a chat client for `provider`.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "scripted")
/// * `endpoint` - Optional custom endpoint URL
///
/// # Errors
/// Returns `AppError::Config` for an unknown provider.
pub fn create_client(provider: &str, endpoint: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    match normalize_provider(provider).as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or(crate::providers::ollama::DEFAULT_ENDPOINT);
            tracing::debug!("Creating Ollama client for {}", base_url);
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        "scripted" => Ok(Arc::new(ScriptedClient::echo())),
        _ => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client("Ollama", Some("http://localhost:8080"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_create_scripted_client() {
        let client = create_client("scripted", None).unwrap();
        assert_eq!(client.provider_name(), "scripted");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
