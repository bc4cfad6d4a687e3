//! Chat session state.
//!
//! A [`ChatSession`] carries everything about one conversation: the selected
//! model, the message history and the files attached as references. It is
//! passed explicitly to every chat operation.

use crate::workspace::Workspace;
use serde::Serialize;
use tabula_core::config::{AppConfig, DEFAULT_REFERENCE_TEMPLATE};
use tabula_core::{AppError, AppResult};
use tabula_llm::{collect_stream, ChatMessage, ChatRequest, LlmClient, Role};
use tabula_template::{fill_placeholders, render_reference_context, Block, Resolution};

/// Reply the assistant side of the reference preamble carries.
const REFERENCE_ACK: &str = "OK.";

/// How block bodies and references become messages.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSettings {
    pub reference_template: String,
    pub substitute_placeholders: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reference_template: DEFAULT_REFERENCE_TEMPLATE.to_string(),
            substitute_placeholders: false,
        }
    }
}

/// Result of selecting a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockInvocation {
    /// The block was appended as a user message.
    Sent,
    /// Some placeholders have no file; nothing was appended.
    Unresolved(Resolution),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    model: String,
    messages: Vec<ChatMessage>,
    references: Vec<String>,
    settings: SessionSettings,
}

impl ChatSession {
    /// Empty session for the provider model identifier `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_settings(model, SessionSettings::default())
    }

    pub fn with_settings(model: impl Into<String>, settings: SessionSettings) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            references: Vec::new(),
            settings,
        }
    }

    /// Session configured from the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_settings(
            config.resolve_model(),
            SessionSettings {
                reference_template: config.reference_template.clone(),
                substitute_placeholders: config.substitute_placeholders,
            },
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Drop history and references; keep model and settings.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.references.clear();
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Whether the last message is a user message without a reply.
    pub fn awaiting_reply(&self) -> bool {
        self.messages.last().is_some_and(|m| m.role == Role::User)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Drop the last reply so it can be generated again.
    ///
    /// Only an assistant message is removed; returns whether one was.
    pub fn retry(&mut self) -> bool {
        if self.messages.last().is_some_and(|m| m.role == Role::Assistant) {
            self.messages.pop();
            return true;
        }
        false
    }

    /// Pop messages up to and including the last user message.
    ///
    /// Returns the number of messages removed.
    pub fn remove_last_exchange(&mut self) -> usize {
        let mut removed = 0;
        while let Some(message) = self.messages.pop() {
            removed += 1;
            if message.role == Role::User {
                break;
            }
        }
        removed
    }

    /// Attach workspace files as conversation context.
    pub fn set_references(&mut self, workspace: &Workspace, names: Vec<String>) -> AppResult<()> {
        if let Some(missing) = names.iter().find(|n| !workspace.contains(n)) {
            return Err(AppError::NotFound(missing.clone()));
        }
        self.references = names;
        Ok(())
    }

    /// Select a block: resolve its placeholders against the workspace and,
    /// when all resolve, append it as a user message.
    pub fn invoke_block(&mut self, block: &Block, workspace: &Workspace) -> BlockInvocation {
        let resolution = workspace.assign_params(&block.parameter_names);
        if !resolution.is_complete() {
            tracing::info!(
                block = %block.header,
                unresolved = ?resolution.unresolved,
                "Block has unresolved parameters"
            );
            return BlockInvocation::Unresolved(resolution);
        }
        self.invoke_resolved(block, &resolution)
    }

    /// Append a block whose parameters were completed by the user.
    ///
    /// The message is the block body as written unless placeholder
    /// substitution is enabled.
    pub fn invoke_resolved(&mut self, block: &Block, resolution: &Resolution) -> BlockInvocation {
        if !resolution.is_complete() {
            return BlockInvocation::Unresolved(resolution.clone());
        }

        let content = if self.settings.substitute_placeholders {
            fill_placeholders(&block.body, &resolution.assignment)
        } else {
            block.body.clone()
        };
        self.push_user(content);

        tracing::debug!(block = %block.header, "Block sent to conversation");
        BlockInvocation::Sent
    }

    /// The request for the next reply: reference preamble, then the history.
    pub fn build_request(&self, workspace: &Workspace) -> AppResult<ChatRequest> {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);

        if !self.references.is_empty() {
            let contents = self
                .references
                .iter()
                .map(|name| workspace.file(name).map(|f| f.content.as_str()))
                .collect::<AppResult<Vec<_>>>()?;

            let preamble = render_reference_context(&self.settings.reference_template, &contents)?;
            messages.push(ChatMessage::user(preamble));
            messages.push(ChatMessage::assistant(REFERENCE_ACK));
        }

        messages.extend(self.messages.iter().cloned());
        Ok(ChatRequest::new(messages, self.model.clone()))
    }

    /// Stream the assistant reply to the pending user message.
    ///
    /// `on_fragment` sees each fragment as it arrives. The full reply is
    /// appended as one assistant message only once the stream completes;
    /// on error, or when the future is dropped, the history is unchanged.
    pub async fn generate<F>(
        &mut self,
        client: &dyn LlmClient,
        workspace: &Workspace,
        on_fragment: F,
    ) -> AppResult<String>
    where
        F: FnMut(&str),
    {
        if !self.awaiting_reply() {
            return Err(AppError::Other(
                "No user message is awaiting a reply".to_string(),
            ));
        }

        let request = self.build_request(workspace)?.with_streaming();
        tracing::info!(
            provider = client.provider_name(),
            model = %self.model,
            messages = request.messages.len(),
            "Generating reply"
        );

        let stream = client.stream(&request).await?;
        let (content, usage) = collect_stream(stream, on_fragment).await?;

        if let Some(usage) = usage {
            tracing::debug!(
                "Token usage - Prompt: {}, Completion: {}, Total: {}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }

        self.messages.push(ChatMessage::assistant(content.clone()));
        Ok(content)
    }
}
