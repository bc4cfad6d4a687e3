//! Run command handler.
//!
//! Sends one block of a file to the model as a fresh conversation.

use clap::Args;
use tabula_core::{config::AppConfig, AppError, AppResult};
use tabula_editor::{BlockInvocation, ChatSession, Workspace};
use tabula_llm::LlmClient;

/// Send one block to the model
#[derive(Args, Debug)]
pub struct RunCommand {
    /// Workspace file name (e.g., steps.md)
    pub file: String,

    /// Block index or exact header
    pub block: String,

    /// Value for a placeholder with no matching file (name=value)
    #[arg(short = 's', long = "set", value_name = "NAME=VALUE")]
    pub assignments: Vec<String>,

    /// Attach a workspace file as reference context
    #[arg(short = 'r', long = "ref", value_name = "FILE")]
    pub references: Vec<String>,

    /// Disable streaming
    #[arg(long)]
    pub no_stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing run command");
        tracing::debug!("Run options: {:?}", self);

        let mut workspace = super::load_workspace(config)?;
        let tab = workspace.open_file(0, &self.file)?;
        let block = workspace
            .tab(0, tab)?
            .find_block(&self.block)
            .cloned()
            .ok_or_else(|| {
                AppError::Other(format!("No block '{}' in {}", self.block, self.file))
            })?;

        let mut session = ChatSession::from_config(config);
        session.set_references(&workspace, self.references.clone())?;

        if let BlockInvocation::Unresolved(mut resolution) =
            session.invoke_block(&block, &workspace)
        {
            for pair in &self.assignments {
                let (name, value) = super::parse_assignment(pair)?;
                resolution.supply(&name, value);
            }
            if let BlockInvocation::Unresolved(resolution) =
                session.invoke_resolved(&block, &resolution)
            {
                return Err(AppError::Other(format!(
                    "Unresolved parameters: {}. Create matching files or pass --set name=value",
                    resolution.unresolved.join(", ")
                )));
            }
        }

        let client = super::build_client(config)?;

        if self.no_stream {
            self.complete_once(client.as_ref(), &session, &workspace, config)
                .await
        } else {
            let on_fragment = |fragment: &str| {
                if !self.json {
                    super::print_fragment(fragment);
                }
            };
            let reply = session
                .generate(client.as_ref(), &workspace, on_fragment)
                .await?;
            self.print_reply(&reply, session.model(), config, true)
        }
    }

    async fn complete_once(
        &self,
        client: &dyn LlmClient,
        session: &ChatSession,
        workspace: &Workspace,
        config: &AppConfig,
    ) -> AppResult<()> {
        let request = session.build_request(workspace)?;
        let response = client.complete(&request).await?;

        tracing::debug!(
            "Token usage - Prompt: {}, Completion: {}, Total: {}",
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
            response.usage.total_tokens
        );

        self.print_reply(&response.message.content, session.model(), config, false)
    }

    fn print_reply(
        &self,
        reply: &str,
        model: &str,
        config: &AppConfig,
        streamed: bool,
    ) -> AppResult<()> {
        if self.json {
            let output = serde_json::json!({
                "file": self.file,
                "block": self.block,
                "answer": reply,
                "model": model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if streamed {
            println!();
        } else {
            println!("{}", reply);
        }
        Ok(())
    }
}
