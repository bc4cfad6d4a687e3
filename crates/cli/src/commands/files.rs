//! Files command handler.

use clap::Args;
use tabula_core::{config::AppConfig, AppResult};

/// List workspace files
#[derive(Args, Debug)]
pub struct FilesCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl FilesCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::debug!("Files options: {:?}", self);
        let workspace = super::load_workspace(config)?;

        if self.json {
            let files: Vec<_> = workspace
                .files()
                .map(|f| {
                    serde_json::json!({
                        "name": f.name,
                        "bytes": f.content.len(),
                        "blocks": tabula_template::parse_blocks(&f.content).len(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&files)?);
            return Ok(());
        }

        for file in workspace.files() {
            let blocks = tabula_template::parse_blocks(&file.content).len();
            println!("{:<32} {:>8} bytes {:>4} blocks", file.name, file.content.len(), blocks);
        }

        Ok(())
    }
}
