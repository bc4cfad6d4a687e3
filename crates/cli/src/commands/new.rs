//! New command handler.

use clap::Args;
use tabula_core::{config::AppConfig, AppResult};

/// Create a new file
#[derive(Args, Debug)]
pub struct NewCommand {
    /// File name; `.md` is appended unless it ends in .md or .txt
    pub name: String,

    /// Initial content
    #[arg(short, long)]
    pub content: Option<String>,
}

impl NewCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let mut workspace = super::load_workspace(config)?;

        let name = workspace.create_file(&self.name)?;
        if let Some(ref content) = self.content {
            workspace.update_file(&name, content.as_str())?;
        }
        workspace.save_file(&name)?;

        println!("{}", name);
        Ok(())
    }
}
