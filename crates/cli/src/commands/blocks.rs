//! Blocks command handler.
//!
//! Lists the blocks of a file together with the state of their parameters.

use clap::Args;
use tabula_core::{config::AppConfig, AppResult};

/// List the blocks of a file
#[derive(Args, Debug)]
pub struct BlocksCommand {
    /// Workspace file name (e.g., steps.md)
    pub file: String,

    /// Print block bodies too
    #[arg(short, long)]
    pub body: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BlocksCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::debug!("Blocks options: {:?}", self);
        let mut workspace = super::load_workspace(config)?;
        let tab = workspace.open_file(0, &self.file)?;
        let blocks = workspace.tab(0, tab)?.blocks().to_vec();

        if self.json {
            let output: Vec<_> = blocks
                .iter()
                .enumerate()
                .map(|(index, block)| {
                    let resolution = workspace.assign_params(&block.parameter_names);
                    serde_json::json!({
                        "index": index,
                        "header": block.header,
                        "body": block.body,
                        "parameterNames": block.parameter_names,
                        "unresolved": resolution.unresolved,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        if blocks.is_empty() {
            println!("No blocks in {}", self.file);
            return Ok(());
        }

        for (index, block) in blocks.iter().enumerate() {
            let resolution = workspace.assign_params(&block.parameter_names);
            let status = if !block.has_parameters() {
                String::new()
            } else if resolution.is_complete() {
                format!("  [{}]", block.parameter_names.join(", "))
            } else {
                format!("  [missing: {}]", resolution.unresolved.join(", "))
            };
            println!("{:>3}  {}{}", index, block.header, status);

            if self.body {
                for line in block.body.lines() {
                    println!("       {}", line);
                }
            }
        }

        Ok(())
    }
}
