//! Command handlers for the Tabula CLI.

pub mod blocks;
pub mod files;
pub mod new;
pub mod run;
pub mod session;

pub use blocks::BlocksCommand;
pub use files::FilesCommand;
pub use new::NewCommand;
pub use run::RunCommand;
pub use session::SessionCommand;

use std::io::Write;
use std::sync::Arc;
use tabula_core::{config::AppConfig, AppError, AppResult};
use tabula_editor::Workspace;
use tabula_llm::{create_client, LlmClient};

/// Load the configured workspace.
pub(crate) fn load_workspace(config: &AppConfig) -> AppResult<Workspace> {
    Workspace::open_dir(&config.workspace, config.columns)
}

/// Build the configured chat client.
pub(crate) fn build_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    create_client(&config.provider, config.endpoint.as_deref())
}

/// Print a fragment as soon as it arrives.
pub(crate) fn print_fragment(fragment: &str) {
    print!("{}", fragment);
    std::io::stdout().flush().ok();
}

/// Parse `name=value` pairs given on the command line.
pub(crate) fn parse_assignment(pair: &str) -> AppResult<(String, String)> {
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| AppError::Other(format!("Expected name=value, got: {}", pair)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Other(format!("Missing parameter name in: {}", pair)));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("topic=a=b").unwrap(),
            ("topic".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_assignment(" tone =").unwrap(),
            ("tone".to_string(), String::new())
        );
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=x").is_err());
    }
}
