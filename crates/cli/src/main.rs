//! Tabula CLI
//!
//! Main entry point for the `tabula` command-line tool: keep a directory of
//! text files, extract templated blocks from them and chat with a model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{BlocksCommand, FilesCommand, NewCommand, RunCommand, SessionCommand};
use std::path::PathBuf;
use tabula_core::{config::AppConfig, logging, AppResult};

/// Tabula - templated blocks from your notes, sent to a chat model
#[derive(Parser, Debug)]
#[command(name = "tabula")]
#[command(about = "Templated blocks from your notes, sent to a chat model", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace directory holding .md/.txt files
    #[arg(short, long, global = true, env = "TABULA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Number of editor columns
    #[arg(long, global = true)]
    columns: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, scripted)
    #[arg(short, long, global = true, env = "TABULA_PROVIDER")]
    provider: Option<String>,

    /// Model alias or identifier
    #[arg(short, long, global = true, env = "TABULA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List workspace files
    Files(FilesCommand),

    /// Create a new file
    New(NewCommand),

    /// List the blocks of a file
    Blocks(BlocksCommand),

    /// Send one block to the model
    Run(RunCommand),

    /// Interactive editing and chat session
    Session(SessionCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_from(cli.workspace.clone())?.with_overrides(
        cli.workspace,
        cli.columns,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Tabula starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {} ({})", config.model, config.resolve_model());

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Files(_) => "files",
        Commands::New(_) => "new",
        Commands::Blocks(_) => "blocks",
        Commands::Run(_) => "run",
        Commands::Session(_) => "session",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Files(cmd) => cmd.execute(&config),
        Commands::New(cmd) => cmd.execute(&config),
        Commands::Blocks(cmd) => cmd.execute(&config),
        Commands::Run(cmd) => cmd.execute(&config).await,
        Commands::Session(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
