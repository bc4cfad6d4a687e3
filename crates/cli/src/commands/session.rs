//! Session command handler.
//!
//! A line-oriented stand-in for the editor UI. Plain lines are chat input;
//! lines starting with `/` drive the workspace and the conversation. Whenever
//! the conversation ends with a user message, a reply is streamed.

use clap::Args;
use std::sync::Arc;
use tabula_core::{config::AppConfig, AppError, AppResult};
use tabula_editor::{BlockInvocation, ChatSession, Workspace};
use tabula_llm::LlmClient;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

const HELP: &str = "\
Chat:
  <text>                       send a message
  /clear  /retry  /remove      clear history, regenerate last reply, drop last exchange
  /ref [file...]               attach files as context (no files: detach all)
  /model <alias>               switch model
  /history                     print the conversation
Files and tabs:
  /files                       list files (* = open in a tab, + = unsaved)
  /tabs                        show columns and tabs
  /open <col> <file>           open a file as a new tab
  /new <col> <name>            create a file and open it
  /close <col> <tab>           close a tab
  /show <col> <tab>            print the tab's content
  /edit <col> <tab>            replace the content (end input with a line containing only '.')
  /refresh <col> <tab>         re-parse the tab's blocks
  /save <file>                 write a file to disk
  /blocks <col> <tab>          list the tab's blocks
  /run <col> <tab> <block>     send a block (index or header)
  /help  /quit";

/// Interactive editing and chat session
#[derive(Args, Debug)]
pub struct SessionCommand {
    /// Files to open in the first column at start
    #[arg(short, long)]
    pub open: Vec<String>,
}

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Chat(String),
    Help,
    Quit,
    Files,
    Tabs,
    Open { column: usize, file: String },
    New { column: usize, name: String },
    Close { column: usize, tab: usize },
    Show { column: usize, tab: usize },
    Edit { column: usize, tab: usize },
    Refresh { column: usize, tab: usize },
    Save { file: String },
    Blocks { column: usize, tab: usize },
    Run { column: usize, tab: usize, block: String },
    References(Vec<String>),
    Model(String),
    Clear,
    Retry,
    Remove,
    History,
}

fn index(arg: Option<&str>, what: &str) -> AppResult<usize> {
    let arg = arg.ok_or_else(|| AppError::Other(format!("Missing {}", what)))?;
    arg.parse()
        .map_err(|_| AppError::Other(format!("Invalid {}: {}", what, arg)))
}

/// The text after the first `skip` words of `command`, spacing kept as typed.
fn rest(command: &str, skip: usize, what: &str) -> AppResult<String> {
    let mut tail = command.trim_start();
    for _ in 0..skip {
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        tail = tail[end..].trim_start();
    }
    if tail.is_empty() {
        return Err(AppError::Other(format!("Missing {}", what)));
    }
    Ok(tail.trim_end().to_string())
}

/// Parse one input line. Returns `None` for blank lines.
pub fn parse_line(line: &str) -> AppResult<Option<Action>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(Action::Chat(line.to_string())));
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    let Some((&name, args)) = parts.split_first() else {
        return Err(AppError::Other("Empty command".to_string()));
    };
    let arg = |i: usize| args.get(i).copied();

    let action = match name {
        "help" | "h" => Action::Help,
        "quit" | "q" | "exit" => Action::Quit,
        "files" => Action::Files,
        "tabs" => Action::Tabs,
        "open" => Action::Open {
            column: index(arg(0), "column")?,
            file: rest(command, 2, "file name")?,
        },
        "new" => Action::New {
            column: index(arg(0), "column")?,
            name: rest(command, 2, "file name")?,
        },
        "close" => Action::Close {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
        },
        "show" => Action::Show {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
        },
        "edit" => Action::Edit {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
        },
        "refresh" => Action::Refresh {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
        },
        "save" => Action::Save {
            file: rest(command, 1, "file name")?,
        },
        "blocks" => Action::Blocks {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
        },
        "run" => Action::Run {
            column: index(arg(0), "column")?,
            tab: index(arg(1), "tab")?,
            block: rest(command, 3, "block")?,
        },
        "ref" => Action::References(args.iter().map(|s| s.to_string()).collect()),
        "model" => Action::Model(rest(command, 1, "model")?),
        "clear" => Action::Clear,
        "retry" => Action::Retry,
        "remove" => Action::Remove,
        "history" => Action::History,
        other => return Err(AppError::Other(format!("Unknown command: /{}", other))),
    };

    Ok(Some(action))
}

struct Repl {
    workspace: Workspace,
    session: ChatSession,
    client: Arc<dyn LlmClient>,
    config: AppConfig,
    input: Lines<BufReader<Stdin>>,
    quit_warned: bool,
}

impl SessionCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting interactive session");

        let mut workspace = super::load_workspace(config)?;
        for file in &self.open {
            workspace.open_file(0, file)?;
        }

        let mut repl = Repl {
            workspace,
            session: ChatSession::from_config(config),
            client: super::build_client(config)?,
            config: config.clone(),
            input: BufReader::new(tokio::io::stdin()).lines(),
            quit_warned: false,
        };

        println!(
            "tabula session: {} files, {} columns, model {}. /help for commands.",
            repl.workspace.file_names().len(),
            repl.workspace.columns().len(),
            repl.session.model()
        );

        repl.run().await
    }
}

impl Repl {
    async fn run(&mut self) -> AppResult<()> {
        loop {
            super::print_fragment("> ");

            let Some(line) = self.input.next_line().await? else {
                break;
            };

            let action = match parse_line(&line) {
                Ok(Some(action)) => action,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            if action == Action::Quit {
                let unsaved = self.workspace.unsaved_files();
                if unsaved.is_empty() || self.quit_warned {
                    break;
                }
                println!(
                    "unsaved files: {}. /save them or /quit again to discard",
                    unsaved.join(", ")
                );
                self.quit_warned = true;
                continue;
            }
            self.quit_warned = false;

            // Editor errors are recoverable: report and keep going.
            if let Err(e) = self.apply(action).await {
                eprintln!("{}", e);
                continue;
            }

            if self.session.awaiting_reply() {
                if let Err(e) = self.respond().await {
                    eprintln!("{}", e);
                }
            }
        }

        Ok(())
    }

    async fn apply(&mut self, action: Action) -> AppResult<()> {
        match action {
            Action::Chat(text) => self.session.push_user(text),
            Action::Help => println!("{}", HELP),
            Action::Quit => {}
            Action::Files => {
                let closed = self.workspace.not_opened_files();
                for file in self.workspace.files() {
                    let open = if closed.contains(&file.name) { ' ' } else { '*' };
                    let dirty = if file.is_dirty() { '+' } else { ' ' };
                    println!("{}{} {:<32} {:?}", open, dirty, file.name, file.state);
                }
            }
            Action::Tabs => {
                for (c, column) in self.workspace.columns().iter().enumerate() {
                    println!("column {}:", c);
                    for (t, tab) in column.tabs.iter().enumerate() {
                        println!("  {} {} ({} blocks)", t, tab.file_name(), tab.blocks().len());
                    }
                }
            }
            Action::Open { column, file } => {
                let tab = self.workspace.open_file(column, &file)?;
                println!("opened {} as tab {} in column {}", file, tab, column);
            }
            Action::New { column, name } => {
                let name = self.workspace.create_file(&name)?;
                let tab = self.workspace.open_file(column, &name)?;
                println!("created {} as tab {} in column {}", name, tab, column);
            }
            Action::Close { column, tab } => {
                let closed = self.workspace.close_tab(column, tab)?;
                println!("closed {}", closed.file_name());
            }
            Action::Show { column, tab } => {
                let name = self.workspace.tab(column, tab)?.file_name().to_string();
                println!("{}", self.workspace.file(&name)?.content);
            }
            Action::Edit { column, tab } => {
                self.workspace.tab(column, tab)?;
                println!("enter new content, end with a line containing only '.'");
                let content = self.read_until_dot().await?;
                if self.workspace.commit_edit(column, tab, content)? {
                    let blocks = self.workspace.tab(column, tab)?.blocks().len();
                    println!("saved ({} blocks)", blocks);
                } else {
                    println!("unchanged");
                }
            }
            Action::Refresh { column, tab } => self.workspace.refresh_tab(column, tab)?,
            Action::Save { file } => {
                self.workspace.save_file(&file)?;
                println!("saved {}", file);
            }
            Action::Blocks { column, tab } => {
                for (i, block) in self.workspace.tab(column, tab)?.blocks().iter().enumerate() {
                    let resolution = self.workspace.assign_params(&block.parameter_names);
                    if resolution.is_complete() {
                        println!("{:>3}  {}", i, block.header);
                    } else {
                        println!(
                            "{:>3}  {}  [missing: {}]",
                            i,
                            block.header,
                            resolution.unresolved.join(", ")
                        );
                    }
                }
            }
            Action::Run { column, tab, block } => self.run_block(column, tab, &block).await?,
            Action::References(names) => {
                self.session.set_references(&self.workspace, names)?;
                println!("references: {}", self.session.references().join(", "));
            }
            Action::Model(alias) => {
                self.session.set_model(self.config.model_for(&alias));
                println!("model: {}", self.session.model());
            }
            Action::Clear => self.session.clear(),
            Action::Retry => {
                if !self.session.retry() {
                    println!("nothing to retry");
                }
            }
            Action::Remove => {
                let removed = self.session.remove_last_exchange();
                println!("removed {} messages", removed);
            }
            Action::History => {
                for message in self.session.messages() {
                    println!("[{}]\n{}\n", message.role, message.content);
                }
            }
        }
        Ok(())
    }

    async fn run_block(&mut self, column: usize, tab: usize, selector: &str) -> AppResult<()> {
        let block = self
            .workspace
            .tab(column, tab)?
            .find_block(selector)
            .cloned()
            .ok_or_else(|| AppError::Other(format!("No block '{}'", selector)))?;

        let BlockInvocation::Unresolved(mut resolution) =
            self.session.invoke_block(&block, &self.workspace)
        else {
            return Ok(());
        };

        // Ask for each missing parameter in turn.
        while let Some(name) = resolution.unresolved.first().cloned() {
            super::print_fragment(&format!("{}: ", name));
            let Some(value) = self.input.next_line().await? else {
                return Err(AppError::Other("Input closed".to_string()));
            };
            resolution.supply(&name, value);
        }

        self.session.invoke_resolved(&block, &resolution);
        Ok(())
    }

    async fn respond(&mut self) -> AppResult<()> {
        let generation =
            self.session
                .generate(self.client.as_ref(), &self.workspace, super::print_fragment);

        tokio::select! {
            result = generation => {
                result?;
                println!();
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n[cancelled]");
            }
        }
        Ok(())
    }

    async fn read_until_dot(&mut self) -> AppResult<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.input.next_line().await? {
            if line == "." {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }
}
