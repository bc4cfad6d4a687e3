//! Configuration management for Tabula.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - Config file (`<workspace>/.tabula/config.yaml`)
//! - Environment variables
//! - Command-line flags
//!
//! The workspace is the directory holding the user's `.md`/`.txt` files. It
//! is settled first, since it locates the config file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Providers the LLM factory knows how to build.
pub const KNOWN_PROVIDERS: [&str; 2] = ["ollama", "scripted"];

/// Canonical form of a provider name.
pub fn normalize_provider(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Default preamble used when chat references are attached.
pub const DEFAULT_REFERENCE_TEMPLATE: &str =
    "Please refer to the contents of the following file.:\n\n{{references}}";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the workspace files
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Number of editor columns
    pub columns: usize,

    /// LLM provider ("ollama", "scripted")
    pub provider: String,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// Selected model alias (or raw identifier)
    pub model: String,

    /// Model alias -> provider model identifier
    pub models: BTreeMap<String, String>,

    /// Handlebars template for the chat reference preamble
    pub reference_template: String,

    /// Fill placeholders with file contents before sending a block
    pub substitute_placeholders: bool,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigFile {
    editor: Option<EditorSection>,
    llm: Option<LlmSection>,
    chat: Option<ChatSection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EditorSection {
    columns: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    provider: Option<String>,
    endpoint: Option<String>,
    model: Option<String>,
    #[serde(default)]
    models: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatSection {
    #[serde(rename = "referenceTemplate")]
    reference_template: Option<String>,
    #[serde(rename = "substitutePlaceholders")]
    substitute_placeholders: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert("gemma2".to_string(), "gemma2".to_string());

        Self {
            workspace: PathBuf::from("./workspace"),
            config_file: None,
            columns: 1,
            provider: "ollama".to_string(),
            endpoint: None,
            model: "gemma2".to_string(),
            models,
            reference_template: DEFAULT_REFERENCE_TEMPLATE.to_string(),
            substitute_placeholders: false,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration for `workspace` from the config file, environment
    /// variables and defaults.
    ///
    /// `workspace` is the directory given on the command line; without one,
    /// `TABULA_WORKSPACE` or the default is used. The config file is looked
    /// up under the resulting workspace.
    ///
    /// Environment variables:
    /// - `TABULA_WORKSPACE`: Workspace directory
    /// - `TABULA_CONFIG`: Path to config file
    /// - `TABULA_PROVIDER`: LLM provider
    /// - `TABULA_ENDPOINT`: Provider endpoint
    /// - `TABULA_MODEL`: Model alias or identifier
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load_from(workspace: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with_env(workspace, |key| std::env::var(key).ok())
    }

    fn load_with_env<F>(workspace: Option<PathBuf>, env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env("TABULA_WORKSPACE").map(PathBuf::from)) {
            config.workspace = workspace;
        }

        if let Some(config_file) = env("TABULA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Some(provider) = env("TABULA_PROVIDER") {
            config.provider = normalize_provider(&provider);
        }

        if let Some(endpoint) = env("TABULA_ENDPOINT") {
            config.endpoint = Some(endpoint);
        }

        if let Some(model) = env("TABULA_MODEL") {
            config.model = model;
        }

        if let Some(level) = env("RUST_LOG") {
            config.log_level = Some(level);
        }

        if env("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Path of the YAML config file for this configuration.
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.tabula_dir().join("config.yaml"))
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(editor) = config_file.editor {
            if let Some(columns) = editor.columns {
                result.columns = columns;
            }
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = normalize_provider(&provider);
            }
            if llm.endpoint.is_some() {
                result.endpoint = llm.endpoint;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if !llm.models.is_empty() {
                result.models = llm.models;
            }
        }

        if let Some(chat) = config_file.chat {
            if let Some(template) = chat.reference_template {
                result.reference_template = template;
            }
            if let Some(substitute) = chat.substitute_placeholders {
                result.substitute_placeholders = substitute;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        columns: Option<usize>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(columns) = columns {
            self.columns = columns;
        }

        if let Some(provider) = provider {
            self.provider = normalize_provider(&provider);
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .tabula directory.
    pub fn tabula_dir(&self) -> PathBuf {
        self.workspace.join(".tabula")
    }

    /// Provider model identifier for the selected model alias.
    pub fn resolve_model(&self) -> &str {
        self.model_for(&self.model)
    }

    /// Provider model identifier for `alias`.
    ///
    /// Values that are not a known alias are used as raw identifiers.
    pub fn model_for<'a>(&'a self, alias: &'a str) -> &'a str {
        self.models.get(alias).map(String::as_str).unwrap_or(alias)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !KNOWN_PROVIDERS.contains(&normalize_provider(&self.provider).as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if self.columns == 0 {
            return Err(AppError::Config(
                "At least one editor column is required".to_string(),
            ));
        }

        if !self.workspace.is_dir() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.workspace
            )));
        }

        Ok(())
    }
}
