//! Workspace files.

use serde::{Deserialize, Serialize};

/// Extensions the workspace loads and creates.
pub const TEXT_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Extension appended to new file names that carry none of [`TEXT_EXTENSIONS`].
pub const DEFAULT_EXTENSION: &str = "md";

/// Lifecycle of a file's content.
///
/// `Loaded`/`Created` → `Edited` (any content change) → `Saved` (explicit save).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Loaded,
    Created,
    Edited,
    Saved,
}

/// A named unit of text, owned by the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub name: String,
    pub content: String,
    pub state: FileState,
}

impl File {
    /// A file read from storage. Content is trimmed.
    pub fn loaded(name: impl Into<String>, content: &str) -> Self {
        Self {
            name: name.into(),
            content: content.trim().to_string(),
            state: FileState::Loaded,
        }
    }

    /// A new, empty file.
    pub fn created(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            state: FileState::Created,
        }
    }

    /// Replace the content. Returns false if it was already identical.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if content == self.content {
            return false;
        }
        self.content = content;
        self.state = FileState::Edited;
        true
    }

    pub fn mark_saved(&mut self) {
        self.state = FileState::Saved;
    }

    /// Whether in-memory content may differ from storage.
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, FileState::Created | FileState::Edited)
    }
}

/// Whether `name` ends with one of the recognized text extensions.
pub fn has_text_extension(name: &str) -> bool {
    std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext))
}

/// Normalize a user-supplied name for a new file.
///
/// Names already ending in `.md` or `.txt` are kept; anything else gets
/// `.md` appended.
pub fn normalize_new_name(name: &str) -> String {
    let name = name.trim();
    if has_text_extension(name) {
        name.to_string()
    } else {
        format!("{}.{}", name, DEFAULT_EXTENSION)
    }
}
