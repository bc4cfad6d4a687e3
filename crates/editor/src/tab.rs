//! Open tabs and the columns that hold them.

use crate::file::File;
use serde::Serialize;
use tabula_template::{parse_blocks, Block};

/// One open editing slot bound to a workspace file.
///
/// The tab holds the file's name, never a copy, so edits made through any tab
/// are visible to every tab on the same file. `blocks` reflect the content as
/// of the last [`FileTab::refresh`].
#[derive(Debug, Clone, Serialize)]
pub struct FileTab {
    file_name: String,
    blocks: Vec<Block>,
}

impl FileTab {
    /// Open a tab on `file`, parsing its blocks immediately.
    pub fn new(file: &File) -> Self {
        let mut tab = Self {
            file_name: file.name.clone(),
            blocks: Vec::new(),
        };
        tab.refresh(file);
        tab
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Re-parse the blocks from the file's current content.
    pub fn refresh(&mut self, file: &File) {
        debug_assert_eq!(file.name, self.file_name);
        self.blocks = parse_blocks(&file.content);
        tracing::debug!(
            file = %self.file_name,
            blocks = self.blocks.len(),
            "Refreshed tab blocks"
        );
    }

    /// Find a block by position or, failing that, by exact header.
    pub fn find_block(&self, selector: &str) -> Option<&Block> {
        if let Ok(index) = selector.parse::<usize>() {
            if let Some(block) = self.blocks.get(index) {
                return Some(block);
            }
        }
        self.blocks.iter().find(|b| b.header == selector.trim())
    }
}

/// A display pane: tabs in left-to-right order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Column {
    pub tabs: Vec<FileTab>,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any tab in this column shows `file_name`.
    pub fn shows(&self, file_name: &str) -> bool {
        self.tabs.iter().any(|t| t.file_name == file_name)
    }
}
