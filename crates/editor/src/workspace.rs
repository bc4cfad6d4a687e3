//! The editor workspace.
//!
//! The workspace owns every [`File`] and the column/tab layout. Tabs refer to
//! files by name, and every tab's file is always present in the collection.

use crate::file::{normalize_new_name, File};
use crate::store::{DirStore, FileStore};
use crate::tab::{Column, FileTab};
use std::collections::BTreeMap;
use std::path::Path;
use tabula_core::{AppError, AppResult};
use tabula_template::{resolve, Resolution};

pub struct Workspace {
    files: BTreeMap<String, File>,
    columns: Vec<Column>,
    store: Box<dyn FileStore>,
}

impl Workspace {
    /// Load every text file from `store` and lay out `columns` empty columns.
    pub fn load(store: impl FileStore + 'static, columns: usize) -> AppResult<Self> {
        let files = store
            .load_all()?
            .into_iter()
            .map(|(name, content)| {
                let file = File::loaded(name.clone(), &content);
                (name, file)
            })
            .collect::<BTreeMap<_, _>>();

        tracing::info!(
            files = files.len(),
            columns,
            "Workspace loaded"
        );

        Ok(Self {
            files,
            columns: (0..columns).map(|_| Column::new()).collect(),
            store: Box::new(store),
        })
    }

    /// Load the workspace stored in directory `path`.
    pub fn open_dir(path: impl AsRef<Path>, columns: usize) -> AppResult<Self> {
        Self::load(DirStore::new(path.as_ref()), columns)
    }

    /// Files in name order.
    pub fn files(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Names of files whose content has not been written to storage.
    pub fn unsaved_files(&self) -> Vec<String> {
        self.files
            .values()
            .filter(|f| f.is_dirty())
            .map(|f| f.name.clone())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn file(&self, name: &str) -> AppResult<&File> {
        self.files
            .get(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, column: usize) -> AppResult<&Column> {
        self.columns
            .get(column)
            .ok_or_else(|| AppError::column_out_of_range(column, self.columns.len()))
    }

    pub fn tab(&self, column: usize, tab: usize) -> AppResult<&FileTab> {
        let col = self.column(column)?;
        col.tabs
            .get(tab)
            .ok_or_else(|| AppError::tab_out_of_range(tab, col.tabs.len()))
    }

    /// `(name, content)` of every file, as seen right now.
    pub fn contents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .values()
            .map(|f| (f.name.as_str(), f.content.as_str()))
    }

    /// Write the in-memory content of `name` to storage, verbatim.
    pub fn save_file(&mut self, name: &str) -> AppResult<()> {
        let file = self
            .files
            .get_mut(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;

        self.store.write(&file.name, &file.content)?;
        file.mark_saved();

        tracing::info!(file = %name, "Saved file");
        Ok(())
    }

    /// Create an empty file and return its final name.
    ///
    /// `.md` is appended unless the name already ends in `.md` or `.txt`.
    /// Existing names are rejected with `DuplicateName`. The file lives in
    /// memory until it is saved.
    pub fn create_file(&mut self, name: &str) -> AppResult<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::Other("File name cannot be empty".to_string()));
        }
        if trimmed.contains(['/', '\\']) {
            return Err(AppError::Other(format!(
                "File name cannot contain a path separator: {}",
                trimmed
            )));
        }
        if trimmed.starts_with('.') || trimmed.ends_with('.') {
            return Err(AppError::Other(format!(
                "File name cannot start or end with '.': {}",
                trimmed
            )));
        }

        let name = normalize_new_name(trimmed);
        if self.files.contains_key(&name) {
            return Err(AppError::DuplicateName(name));
        }

        self.files.insert(name.clone(), File::created(name.clone()));
        tracing::info!(file = %name, "Created file");
        Ok(name)
    }

    /// Replace the content of `name`. Tabs on the file go stale until refreshed.
    ///
    /// Returns whether the content changed.
    pub fn update_file(&mut self, name: &str, content: impl Into<String>) -> AppResult<bool> {
        let file = self
            .files
            .get_mut(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;
        Ok(file.edit(content))
    }

    /// Re-parse the blocks of one tab.
    pub fn refresh_tab(&mut self, column: usize, tab: usize) -> AppResult<()> {
        let columns = self.columns.len();
        let col = self
            .columns
            .get_mut(column)
            .ok_or_else(|| AppError::column_out_of_range(column, columns))?;
        let tabs = col.tabs.len();
        let tab = col
            .tabs
            .get_mut(tab)
            .ok_or_else(|| AppError::tab_out_of_range(tab, tabs))?;

        let file = self
            .files
            .get(tab.file_name())
            .ok_or_else(|| AppError::NotFound(tab.file_name().to_string()))?;
        tab.refresh(file);
        Ok(())
    }

    /// Commit the text edited in a tab.
    ///
    /// When the text differs from the file, the file is updated, saved, and
    /// the editing tab re-parsed. Other tabs on the file keep their blocks
    /// until refreshed. Returns whether anything changed.
    pub fn commit_edit(
        &mut self,
        column: usize,
        tab: usize,
        content: impl Into<String>,
    ) -> AppResult<bool> {
        let name = self.tab(column, tab)?.file_name().to_string();

        if !self.update_file(&name, content)? {
            tracing::debug!(file = %name, "Edit commit without changes");
            return Ok(false);
        }

        self.save_file(&name)?;
        self.refresh_tab(column, tab)?;
        Ok(true)
    }

    /// Bind placeholder names to the current file contents.
    pub fn assign_params(&self, parameter_names: &[String]) -> Resolution {
        resolve(parameter_names, self.contents())
    }

    /// Names of files no tab shows, in name order.
    pub fn not_opened_files(&self) -> Vec<String> {
        self.files
            .keys()
            .filter(|name| !self.columns.iter().any(|c| c.shows(name)))
            .cloned()
            .collect()
    }

    /// Open `name` as a new tab at the end of `column`.
    ///
    /// Opening a file that is already open elsewhere adds another tab on the
    /// same file. Returns the index of the new tab.
    pub fn open_file(&mut self, column: usize, name: &str) -> AppResult<usize> {
        let columns = self.columns.len();
        let col = self
            .columns
            .get_mut(column)
            .ok_or_else(|| AppError::column_out_of_range(column, columns))?;
        let file = self
            .files
            .get(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;

        col.tabs.push(FileTab::new(file));
        tracing::debug!(file = %name, column, "Opened tab");
        Ok(col.tabs.len() - 1)
    }

    /// Close a tab. The file stays in the workspace.
    pub fn close_tab(&mut self, column: usize, tab: usize) -> AppResult<FileTab> {
        let columns = self.columns.len();
        let col = self
            .columns
            .get_mut(column)
            .ok_or_else(|| AppError::column_out_of_range(column, columns))?;
        if tab >= col.tabs.len() {
            return Err(AppError::tab_out_of_range(tab, col.tabs.len()));
        }
        Ok(col.tabs.remove(tab))
    }

    /// Drop `name` from the workspace, closing every tab on it.
    ///
    /// Storage is left untouched.
    pub fn remove_file(&mut self, name: &str) -> AppResult<File> {
        let file = self
            .files
            .remove(name)
            .ok_or_else(|| AppError::NotFound(name.to_string()))?;

        for column in &mut self.columns {
            column.tabs.retain(|t| t.file_name() != name);
        }

        tracing::info!(file = %name, "Removed file from workspace");
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::FileState;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    const STEPS: &str = "# Steps\n\n## 1. Summarize\nSummarize this:\n{{intro}}\n\n## 2. Expand\nAdd detail.\n";

    fn scenario() -> Workspace {
        let store = MemoryStore::with_files([("intro.md", "# Title\nHello\n"), ("steps.md", STEPS)]);
        Workspace::load(store, 2).unwrap()
    }

    #[test]
    fn test_load_trims_and_sorts() {
        let store = MemoryStore::with_files([("b.md", "  b  "), ("a.txt", "\na\n"), ("c.yaml", "x")]);
        let workspace = Workspace::load(store, 1).unwrap();

        assert_eq!(workspace.file_names(), vec!["a.txt", "b.md"]);
        assert_eq!(workspace.file("a.txt").unwrap().content, "a");
        assert_eq!(workspace.file("b.md").unwrap().state, FileState::Loaded);
        assert_eq!(workspace.columns().len(), 1);
        assert!(workspace.columns()[0].tabs.is_empty());
    }

    #[test]
    fn test_open_and_resolve_scenario() {
        let mut workspace = scenario();
        let tab = workspace.open_file(0, "steps.md").unwrap();

        let blocks = workspace.tab(0, tab).unwrap().blocks().to_vec();
        assert_eq!(blocks.len(), 3);

        let block = blocks
            .iter()
            .find(|b| b.header == "## 1. Summarize")
            .unwrap();
        let resolution = workspace.assign_params(&block.parameter_names);

        assert_eq!(resolution.assignment.len(), 1);
        assert_eq!(resolution.assignment["intro"], "# Title\nHello");
        assert!(resolution.unresolved.is_empty());
    }

    #[test]
    fn test_open_errors() {
        let mut workspace = scenario();

        assert!(matches!(
            workspace.open_file(2, "steps.md"),
            Err(AppError::IndexOutOfRange { index: 2, len: 2, .. })
        ));
        assert!(matches!(
            workspace.open_file(0, "nope.md"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_same_file_in_two_columns() {
        let mut workspace = scenario();
        workspace.open_file(0, "intro.md").unwrap();
        workspace.open_file(1, "intro.md").unwrap();

        assert_eq!(workspace.columns()[0].tabs.len(), 1);
        assert_eq!(workspace.columns()[1].tabs.len(), 1);
        assert_eq!(workspace.not_opened_files(), vec!["steps.md"]);
    }

    #[test]
    fn test_not_opened_files_independent_of_column() {
        let mut left = scenario();
        left.open_file(0, "steps.md").unwrap();

        let mut right = scenario();
        right.open_file(1, "steps.md").unwrap();

        assert_eq!(left.not_opened_files(), vec!["intro.md"]);
        assert_eq!(left.not_opened_files(), right.not_opened_files());

        left.close_tab(0, 0).unwrap();
        assert_eq!(left.not_opened_files(), vec!["intro.md", "steps.md"]);
        assert!(left.contains("steps.md"));
    }

    #[test]
    fn test_create_file() {
        let mut workspace = scenario();

        assert_eq!(workspace.create_file("draft").unwrap(), "draft.md");
        assert_eq!(workspace.create_file("log.txt").unwrap(), "log.txt");
        assert_eq!(
            workspace.file("draft.md").unwrap().state,
            FileState::Created
        );

        assert!(matches!(
            workspace.create_file("intro"),
            Err(AppError::DuplicateName(name)) if name == "intro.md"
        ));
        assert!(workspace.create_file("  ").is_err());
        assert!(workspace.create_file("../escape").is_err());
    }

    #[test]
    fn test_unsaved_files() {
        let mut workspace = scenario();
        assert!(workspace.unsaved_files().is_empty());

        let draft = workspace.create_file("draft").unwrap();
        workspace.update_file("intro.md", "changed").unwrap();
        assert_eq!(workspace.unsaved_files(), vec!["draft.md", "intro.md"]);

        workspace.save_file("intro.md").unwrap();
        assert_eq!(workspace.unsaved_files(), vec![draft]);
    }

    #[test]
    fn test_create_file_rejects_names_without_stem() {
        let mut workspace = scenario();
        let before = workspace.file_names();

        for name in [".md", ".txt", "notes.", ".", "..", " .md "] {
            assert!(
                matches!(workspace.create_file(name), Err(AppError::Other(_))),
                "{name:?} should be rejected"
            );
        }
        assert_eq!(workspace.file_names(), before);
        assert_eq!(workspace.create_file("v1.2").unwrap(), "v1.2.md");
    }

    #[test]
    fn test_save_unknown_file() {
        let mut workspace = scenario();
        assert!(matches!(
            workspace.save_file("ghost.md"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("note.md"), "old text").unwrap();

        let mut workspace = Workspace::open_dir(temp_dir.path(), 1).unwrap();
        workspace.update_file("note.md", "new text").unwrap();
        assert_eq!(workspace.file("note.md").unwrap().state, FileState::Edited);

        workspace.save_file("note.md").unwrap();
        assert_eq!(workspace.file("note.md").unwrap().state, FileState::Saved);
        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("note.md")).unwrap(),
            "new text"
        );

        let reloaded = Workspace::open_dir(temp_dir.path(), 1).unwrap();
        assert_eq!(reloaded.file("note.md").unwrap().content, "new text");
    }

    #[test]
    fn test_save_writes_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let mut workspace = Workspace::open_dir(temp_dir.path(), 1).unwrap();

        let name = workspace.create_file("spaced").unwrap();
        workspace.update_file(&name, "\n  padded  \n").unwrap();
        workspace.save_file(&name).unwrap();

        assert_eq!(
            std::fs::read_to_string(temp_dir.path().join("spaced.md")).unwrap(),
            "\n  padded  \n"
        );
    }

    #[test]
    fn test_edits_visible_to_all_tabs_but_blocks_stale() {
        let mut workspace = scenario();
        workspace.open_file(0, "intro.md").unwrap();
        workspace.open_file(1, "intro.md").unwrap();

        assert!(workspace
            .commit_edit(0, 0, "# Title\nHello\n## 1. More\nextra")
            .unwrap());

        assert_eq!(workspace.tab(0, 0).unwrap().blocks().len(), 2);
        assert_eq!(workspace.tab(1, 0).unwrap().blocks().len(), 1);

        workspace.refresh_tab(1, 0).unwrap();
        assert_eq!(workspace.tab(1, 0).unwrap().blocks().len(), 2);
        assert_eq!(workspace.file("intro.md").unwrap().state, FileState::Saved);
    }

    #[test]
    fn test_commit_without_change() {
        let mut workspace = scenario();
        workspace.open_file(0, "intro.md").unwrap();

        assert!(!workspace.commit_edit(0, 0, "# Title\nHello").unwrap());
        assert_eq!(workspace.file("intro.md").unwrap().state, FileState::Loaded);
        assert!(workspace.commit_edit(0, 3, "x").is_err());
    }

    #[test]
    fn test_remove_file_closes_tabs() {
        let mut workspace = scenario();
        workspace.open_file(0, "intro.md").unwrap();
        workspace.open_file(0, "steps.md").unwrap();
        workspace.open_file(1, "intro.md").unwrap();

        let removed = workspace.remove_file("intro.md").unwrap();
        assert_eq!(removed.name, "intro.md");
        assert!(!workspace.contains("intro.md"));
        assert_eq!(workspace.columns()[0].tabs.len(), 1);
        assert!(workspace.columns()[1].tabs.is_empty());

        let resolution = workspace.assign_params(&["intro".to_string()]);
        assert_eq!(resolution.unresolved, vec!["intro"]);
    }
}
