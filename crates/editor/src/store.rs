//! File storage.
//!
//! The workspace treats storage as a flat key-value facility: file name in,
//! text out. [`DirStore`] backs it with a directory; [`MemoryStore`] keeps
//! everything in memory.

use crate::file::has_text_extension;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tabula_core::{AppError, AppResult};

/// Key-value storage for workspace files.
pub trait FileStore: Send + Sync {
    /// Every stored text file as `(name, raw content)`, sorted by name.
    fn load_all(&self) -> AppResult<Vec<(String, String)>>;

    /// Overwrite `name` with `content`, verbatim.
    fn write(&self, name: &str, content: &str) -> AppResult<()>;
}

/// Files at the top level of a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileStore for DirStore {
    fn load_all(&self) -> AppResult<Vec<(String, String)>> {
        if !self.root.is_dir() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                self.root
            )));
        }

        let mut files = Vec::new();

        for entry in walkdir::WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", entry.path());
                continue;
            };
            if !has_text_extension(name) {
                continue;
            }

            let content = std::fs::read_to_string(entry.path())?;
            files.push((name.to_string(), content));
        }

        tracing::debug!("Loaded {} files from {:?}", files.len(), self.root);
        Ok(files)
    }

    fn write(&self, name: &str, content: &str) -> AppResult<()> {
        let path = self.root.join(name);
        std::fs::write(&path, content)?;
        tracing::debug!("Wrote {} bytes to {:?}", content.len(), path);
        Ok(())
    }
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with files.
    pub fn with_files<I, N, C>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: Into<String>,
        C: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            files: Mutex::new(files),
        }
    }

    /// Raw stored content of `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.files.lock().ok()?.get(name).cloned()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.files
            .lock()
            .map_err(|_| AppError::Other("Memory store lock poisoned".to_string()))
    }
}

impl FileStore for MemoryStore {
    fn load_all(&self) -> AppResult<Vec<(String, String)>> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(name, _)| has_text_extension(name))
            .map(|(name, content)| (name.clone(), content.clone()))
            .collect())
    }

    fn write(&self, name: &str, content: &str) -> AppResult<()> {
        self.lock()?.insert(name.to_string(), content.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_dir_store_loads_sorted_text_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.txt"), "bee").unwrap();
        fs::write(temp_dir.path().join("a.md"), "  ay  \n").unwrap();
        fs::write(temp_dir.path().join("image.png"), "binary").unwrap();
        fs::create_dir(temp_dir.path().join("nested.md")).unwrap();
        fs::write(temp_dir.path().join("nested.md").join("deep.md"), "x").unwrap();

        let files = DirStore::new(temp_dir.path()).load_all().unwrap();
        assert_eq!(
            files,
            vec![
                ("a.md".to_string(), "  ay  \n".to_string()),
                ("b.txt".to_string(), "bee".to_string()),
            ]
        );
    }

    #[test]
    fn test_dir_store_write_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path());

        store.write("a.md", "first version, long").unwrap();
        store.write("a.md", "second").unwrap();

        assert_eq!(
            fs::read_to_string(temp_dir.path().join("a.md")).unwrap(),
            "second"
        );
    }

    #[test]
    fn test_dir_store_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = DirStore::new(temp_dir.path().join("missing"));
        assert!(matches!(store.load_all(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_memory_store_filters_extensions() {
        let store = MemoryStore::with_files([("z.md", "z"), ("a.txt", "a"), ("x.json", "{}")]);
        let names: Vec<String> = store.load_all().unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a.txt", "z.md"]);
    }
}
