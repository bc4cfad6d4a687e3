//! Parameter resolver.
//!
//! Placeholders are bound to workspace files by stem: `{{intro}}` takes the
//! content of `intro.md` (or `intro.txt`).

use crate::types::Resolution;
use std::collections::HashMap;
use std::path::Path;

/// File name without its last extension.
pub fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

/// Resolve `parameter_names` against `(file name, content)` pairs.
///
/// Each occurrence is handled on its own: a duplicated unresolvable name
/// appears twice in `unresolved`. When two files share a stem, the later pair
/// wins. Pure; never fails.
///
/// # Example
/// ```
/// use tabula_template::resolve;
///
/// let files = [("a.md", "X"), ("c.md", "Y")];
/// let names = vec!["a".to_string(), "b".to_string()];
/// let resolution = resolve(&names, files);
///
/// assert_eq!(resolution.assignment["a"], "X");
/// assert_eq!(resolution.unresolved, vec!["b"]);
/// ```
pub fn resolve<'a, I>(parameter_names: &[String], files: I) -> Resolution
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let contents: HashMap<&str, &str> = files
        .into_iter()
        .map(|(name, content)| (file_stem(name), content))
        .collect();

    let mut resolution = Resolution::default();
    for name in parameter_names {
        match contents.get(name.as_str()) {
            Some(content) => {
                resolution
                    .assignment
                    .insert(name.clone(), (*content).to_string());
            }
            None => resolution.unresolved.push(name.clone()),
        }
    }

    tracing::debug!(
        requested = parameter_names.len(),
        unresolved = resolution.unresolved.len(),
        "Resolved template parameters"
    );
    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_by_stem() {
        let files = [("a.md", "X"), ("c.md", "Y")];
        let resolution = resolve(&names(&["a", "b"]), files);

        assert_eq!(resolution.assignment.len(), 1);
        assert_eq!(resolution.assignment["a"], "X");
        assert_eq!(resolution.unresolved, vec!["b"]);
        assert!(!resolution.is_complete());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let files = [("intro.txt", "hello")];
        let resolution = resolve(&names(&["missing", "intro", "missing", "intro"]), files);

        assert_eq!(resolution.unresolved, vec!["missing", "missing"]);
        assert_eq!(resolution.assignment["intro"], "hello");
    }

    #[test]
    fn test_empty_request_is_complete() {
        let resolution = resolve(&[], [("a.md", "X")]);
        assert!(resolution.is_complete());
        assert!(resolution.assignment.is_empty());
    }

    #[test]
    fn test_only_last_extension_stripped() {
        let files = [("notes.draft.md", "draft")];
        let resolution = resolve(&names(&["notes", "notes.draft"]), files);

        assert_eq!(resolution.unresolved, vec!["notes"]);
        assert_eq!(resolution.assignment["notes.draft"], "draft");
    }

    #[test]
    fn test_later_file_wins_stem_collision() {
        let files = [("a.md", "markdown"), ("a.txt", "text")];
        let resolution = resolve(&names(&["a"]), files);
        assert_eq!(resolution.assignment["a"], "text");
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("intro.md"), "intro");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("README"), "README");
    }
}
