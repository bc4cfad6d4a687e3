//! Template types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed section of a file: a header line and the body below it.
///
/// Blocks are derived views over a content snapshot and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// First line of the section, trimmed
    pub header: String,

    /// Remaining lines joined by newlines, trimmed
    pub body: String,

    /// Placeholder names in order of appearance, duplicates retained
    #[serde(rename = "parameterNames")]
    pub parameter_names: Vec<String>,
}

impl Block {
    /// Whether the body contains any placeholder.
    pub fn has_parameters(&self) -> bool {
        !self.parameter_names.is_empty()
    }
}

/// Outcome of resolving placeholder names against workspace files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Placeholder name -> fill value
    pub assignment: HashMap<String, String>,

    /// Names with no matching file, in request order, duplicates retained
    pub unresolved: Vec<String>,
}

impl Resolution {
    /// A block is ready to send once nothing is left unresolved.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Fill an unresolved name with a value supplied by the user.
    ///
    /// Every occurrence of `name` leaves `unresolved`. Returns false when the
    /// name was not pending.
    pub fn supply(&mut self, name: &str, value: impl Into<String>) -> bool {
        let before = self.unresolved.len();
        self.unresolved.retain(|pending| pending != name);
        if self.unresolved.len() == before {
            return false;
        }
        self.assignment.insert(name.to_string(), value.into());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supply_clears_every_occurrence() {
        let mut resolution = Resolution {
            assignment: HashMap::new(),
            unresolved: vec!["topic".to_string(), "tone".to_string(), "topic".to_string()],
        };

        assert!(resolution.supply("topic", "Rust lifetimes"));
        assert_eq!(resolution.unresolved, vec!["tone"]);
        assert_eq!(resolution.assignment["topic"], "Rust lifetimes");
        assert!(!resolution.is_complete());

        assert!(!resolution.supply("topic", "again"));
        assert!(resolution.supply("tone", "casual"));
        assert!(resolution.is_complete());
    }
}
