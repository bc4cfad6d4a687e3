//! Rendering helpers: placeholder filling and the reference preamble.

use crate::parser::placeholder_pattern;
use handlebars::Handlebars;
use regex::Captures;
use std::collections::HashMap;
use tabula_core::{AppError, AppResult};

/// Separator between reference file contents.
pub const REFERENCE_SEPARATOR: &str = "\n\n-----\n\n";

/// Replace each placeholder that has a value in `assignment`.
///
/// Placeholders without a value are left exactly as written.
pub fn fill_placeholders(body: &str, assignment: &HashMap<String, String>) -> String {
    placeholder_pattern()
        .replace_all(body, |caps: &Captures| match assignment.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Render the context message that precedes a conversation with references.
///
/// The Handlebars `template` receives `references` (the contents joined by
/// [`REFERENCE_SEPARATOR`]) and `count`. No HTML escaping is applied.
pub fn render_reference_context(template: &str, contents: &[&str]) -> AppResult<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("references", template)
        .map_err(|e| AppError::Template(format!("Failed to register template: {}", e)))?;

    let data = serde_json::json!({
        "references": contents.join(REFERENCE_SEPARATOR),
        "count": contents.len(),
    });

    handlebars
        .render("references", &data)
        .map_err(|e| AppError::Template(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabula_core::config::DEFAULT_REFERENCE_TEMPLATE;

    #[test]
    fn test_fill_known_placeholders() {
        let mut assignment = HashMap::new();
        assignment.insert("intro".to_string(), "# Title\nHello".to_string());

        let filled = fill_placeholders("Read {{ intro }} then {{outro}}.", &assignment);
        assert_eq!(filled, "Read # Title\nHello then {{outro}}.");
    }

    #[test]
    fn test_fill_values_are_literal() {
        let mut assignment = HashMap::new();
        assignment.insert("a".to_string(), "$1 {{b}}".to_string());
        assignment.insert("b".to_string(), "never".to_string());

        assert_eq!(fill_placeholders("{{a}}", &assignment), "$1 {{b}}");
    }

    #[test]
    fn test_default_reference_context() {
        let rendered =
            render_reference_context(DEFAULT_REFERENCE_TEMPLATE, &["<b>one</b>", "two"]).unwrap();
        assert_eq!(
            rendered,
            "Please refer to the contents of the following file.:\n\n<b>one</b>\n\n-----\n\ntwo"
        );
    }

    #[test]
    fn test_custom_reference_template() {
        let rendered = render_reference_context("{{count}} files:\n{{references}}", &["x"]).unwrap();
        assert_eq!(rendered, "1 files:\nx");
    }

    #[test]
    fn test_invalid_reference_template() {
        let result = render_reference_context("{{#if}}", &["x"]);
        assert!(matches!(result, Err(AppError::Template(_))));
    }
}
